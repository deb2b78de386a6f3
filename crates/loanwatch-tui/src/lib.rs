// Terminal UI implementation using ratatui
// The reviewer's window onto the sync pipeline

pub mod app;
pub mod runner;
pub mod ui;

#[cfg(test)]
mod testing;

pub use app::App;
pub use runner::run_tui;
