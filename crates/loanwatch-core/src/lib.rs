// Core business logic lives here - the sync pipeline and everything it derives
pub mod backend;
pub mod classify;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod session;
pub mod store;
pub mod sync;

pub use backend::HttpBackend;
pub use classify::{classify, Classification, RiskLevel};
pub use config::Config;
pub use error::Error;
pub use models::{ApplicationStatus, LoanApplication, StatusCounts, StatusFilter};
pub use session::Session;
pub use store::{ApplicationSource, ApplicationStore, ViewState};
pub use sync::{ChangeFeed, PollSignal, RefreshTrigger, SyncHandle, SyncLoop, SyncState};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
