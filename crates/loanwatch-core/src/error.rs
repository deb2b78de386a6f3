use thiserror::Error;

/// All the ways things can go wrong in LoanWatch
///
/// None of these are fatal. Fetch failures end up on screen with a retry
/// action, poll failures only ever reach the log.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch applications: {0}")]
    Fetch(String),

    #[error("Long polling failed: {0}")]
    Poll(String),

    #[error("Unknown filter '{0}' (expected all, approved, review_required or rejected)")]
    InvalidFilter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
