// HTTP client for the loan application backend
pub mod client;
pub mod wire;

// Re-export common types
pub use client::{ApiError, LoanAppClient, Result, DEFAULT_API_BASE};
pub use wire::{ApplicationRecord, ApplicationsResponse, HealthResponse, PollResponse, TriggerResponse};
