// Shared fixtures for the TUI tests
use std::sync::Arc;
use std::time::Duration;

use loanwatch_core::config::SyncConfig;
use loanwatch_core::{
    ApplicationSource, ApplicationStatus, ChangeFeed, LoanApplication, PollSignal, Result, Session,
};

use crate::App;

pub struct FixedSource {
    applications: Vec<LoanApplication>,
}

#[async_trait::async_trait]
impl ApplicationSource for FixedSource {
    async fn fetch_applications(&self) -> Result<Vec<LoanApplication>> {
        Ok(self.applications.clone())
    }
}

/// Feed that never reports anything; sync is disabled in these tests anyway
pub struct SilentFeed;

#[async_trait::async_trait]
impl ChangeFeed for SilentFeed {
    async fn poll(&self) -> Result<PollSignal> {
        std::future::pending().await
    }
}

pub fn application(id: u64, status: &str, risk_factor: f64) -> LoanApplication {
    LoanApplication {
        id,
        applicant_name: format!("Applicant {}", id),
        credit_score: 640 + id as i32,
        amount_requested: 12500.0,
        risk_factor,
        status: ApplicationStatus::from(status),
        created_at: "2024-03-05T10:15:00Z".parse().unwrap(),
    }
}

pub fn session_with(statuses: &[&str]) -> Session {
    let applications = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| application(i as u64 + 1, status, 0.45))
        .collect();
    session_from(applications)
}

pub fn session_from(applications: Vec<LoanApplication>) -> Session {
    let config = SyncConfig {
        enabled: false,
        ..SyncConfig::default()
    };
    Session::start(
        Arc::new(FixedSource { applications }),
        Arc::new(SilentFeed),
        &config,
    )
}

pub async fn wait_until_loaded(app: &mut App) {
    for _ in 0..200 {
        app.tick();
        if !app.session.store().is_loading() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("session never finished loading");
}
