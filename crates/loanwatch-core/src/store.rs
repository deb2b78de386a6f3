// Application store - the single source of truth for what the backend said
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::models::{LoanApplication, StatusCounts, StatusFilter};
use crate::Result;

/// Where snapshots come from
///
/// Implemented by the HTTP backend adapter; tests plug in mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ApplicationSource: Send + Sync {
    /// Fetch the complete, ordered application list
    async fn fetch_applications(&self) -> Result<Vec<LoanApplication>>;
}

/// Everything the view renders
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub applications: Vec<LoanApplication>,
    pub loading: bool,
    pub error: Option<String>,
    pub filter: StatusFilter,
}

impl Default for ViewState {
    /// State at mount: nothing loaded yet, loading, unfiltered
    fn default() -> Self {
        Self {
            applications: Vec::new(),
            loading: true,
            error: None,
            filter: StatusFilter::All,
        }
    }
}

/// Owns the ViewState and the transitions allowed on it
pub struct ApplicationStore {
    state: ViewState,
    source: Arc<dyn ApplicationSource>,
}

impl ApplicationStore {
    pub fn new(source: Arc<dyn ApplicationSource>) -> Self {
        Self {
            state: ViewState::default(),
            source,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn applications(&self) -> &[LoanApplication] {
        &self.state.applications
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub fn filter(&self) -> StatusFilter {
        self.state.filter
    }

    /// Handle to the source, for running fetches off the store
    pub fn source(&self) -> Arc<dyn ApplicationSource> {
        Arc::clone(&self.source)
    }

    /// Fetch the full list and apply the outcome
    pub async fn refresh(&mut self) {
        let outcome = self.source.fetch_applications().await;
        self.apply_fetch(outcome);
    }

    /// Apply one fetch outcome - exactly one ViewState transition
    ///
    /// Success replaces the snapshot wholesale and clears the error.
    /// Failure keeps the last-known snapshot and records the message.
    /// Either way loading is over.
    pub fn apply_fetch(&mut self, outcome: Result<Vec<LoanApplication>>) {
        match outcome {
            Ok(applications) => {
                info!("Loaded {} applications", applications.len());
                self.state.applications = applications;
                self.state.error = None;
            }
            Err(e) => {
                warn!("Failed to refresh applications: {}", e);
                let message = e.to_string();
                self.state.error = Some(if message.is_empty() {
                    "Failed to fetch applications".to_string()
                } else {
                    message
                });
            }
        }
        self.state.loading = false;
    }

    pub fn set_filter(&mut self, filter: StatusFilter) {
        debug!("Filter set to {}", filter);
        self.state.filter = filter;
    }

    /// Set the filter from its wire name; anything outside the closed set is rejected
    pub fn set_filter_str(&mut self, raw: &str) -> Result<()> {
        let filter = raw.parse()?;
        self.set_filter(filter);
        Ok(())
    }

    /// Applications matching the current filter, in backend order
    pub fn filtered_view(&self) -> Vec<&LoanApplication> {
        let filter = self.state.filter;
        self.state
            .applications
            .iter()
            .filter(|app| filter.matches(&app.status))
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        StatusCounts::from_applications(&self.state.applications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApplicationStatus;
    use crate::Error;

    fn app(id: u64, status: &str) -> LoanApplication {
        LoanApplication {
            id,
            applicant_name: format!("Applicant {}", id),
            credit_score: 650 + id as i32,
            amount_requested: 1000.0 * id as f64,
            risk_factor: 0.1 * id as f64,
            status: ApplicationStatus::from(status),
            created_at: "2024-03-05T10:15:00Z".parse().unwrap(),
        }
    }

    fn three_apps() -> Vec<LoanApplication> {
        vec![app(1, "approved"), app(2, "review_required"), app(3, "rejected")]
    }

    fn store_returning(apps: Vec<LoanApplication>) -> ApplicationStore {
        let mut source = MockApplicationSource::new();
        source
            .expect_fetch_applications()
            .returning(move || Ok(apps.clone()));
        ApplicationStore::new(Arc::new(source))
    }

    fn failing_store() -> ApplicationStore {
        let mut source = MockApplicationSource::new();
        source
            .expect_fetch_applications()
            .returning(|| Err(Error::Fetch("status 500".to_string())));
        ApplicationStore::new(Arc::new(source))
    }

    #[test]
    fn test_initial_state() {
        let store = store_returning(Vec::new());
        let state = store.state();
        assert!(state.loading);
        assert!(state.error.is_none());
        assert!(state.applications.is_empty());
        assert_eq!(state.filter, StatusFilter::All);
    }

    #[tokio::test]
    async fn test_successful_refresh_replaces_snapshot() {
        let mut store = store_returning(three_apps());
        store.refresh().await;

        assert!(!store.is_loading());
        assert!(store.error().is_none());
        assert_eq!(store.applications(), three_apps().as_slice());
    }

    #[tokio::test]
    async fn test_successful_refresh_clears_previous_error() {
        let mut store = store_returning(three_apps());
        store.apply_fetch(Err(Error::Fetch("connection refused".to_string())));
        assert!(store.error().is_some());

        store.refresh().await;
        assert!(store.error().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_snapshot() {
        let mut store = failing_store();
        store.apply_fetch(Ok(three_apps()));

        store.refresh().await;

        assert_eq!(store.applications(), three_apps().as_slice());
        assert!(!store.is_loading());
        let message = store.error().unwrap();
        assert!(!message.is_empty());
        assert!(message.contains("status 500"));
    }

    #[tokio::test]
    async fn test_failed_first_refresh_ends_loading() {
        let mut store = failing_store();
        store.refresh().await;

        assert!(!store.is_loading());
        assert!(store.applications().is_empty());
        assert!(store.error().is_some());
    }

    #[test]
    fn test_snapshot_is_replaced_not_merged() {
        let mut store = store_returning(Vec::new());
        store.apply_fetch(Ok(three_apps()));
        store.apply_fetch(Ok(vec![app(9, "approved")]));

        let ids: Vec<u64> = store.applications().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![9]);
    }

    #[test]
    fn test_last_applied_outcome_wins() {
        let mut store = store_returning(Vec::new());
        store.apply_fetch(Ok(vec![app(1, "approved")]));
        store.apply_fetch(Ok(vec![app(2, "rejected"), app(3, "approved")]));

        assert_eq!(store.applications().len(), 2);
        assert_eq!(store.applications()[0].id, 2);
    }

    #[test]
    fn test_filtered_view_all_is_unchanged() {
        let mut store = store_returning(Vec::new());
        store.apply_fetch(Ok(three_apps()));

        let view: Vec<LoanApplication> = store.filtered_view().into_iter().cloned().collect();
        assert_eq!(view, three_apps());
    }

    #[test]
    fn test_filtered_view_keeps_relative_order() {
        let mut store = store_returning(Vec::new());
        store.apply_fetch(Ok(vec![
            app(5, "approved"),
            app(4, "rejected"),
            app(3, "approved"),
            app(2, "review_required"),
            app(1, "approved"),
        ]));

        store.set_filter(StatusFilter::Approved);
        let ids: Vec<u64> = store.filtered_view().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn test_three_statuses_end_to_end() {
        let mut store = store_returning(three_apps());
        store.refresh().await;

        store.set_filter(StatusFilter::ReviewRequired);
        let rows = store.filtered_view();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, ApplicationStatus::ReviewRequired);

        store.set_filter(StatusFilter::All);
        let ids: Vec<u64> = store.filtered_view().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_invalid_filter_is_rejected_and_ignored() {
        let mut store = store_returning(Vec::new());
        store.set_filter(StatusFilter::Rejected);

        assert!(store.set_filter_str("pending").is_err());
        assert_eq!(store.filter(), StatusFilter::Rejected);

        store.set_filter_str("approved").unwrap();
        assert_eq!(store.filter(), StatusFilter::Approved);
    }

    #[test]
    fn test_set_filter_does_not_fetch() {
        let mut source = MockApplicationSource::new();
        source.expect_fetch_applications().never();
        let mut store = ApplicationStore::new(Arc::new(source));

        store.set_filter(StatusFilter::Approved);
        let _ = store.filtered_view();
        assert_eq!(store.filter(), StatusFilter::Approved);
    }
}
