//! A mounted dashboard: the store, its fetches and the sync loop wired together.
//!
//! The store stays single-owner. Fetches run as their own tasks and report
//! back over a channel, so a poll-triggered refresh and a manual retry can
//! overlap; whichever finishes last is what the reviewer sees.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::config::SyncConfig;
use crate::models::LoanApplication;
use crate::store::{ApplicationSource, ApplicationStore};
use crate::sync::{ChangeFeed, RefreshRequest, SyncHandle, SyncLoop, SyncState};
use crate::Result;

type FetchOutcome = Result<Vec<LoanApplication>>;

pub struct Session {
    store: ApplicationStore,
    refresh_tx: mpsc::UnboundedSender<RefreshRequest>,
    refresh_rx: mpsc::UnboundedReceiver<RefreshRequest>,
    outcome_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    sync: Option<SyncHandle>,
    stopped: bool,
    in_flight: usize,
}

impl Session {
    /// Mount: kick off the initial load and, if enabled, the sync loop
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        source: Arc<dyn ApplicationSource>,
        feed: Arc<dyn ChangeFeed>,
        config: &SyncConfig,
    ) -> Self {
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let sync = if config.enabled {
            Some(
                SyncLoop::new(feed, refresh_tx.clone())
                    .with_cooldown(config.cooldown())
                    .spawn(),
            )
        } else {
            debug!("Sync loop disabled, showing a static snapshot");
            None
        };

        let mut session = Self {
            store: ApplicationStore::new(source),
            refresh_tx,
            refresh_rx,
            outcome_tx,
            outcome_rx,
            sync,
            stopped: false,
            in_flight: 0,
        };
        session.spawn_fetch();
        session
    }

    pub fn store(&self) -> &ApplicationStore {
        &self.store
    }

    /// Mutable access for view-driven transitions like filter selection
    pub fn store_mut(&mut self) -> &mut ApplicationStore {
        &mut self.store
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync
            .as_ref()
            .map(|sync| sync.state())
            .unwrap_or(SyncState::Stopped)
    }

    pub fn sync_updates(&self) -> Option<watch::Receiver<SyncState>> {
        self.sync.as_ref().map(|sync| sync.subscribe())
    }

    /// Fetches started but not yet applied
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Manual refresh, e.g. the retry action on the error screen
    pub fn retry(&mut self) {
        self.spawn_fetch();
    }

    /// Stop syncing; pending and future refresh triggers are dropped
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Some(sync) = &self.sync {
            sync.stop();
        }
        debug!("Session stopped");
    }

    fn spawn_fetch(&mut self) {
        if self.stopped {
            return;
        }

        let source = self.store.source();
        let outcome_tx = self.outcome_tx.clone();
        self.in_flight += 1;

        tokio::spawn(async move {
            let outcome = source.fetch_applications().await;
            // Session dropped while we were fetching; nothing left to update
            let _ = outcome_tx.send(outcome);
        });
    }

    fn on_refresh_request(&mut self) {
        if self.stopped {
            debug!("Ignoring refresh signal after stop");
            return;
        }
        self.spawn_fetch();
    }

    fn on_outcome(&mut self, outcome: FetchOutcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.store.apply_fetch(outcome);
    }

    /// Non-blocking: start fetches for pending refresh signals and apply
    /// any finished ones. Returns true if the view state changed.
    pub fn pump(&mut self) -> bool {
        while let Ok(RefreshRequest) = self.refresh_rx.try_recv() {
            self.on_refresh_request();
        }

        let mut changed = false;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.on_outcome(outcome);
            changed = true;
        }
        changed
    }

    /// Wait until the view state changes
    ///
    /// Never resolves once the session is stopped and nothing is in flight,
    /// so callers should race it against their own shutdown signal. The
    /// session holds both senders, so neither channel ever closes.
    pub async fn next_change(&mut self) {
        loop {
            tokio::select! {
                Some(outcome) = self.outcome_rx.recv() => {
                    self.on_outcome(outcome);
                    return;
                }
                Some(RefreshRequest) = self.refresh_rx.recv() => {
                    self.on_refresh_request();
                }
            }
        }
    }

    /// Capability for other components to request a refresh through the
    /// same path the sync loop uses
    pub fn refresh_trigger(&self) -> mpsc::UnboundedSender<RefreshRequest> {
        self.refresh_tx.clone()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ApplicationStatus, StatusFilter};
    use crate::store::MockApplicationSource;
    use crate::sync::{MockChangeFeed, PollSignal, RefreshTrigger};
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    fn app(id: u64, status: &str) -> LoanApplication {
        LoanApplication {
            id,
            applicant_name: format!("Applicant {}", id),
            credit_score: 700,
            amount_requested: 2500.0,
            risk_factor: 0.2,
            status: ApplicationStatus::from(status),
            created_at: "2024-03-05T10:15:00Z".parse().unwrap(),
        }
    }

    /// Each fetch returns one more application than the last
    fn growing_source(fetches: Arc<AtomicUsize>) -> MockApplicationSource {
        let mut source = MockApplicationSource::new();
        source.expect_fetch_applications().returning(move || {
            let n = fetches.fetch_add(1, Ordering::SeqCst) as u64 + 1;
            Ok((1..=n).map(|id| app(id, "approved")).collect())
        });
        source
    }

    fn idle_feed() -> MockChangeFeed {
        let mut feed = MockChangeFeed::new();
        feed.expect_poll().never();
        feed
    }

    fn disabled() -> SyncConfig {
        SyncConfig {
            enabled: false,
            ..SyncConfig::default()
        }
    }

    /// Feed driven from the test through a channel; hangs once it closes
    struct ChannelFeed {
        signals: Mutex<mpsc::UnboundedReceiver<PollSignal>>,
    }

    #[async_trait::async_trait]
    impl ChangeFeed for ChannelFeed {
        async fn poll(&self) -> Result<PollSignal> {
            match self.signals.lock().await.recv().await {
                Some(signal) => Ok(signal),
                None => std::future::pending().await,
            }
        }
    }

    #[tokio::test]
    async fn test_bootstrap_fetch_is_applied() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut session = Session::start(
            Arc::new(growing_source(fetches.clone())),
            Arc::new(idle_feed()),
            &disabled(),
        );
        assert!(session.store().is_loading());
        assert_eq!(session.in_flight(), 1);

        session.next_change().await;

        assert!(!session.store().is_loading());
        assert_eq!(session.store().applications().len(), 1);
        assert_eq!(session.in_flight(), 0);
        assert_eq!(session.sync_state(), SyncState::Stopped);
    }

    #[tokio::test]
    async fn test_poll_refresh_triggers_fetch() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let feed = ChannelFeed {
            signals: Mutex::new(signal_rx),
        };

        let mut session = Session::start(
            Arc::new(growing_source(fetches.clone())),
            Arc::new(feed),
            &SyncConfig::default(),
        );
        session.next_change().await;
        assert_eq!(session.store().applications().len(), 1);

        signal_tx.send(PollSignal::NoChange).unwrap();
        signal_tx.send(PollSignal::Refresh).unwrap();
        session.next_change().await;

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(session.store().applications().len(), 2);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let mut source = MockApplicationSource::new();
        source.expect_fetch_applications().returning(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::Fetch("connection refused".to_string()))
            } else {
                Ok(vec![app(1, "approved"), app(2, "rejected")])
            }
        });

        let mut session = Session::start(Arc::new(source), Arc::new(idle_feed()), &disabled());
        session.next_change().await;
        assert!(session.store().error().is_some());

        session.retry();
        session.next_change().await;

        assert!(session.store().error().is_none());
        assert_eq!(session.store().applications().len(), 2);
    }

    #[tokio::test]
    async fn test_filter_survives_refresh() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut session = Session::start(
            Arc::new(growing_source(fetches)),
            Arc::new(idle_feed()),
            &disabled(),
        );
        session.store_mut().set_filter(StatusFilter::Rejected);
        session.next_change().await;

        assert_eq!(session.store().filter(), StatusFilter::Rejected);
        assert!(session.store().filtered_view().is_empty());
    }

    #[tokio::test]
    async fn test_stopped_session_ignores_refresh_signals() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut session = Session::start(
            Arc::new(growing_source(fetches.clone())),
            Arc::new(idle_feed()),
            &disabled(),
        );
        session.next_change().await;
        assert_eq!(fetches.load(Ordering::SeqCst), 1);

        let trigger = session.refresh_trigger();
        session.stop();
        trigger.request_refresh();
        session.retry();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!session.pump());
        assert_eq!(session.in_flight(), 0);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_change_keeps_waiting_after_stop() {
        let mut session = Session::start(
            Arc::new(growing_source(Arc::new(AtomicUsize::new(0)))),
            Arc::new(idle_feed()),
            &disabled(),
        );
        session.next_change().await;

        let trigger = session.refresh_trigger();
        session.stop();
        trigger.request_refresh();

        // The dropped trigger is consumed, but nothing changes the view
        let waited = tokio::time::timeout(Duration::from_secs(60), session.next_change()).await;
        assert!(waited.is_err());
        assert!(!session.pump());
    }

    #[tokio::test]
    async fn test_pump_applies_finished_fetches() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut session = Session::start(
            Arc::new(growing_source(fetches)),
            Arc::new(idle_feed()),
            &disabled(),
        );

        let mut changed = false;
        for _ in 0..50 {
            if session.pump() {
                changed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(changed);
        assert_eq!(session.store().applications().len(), 1);
        assert!(!session.pump());
    }
}
