//! Long-poll sync loop.
//!
//! Holds a poll request open against the backend until it reports a change
//! (or its own timeout runs out), then immediately asks again. A "refresh"
//! answer pokes the store through a [`RefreshTrigger`]; failures park the
//! loop in a fixed cooldown so a struggling backend isn't hammered.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::Result;

/// Default wait after a failed poll before trying again
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// What one poll response means for the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSignal {
    /// Server says the data changed, go re-fetch
    Refresh,
    /// Server timed out or sent something else, just poll again
    NoChange,
}

/// The "has anything changed?" endpoint
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn poll(&self) -> Result<PollSignal>;
}

/// Capability to ask for a refresh without touching the store itself
pub trait RefreshTrigger: Send + Sync + 'static {
    fn request_refresh(&self);
}

/// Marker sent through the refresh channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRequest;

impl RefreshTrigger for mpsc::UnboundedSender<RefreshRequest> {
    fn request_refresh(&self) {
        // Receiver gone means the view is being torn down
        let _ = self.send(RefreshRequest);
    }
}

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Polling,
    Backoff,
    Stopped,
}

impl SyncState {
    pub fn label(&self) -> &'static str {
        match self {
            SyncState::Polling => "live",
            SyncState::Backoff => "reconnecting",
            SyncState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub struct SyncLoop<T: RefreshTrigger> {
    feed: Arc<dyn ChangeFeed>,
    trigger: T,
    cooldown: Duration,
    shutdown: CancellationToken,
    state: watch::Sender<SyncState>,
}

impl<T: RefreshTrigger> SyncLoop<T> {
    pub fn new(feed: Arc<dyn ChangeFeed>, trigger: T) -> Self {
        let (state, _) = watch::channel(SyncState::Stopped);
        Self {
            feed,
            trigger,
            cooldown: DEFAULT_COOLDOWN,
            shutdown: CancellationToken::new(),
            state,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Use an externally owned token (e.g. a child of the app's shutdown token)
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// Start the loop on the runtime and hand back a handle to stop it
    pub fn spawn(self) -> SyncHandle {
        let shutdown = self.shutdown.clone();
        let state = self.subscribe();
        let task = tokio::spawn(self.run());
        SyncHandle {
            shutdown,
            state,
            task: Some(task),
        }
    }

    /// Run until cancelled
    ///
    /// Requests are strictly sequential. Cancellation is checked before every
    /// poll and right after every suspension; a poll that was in flight when
    /// cancellation hit is dropped and its answer never acted on.
    pub async fn run(self) {
        info!("Starting sync loop (cooldown {:?})", self.cooldown);

        while !self.shutdown.is_cancelled() {
            self.state.send_replace(SyncState::Polling);

            let outcome = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                outcome = self.feed.poll() => outcome,
            };

            if self.shutdown.is_cancelled() {
                debug!("Discarding poll result that arrived after cancellation");
                break;
            }

            match outcome {
                Ok(PollSignal::Refresh) => {
                    info!("Received refresh signal from server");
                    self.trigger.request_refresh();
                }
                Ok(PollSignal::NoChange) => {
                    debug!("Poll returned without changes, polling again");
                }
                Err(e) => {
                    warn!("Long polling error: {}. Retrying in {:?}", e, self.cooldown);
                    self.state.send_replace(SyncState::Backoff);

                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.cooldown) => {}
                    }
                }
            }
        }

        self.state.send_replace(SyncState::Stopped);
        info!("Sync loop stopped");
    }
}

/// Running sync loop; dropping it stops the loop
pub struct SyncHandle {
    shutdown: CancellationToken,
    state: watch::Receiver<SyncState>,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Signal the loop to stop; it exits at its next checkpoint
    pub fn stop(&self) {
        self.shutdown.cancel();
    }

    /// Stop and wait for the task to wind down
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Sync loop task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
