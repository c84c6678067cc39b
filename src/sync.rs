//! Sync Poller
//!
//! Asks the server to refresh its data, then polls the health endpoint until
//! the freshness timestamp moves or the deadline passes. Either way a single
//! "data changed" signal is emitted so dependent screens reload.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::api::{ApiClient, ClientError, ClientResult};
use crate::config::SyncConfig;

/// The two calls the poller needs from the API
#[async_trait]
pub trait SyncBackend: Send + Sync {
    /// Request a refresh; returns the freshness timestamp seen at that moment
    async fn trigger_sync(&self, force: bool) -> ClientResult<Option<String>>;

    /// Current freshness timestamp
    async fn last_update(&self) -> ClientResult<Option<String>>;
}

#[async_trait]
impl SyncBackend for ApiClient {
    async fn trigger_sync(&self, force: bool) -> ClientResult<Option<String>> {
        Ok(ApiClient::trigger_sync(self, force).await?.last_update)
    }

    async fn last_update(&self) -> ClientResult<Option<String>> {
        Ok(self.health().await?.last_update)
    }
}

/// How a sync run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The freshness timestamp moved
    Changed { last_update: String },
    /// The deadline passed without a change
    TimedOut,
    /// Another run was already in flight
    Skipped,
}

/// Clears the in-flight flag however the run ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SyncPoller {
    interval: Duration,
    timeout: Duration,
    in_flight: AtomicBool,
    last_update: Mutex<Option<String>>,
    data_changed: watch::Sender<u64>,
}

impl SyncPoller {
    pub fn new(config: &SyncConfig) -> Self {
        Self::with_timing(config.poll_interval(), config.timeout())
    }

    pub fn with_timing(interval: Duration, timeout: Duration) -> Self {
        let (data_changed, _) = watch::channel(0);
        Self {
            interval,
            timeout,
            in_flight: AtomicBool::new(false),
            last_update: Mutex::new(None),
            data_changed,
        }
    }

    /// Receiver bumped once per completed run
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.data_changed.subscribe()
    }

    /// Number of "data changed" signals emitted so far
    pub fn generation(&self) -> u64 {
        *self.data_changed.borrow()
    }

    pub fn last_update(&self) -> Option<String> {
        self.last_update.lock().ok().and_then(|g| g.clone())
    }

    /// Record the freshness timestamp observed by another load
    pub fn set_last_update(&self, value: Option<String>) {
        if let Ok(mut guard) = self.last_update.lock() {
            *guard = value;
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Trigger a refresh and wait for fresh data.
    ///
    /// A failed trigger request is returned as an error and emits nothing.
    /// Failures while polling are ignored, except a rejected credential which
    /// ends the run.
    pub async fn run<B>(&self, backend: &B, force: bool) -> ClientResult<SyncOutcome>
    where
        B: SyncBackend + ?Sized,
    {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("Sync already in flight, skipping");
            return Ok(SyncOutcome::Skipped);
        }
        let _in_flight = InFlight(&self.in_flight);

        tracing::info!(force, "Triggering sync");
        let start_last = match backend.trigger_sync(force).await? {
            Some(value) => Some(value),
            None => self.last_update(),
        };

        let deadline = Instant::now() + self.timeout;
        while Instant::now() < deadline {
            tokio::time::sleep(self.interval).await;

            match backend.last_update().await {
                Ok(Some(current)) if Some(&current) != start_last.as_ref() => {
                    tracing::info!(last_update = %current, "Fresh data available");
                    self.set_last_update(Some(current.clone()));
                    self.emit();
                    return Ok(SyncOutcome::Changed {
                        last_update: current,
                    });
                }
                Ok(_) => {}
                Err(ClientError::Unauthorized) => return Err(ClientError::Unauthorized),
                Err(e) => {
                    tracing::debug!(error = %e, "Health poll failed, continuing");
                }
            }
        }

        tracing::info!(timeout_secs = self.timeout.as_secs(), "Sync wait timed out");
        self.emit();
        Ok(SyncOutcome::TimedOut)
    }

    fn emit(&self) {
        self.data_changed.send_modify(|n| *n += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Health reports `initial` until `changes_after` polls, then `changed`
    struct FakeBackend {
        sync_value: Option<String>,
        initial: Option<String>,
        changed: Option<String>,
        changes_after: usize,
        fail_every_other: bool,
        polls: AtomicUsize,
    }

    impl FakeBackend {
        fn new(sync_value: Option<&str>, initial: Option<&str>) -> Self {
            Self {
                sync_value: sync_value.map(str::to_string),
                initial: initial.map(str::to_string),
                changed: None,
                changes_after: usize::MAX,
                fail_every_other: false,
                polls: AtomicUsize::new(0),
            }
        }

        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SyncBackend for FakeBackend {
        async fn trigger_sync(&self, _force: bool) -> ClientResult<Option<String>> {
            Ok(self.sync_value.clone())
        }

        async fn last_update(&self) -> ClientResult<Option<String>> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every_other && n % 2 == 1 {
                return Err(ClientError::Timeout);
            }
            if n >= self.changes_after {
                Ok(self.changed.clone())
            } else {
                Ok(self.initial.clone())
            }
        }
    }

    fn poller() -> SyncPoller {
        SyncPoller::with_timing(Duration::from_secs(3), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn test_change_detected() {
        let mut backend = FakeBackend::new(Some("t0"), Some("t0"));
        backend.changed = Some("t1".into());
        backend.changes_after = 3;

        let poller = poller();
        let rx = poller.subscribe();
        let started = Instant::now();

        let outcome = poller.run(&backend, false).await.unwrap();
        assert_eq!(
            outcome,
            SyncOutcome::Changed {
                last_update: "t1".into()
            }
        );
        assert_eq!(backend.polls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(9));
        assert_eq!(*rx.borrow(), 1);
        assert_eq!(poller.last_update().as_deref(), Some("t1"));
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_emits_once() {
        let backend = FakeBackend::new(Some("t0"), Some("t0"));
        let poller = poller();

        let outcome = poller.run(&backend, true).await.unwrap();
        assert_eq!(outcome, SyncOutcome::TimedOut);
        assert_eq!(backend.polls(), 20);
        assert_eq!(poller.generation(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_baseline_falls_back_to_known_value() {
        // Sync response carries no timestamp; health keeps reporting the
        // value already known, so nothing changed
        let backend = FakeBackend::new(None, Some("t0"));
        let poller = poller();
        poller.set_last_update(Some("t0".into()));

        assert_eq!(
            poller.run(&backend, false).await.unwrap(),
            SyncOutcome::TimedOut
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_errors_are_swallowed() {
        let mut backend = FakeBackend::new(Some("t0"), Some("t0"));
        backend.changed = Some("t1".into());
        backend.changes_after = 4;
        backend.fail_every_other = true;

        let poller = poller();
        let outcome = poller.run(&backend, false).await.unwrap();
        assert!(matches!(outcome, SyncOutcome::Changed { .. }));
        assert_eq!(backend.polls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_run_is_skipped() {
        let backend = Arc::new(FakeBackend::new(Some("t0"), Some("t0")));
        let poller = Arc::new(poller());

        let first = {
            let (poller, backend) = (Arc::clone(&poller), Arc::clone(&backend));
            tokio::spawn(async move { poller.run(backend.as_ref(), false).await })
        };
        // Let the first run reach its first sleep
        tokio::task::yield_now().await;
        assert!(poller.is_running());

        let second = poller.run(backend.as_ref(), false).await.unwrap();
        assert_eq!(second, SyncOutcome::Skipped);

        let first = first.await.unwrap().unwrap();
        assert_eq!(first, SyncOutcome::TimedOut);
        assert_eq!(poller.generation(), 1);
        assert!(!poller.is_running());
    }

    struct FailingTrigger;

    #[async_trait]
    impl SyncBackend for FailingTrigger {
        async fn trigger_sync(&self, _force: bool) -> ClientResult<Option<String>> {
            Err(ClientError::Unauthorized)
        }

        async fn last_update(&self) -> ClientResult<Option<String>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_trigger_failure_emits_nothing() {
        let poller = poller();
        let err = poller.run(&FailingTrigger, false).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(poller.generation(), 0);
        assert!(!poller.is_running());
    }
}
