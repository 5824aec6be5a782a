//! Client-side notification store.
//!
//! Owns the session's notification collection and its unread count, polls
//! the notification service on a timer, and reconciles read state after
//! the service confirms each change. All remote failures are recorded in
//! `last_error` and broadcast as a [`Notice`]; they are also returned so
//! callers can react, but ignoring them is safe.

pub mod state;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::clock::{Clock, SystemClock};
use crate::display::{classify, format_relative_time, IconCategory};
use crate::errors::NotifyError;
use crate::models::notification::Notification;
use crate::notice::Notice;
use crate::service::NotificationService;
use crate::session::SessionProvider;

pub use state::{MarkAllOutcome, MarkOutcome, RefreshOutcome, StoreState};
use state::State;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(60_000);

const NOTICE_CAPACITY: usize = 64;

/// A notification prepared for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationView {
    pub notification: Notification,
    pub category: IconCategory,
    pub age: String,
}

pub struct NotificationStore {
    inner: Arc<Inner>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    service: Arc<dyn NotificationService>,
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
    notices: broadcast::Sender<Notice>,
    next_seq: AtomicU64,
    disposed: AtomicBool,
}

impl NotificationStore {
    pub fn new(
        service: Arc<dyn NotificationService>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self::with_clock(service, session, Arc::new(SystemClock))
    }

    pub fn with_clock(
        service: Arc<dyn NotificationService>,
        session: Arc<dyn SessionProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                service,
                session,
                clock,
                state: Mutex::new(State::default()),
                notices,
                next_seq: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
            }),
            poller: Mutex::new(None),
        }
    }

    /// Receive success/error notices emitted by store operations.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub fn snapshot(&self) -> StoreState {
        self.inner.state().snapshot()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.state().notifications().to_vec()
    }

    pub fn unread_count(&self) -> usize {
        self.inner.state().unread_count()
    }

    /// Current collection with icon category and relative age resolved
    /// against the store's clock.
    pub fn views(&self) -> Vec<NotificationView> {
        let now = self.inner.clock.now();
        self.inner
            .state()
            .notifications()
            .iter()
            .map(|n| NotificationView {
                category: classify(n),
                age: format_relative_time(n.created_at, now),
                notification: n.clone(),
            })
            .collect()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.is_disposed()
    }

    /// Fetch the full collection and replace local state with it.
    pub async fn refresh(&self) -> Result<RefreshOutcome, NotifyError> {
        self.inner.refresh().await
    }

    /// Mark one notification read once the service confirms it.
    pub async fn mark_as_read(&self, id: &str) -> Result<MarkOutcome, NotifyError> {
        self.inner.mark_as_read(id).await
    }

    /// Mark every currently-unread notification read, one concurrent call
    /// per entry. Only entries the service confirmed are flipped locally.
    pub async fn mark_all_as_read(&self) -> Result<MarkAllOutcome, NotifyError> {
        self.inner.mark_all_as_read().await
    }

    /// Refresh now and then every `interval` until [`stop_polling`],
    /// [`dispose`] or drop. Replaces any running poller.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// [`stop_polling`]: Self::stop_polling
    /// [`dispose`]: Self::dispose
    pub fn start_polling(&self, interval: Duration) -> Result<(), NotifyError> {
        if interval.is_zero() {
            return Err(NotifyError::InvalidInterval);
        }
        if self.inner.is_disposed() {
            tracing::debug!("start_polling on disposed store ignored");
            return Ok(());
        }

        let mut poller = self.poller();
        if let Some(previous) = poller.take() {
            previous.abort();
        }

        let weak = Arc::downgrade(&self.inner);
        *poller = Some(tokio::spawn(poll_loop(weak, interval)));
        tracing::info!(interval_ms = interval.as_millis() as u64, "notification polling started");
        Ok(())
    }

    /// Cancel the poller. Safe to call when not polling.
    pub fn stop_polling(&self) {
        if let Some(handle) = self.poller().take() {
            handle.abort();
            tracing::info!("notification polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// End of session: stop polling, drop all local state, and ignore any
    /// responses still in flight.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_polling();
        self.inner.state().clear();
        tracing::info!("notification store disposed");
    }

    fn poller(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poller.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for NotificationStore {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

async fn poll_loop(store: Weak<Inner>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // first tick completes immediately
        ticker.tick().await;

        let Some(inner) = store.upgrade() else {
            break;
        };
        if inner.is_disposed() {
            break;
        }
        if let Err(e) = inner.refresh().await {
            tracing::debug!(error = %e, "scheduled refresh failed");
        }
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn emit(&self, notice: Notice) {
        // no subscribers is fine
        let _ = self.notices.send(notice);
    }

    fn fail(&self, err: NotifyError) -> NotifyError {
        self.state().set_error(err.kind());
        self.emit(Notice::error(err.user_message()));
        err
    }

    async fn refresh(&self) -> Result<RefreshOutcome, NotifyError> {
        if self.is_disposed() {
            return Ok(RefreshOutcome::Disposed);
        }
        let Some(token) = self.session.token() else {
            tracing::debug!("no session token, skipping notification refresh");
            return Ok(RefreshOutcome::NoSession);
        };

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let in_flight = InFlight::begin(self);

        let result = self.service.list(&token).await;

        if self.is_disposed() {
            tracing::debug!(seq, "refresh completed after dispose, ignoring");
            return Ok(RefreshOutcome::Disposed);
        }
        drop(in_flight);

        match result {
            Ok(list) => {
                let outcome = self.state().apply_list(seq, list);
                match outcome {
                    RefreshOutcome::Applied { count, unread } => {
                        tracing::debug!(seq, count, unread, "notifications refreshed");
                    }
                    _ => tracing::debug!(seq, "discarding stale notification response"),
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "failed to refresh notifications");
                if self.state().is_superseded(seq) {
                    tracing::debug!(seq, "newer refresh already applied, not recording failure");
                    return Err(e);
                }
                Err(self.fail(e))
            }
        }
    }

    async fn mark_as_read(&self, id: &str) -> Result<MarkOutcome, NotifyError> {
        if self.is_disposed() {
            return Ok(MarkOutcome::Disposed);
        }
        let Some(token) = self.session.token() else {
            return Ok(MarkOutcome::NoSession);
        };

        let result = self.service.mark_read(&token, id).await;

        if self.is_disposed() {
            return Ok(MarkOutcome::Disposed);
        }

        match result {
            Ok(()) => {
                let outcome = self.state().mark_read(id);
                tracing::info!(notification_id = id, outcome = ?outcome, "notification marked as read");
                self.emit(Notice::success("Notification marked as read"));
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(notification_id = id, error = %e, "failed to mark notification as read");
                Err(self.fail(e))
            }
        }
    }

    async fn mark_all_as_read(&self) -> Result<MarkAllOutcome, NotifyError> {
        if self.is_disposed() {
            return Ok(MarkAllOutcome::Disposed);
        }
        let Some(token) = self.session.token() else {
            return Ok(MarkAllOutcome::NoSession);
        };

        let ids = self.state().unread_ids();
        if ids.is_empty() {
            return Ok(MarkAllOutcome::Completed {
                marked: 0,
                failed: 0,
            });
        }

        let calls = ids.iter().map(|id| self.service.mark_read(&token, id));
        let results = futures::future::join_all(calls).await;

        if self.is_disposed() {
            return Ok(MarkAllOutcome::Disposed);
        }

        let mut marked = 0;
        let mut failed = 0;
        let mut first_error = None;
        {
            let mut state = self.state();
            for (id, result) in ids.iter().zip(results) {
                match result {
                    Ok(()) => match state.mark_read(id) {
                        MarkOutcome::Marked => marked += 1,
                        outcome => {
                            tracing::debug!(notification_id = %id, outcome = ?outcome, "mark-all: entry changed meanwhile");
                        }
                    },
                    Err(e) => {
                        tracing::warn!(notification_id = %id, error = %e, "mark-all: call failed");
                        failed += 1;
                        first_error.get_or_insert(e);
                    }
                }
            }
        }

        match first_error {
            None => {
                tracing::info!(marked, "all notifications marked as read");
                self.emit(Notice::success("All notifications marked as read"));
            }
            Some(e) => {
                tracing::warn!(marked, failed, "mark-all completed with failures");
                self.state().set_error(e.kind());
                self.emit(Notice::error(format!(
                    "Could not mark {} of {} notifications as read",
                    failed,
                    ids.len()
                )));
            }
        }

        Ok(MarkAllOutcome::Completed { marked, failed })
    }
}

/// One slot of the in-flight refresh counter. Released on drop, so a
/// refresh cancelled mid-request (poller aborted) still clears `loading`.
struct InFlight<'a> {
    inner: &'a Inner,
}

impl<'a> InFlight<'a> {
    fn begin(inner: &'a Inner) -> Self {
        inner.state().begin_refresh();
        Self { inner }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.state().end_refresh();
    }
}
