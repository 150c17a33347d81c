//! Snapshot engine: the authoritative in-memory view of monitored API health.
//!
//! The engine owns one [`MonitorSnapshot`] and moves through three phases:
//!
//! ```text
//!   Empty ──refresh──▶ Loading ──ok──▶ Ready ──refresh──▶ Loading ...
//!                         │                                  │
//!                         └──err (keep previous snapshot)◀───┘
//! ```
//!
//! A full refresh replaces the snapshot wholesale in one assignment. A
//! test-now result patches exactly one row in place and leaves the summary
//! alone until the next full refresh. When both race for the same key the
//! later completion wins; there is no version reconciliation.
//!
//! At most one full refresh is in flight: the `loading` flag is claimed and
//! released through the same watch channel subscribers read from.

mod error;
mod model;
mod status;

#[cfg(test)]
mod tests;

pub use error::*;
pub use model::*;
pub use status::*;

use crate::client::{MonitorApi, MonitorError};
use crate::params::ParameterSet;
use crate::session::SessionContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Logical state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No snapshot yet
    Empty,
    /// A full refresh is in flight (a previous snapshot may still be shown)
    Loading,
    /// Snapshot present, summary trusted
    Ready,
}

/// What subscribers observe.
#[derive(Debug, Clone, Default)]
pub struct EngineView {
    pub snapshot: Option<Arc<MonitorSnapshot>>,
    pub loading: bool,
    /// Most recent failure, cleared by the next successful full refresh
    pub last_error: Option<String>,
}

impl EngineView {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.snapshot.is_some() {
            Phase::Ready
        } else {
            Phase::Empty
        }
    }
}

/// Result of a [`SnapshotEngine::refresh`] call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced with this many endpoints
    Replaced { endpoints: usize },
    /// Another full refresh was already in flight; nothing was requested
    AlreadyInFlight,
    /// The session changed while the request was outstanding; result dropped
    Discarded,
}

struct AutoRefresh {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the claimed `loading` flag until the refresh settles.
///
/// [`LoadingGuard::settle`] publishes the outcome and clears the flag in one
/// send, then disarms the guard. Dropping an armed guard (cancelled future,
/// discarded result) only clears the flag. A disarmed guard never touches it
/// again, since another refresh may own it by then.
struct LoadingGuard<'a> {
    view: &'a watch::Sender<EngineView>,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(view: &'a watch::Sender<EngineView>) -> Self {
        Self { view, armed: true }
    }

    fn settle(mut self, apply: impl FnOnce(&mut EngineView)) {
        self.view.send_modify(|view| {
            apply(view);
            view.loading = false;
        });
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.view
                .send_if_modified(|view| std::mem::replace(&mut view.loading, false));
        }
    }
}

/// Owner of the monitor snapshot and the refresh cycle.
pub struct SnapshotEngine {
    client: Arc<dyn MonitorApi>,
    session: RwLock<SessionContext>,
    params: RwLock<ParameterSet>,
    policy: StatusPolicy,
    /// Bumped on sign-out so in-flight results for the old session are dropped
    generation: AtomicU64,
    view: watch::Sender<EngineView>,
    auto_refresh: Mutex<Option<AutoRefresh>>,
}

impl SnapshotEngine {
    pub fn new(
        client: Arc<dyn MonitorApi>,
        session: SessionContext,
        params: ParameterSet,
        policy: StatusPolicy,
    ) -> Self {
        let (view, _) = watch::channel(EngineView::default());
        Self {
            client,
            session: RwLock::new(session),
            params: RwLock::new(params),
            policy,
            generation: AtomicU64::new(0),
            view,
            auto_refresh: Mutex::new(None),
        }
    }

    /// Receive every change to the snapshot, loading flag or last error.
    pub fn subscribe(&self) -> watch::Receiver<EngineView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> EngineView {
        self.view.borrow().clone()
    }

    pub fn snapshot(&self) -> Option<Arc<MonitorSnapshot>> {
        self.view.borrow().snapshot.clone()
    }

    pub fn phase(&self) -> Phase {
        self.view.borrow().phase()
    }

    pub fn is_loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    pub fn session(&self) -> SessionContext {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn params(&self) -> ParameterSet {
        self.params
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Use a new parameter set for subsequent requests.
    pub fn set_params(&self, params: ParameterSet) {
        *self.params.write().unwrap_or_else(PoisonError::into_inner) = params;
    }

    /// Fetch the full feed and replace the snapshot.
    ///
    /// A no-op returning [`RefreshOutcome::AlreadyInFlight`] if a refresh is
    /// already outstanding.
    ///
    /// # Errors
    ///
    /// Returns the client error if the fetch failed. The previous snapshot is
    /// kept and the error is also published as `last_error`.
    pub async fn refresh(&self) -> Result<RefreshOutcome, EngineError> {
        let claimed = self.view.send_if_modified(|view| {
            if view.loading {
                false
            } else {
                view.loading = true;
                true
            }
        });
        if !claimed {
            tracing::debug!("Full refresh already in flight, skipping");
            metrics::counter!("apimon_refresh_total", "outcome" => "skipped").increment(1);
            return Ok(RefreshOutcome::AlreadyInFlight);
        }
        let loading = LoadingGuard::new(&self.view);

        let generation = self.generation.load(Ordering::Acquire);
        let session = self.session();
        let params = self.params();

        tracing::debug!("Full refresh started");
        let start = Instant::now();
        let result = self.client.fetch_snapshot(&session, &params).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        metrics::histogram!("apimon_refresh_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        if self.generation.load(Ordering::Acquire) != generation {
            tracing::info!("Session ended during refresh, discarding result");
            metrics::counter!("apimon_refresh_total", "outcome" => "discarded").increment(1);
            return Ok(RefreshOutcome::Discarded);
        }

        match result {
            Ok(mut snapshot) => {
                snapshot.reclassify(&self.policy);
                let endpoints = snapshot.endpoints.len();
                let snapshot = Arc::new(snapshot);

                loading.settle(|view| {
                    view.snapshot = Some(snapshot);
                    view.last_error = None;
                });

                tracing::info!(endpoints, duration_ms, "Snapshot replaced");
                metrics::counter!("apimon_refresh_total", "outcome" => "success").increment(1);
                Ok(RefreshOutcome::Replaced { endpoints })
            }
            Err(err) => {
                log_client_error("refresh", None, &err);
                let message = err.to_string();
                loading.settle(|view| view.last_error = Some(message));
                metrics::counter!("apimon_refresh_total", "outcome" => err.kind()).increment(1);
                Err(err.into())
            }
        }
    }

    /// Re-test one endpoint and patch its row in place.
    ///
    /// # Errors
    ///
    /// - `NoSnapshot` / `Consistency` if `key` is not in the current snapshot
    ///   (checked before the request and again before applying the result)
    /// - `Client` if the backend call failed; the row is left unchanged
    pub async fn test_one(&self, key: &str) -> Result<MonitoredEndpoint, EngineError> {
        self.ensure_known(key)?;

        let generation = self.generation.load(Ordering::Acquire);
        let session = self.session();
        let params = self.params();

        let mut row = match self.client.test_endpoint(&session, &params, key).await {
            Ok(row) if row.key == key => row,
            Ok(row) => {
                let err = MonitorError::MalformedResponse(format!(
                    "test-now for `{}` returned endpoint `{}`",
                    key, row.key
                ));
                return Err(self.fail_test_now(key, err));
            }
            Err(err) => return Err(self.fail_test_now(key, err)),
        };

        if self.generation.load(Ordering::Acquire) != generation {
            tracing::info!(key, "Session ended during test-now, discarding result");
            return Err(MonitorError::Unauthenticated.into());
        }

        row.reclassify(&self.policy);

        let mut applied = false;
        self.view.send_if_modified(|view| {
            let Some(snapshot) = view.snapshot.as_mut() else {
                return false;
            };
            if !snapshot.endpoints.contains(key) {
                return false;
            }
            applied = Arc::make_mut(snapshot).endpoints.patch(row.clone()).is_ok();
            applied
        });

        if !applied {
            tracing::warn!(key, "Endpoint left the snapshot before its test-now result arrived");
            metrics::counter!("apimon_test_now_total", "outcome" => "consistency").increment(1);
            return Err(EngineError::Consistency {
                key: key.to_string(),
            });
        }

        tracing::info!(
            key,
            status = %row.derived_status,
            status_code = ?row.status_code,
            response_time_ms = ?row.response_time_ms,
            "Endpoint re-tested"
        );
        metrics::counter!("apimon_test_now_total", "outcome" => "success").increment(1);
        Ok(row)
    }

    fn ensure_known(&self, key: &str) -> Result<(), EngineError> {
        let view = self.view.borrow();
        match &view.snapshot {
            None => Err(EngineError::NoSnapshot {
                key: key.to_string(),
            }),
            Some(snapshot) if !snapshot.endpoints.contains(key) => {
                tracing::warn!(key, "Test-now requested for a key outside the snapshot");
                metrics::counter!("apimon_test_now_total", "outcome" => "consistency")
                    .increment(1);
                Err(EngineError::Consistency {
                    key: key.to_string(),
                })
            }
            Some(_) => Ok(()),
        }
    }

    fn fail_test_now(&self, key: &str, err: MonitorError) -> EngineError {
        log_client_error("test_now", Some(key), &err);
        metrics::counter!("apimon_test_now_total", "outcome" => err.kind()).increment(1);
        let message = format!("{}: {}", key, err);
        self.view.send_modify(|view| view.last_error = Some(message));
        err.into()
    }

    /// Refresh on a fixed cadence, starting immediately.
    ///
    /// Replaces any running schedule. The task holds a reference to the
    /// engine until [`SnapshotEngine::stop_auto_refresh`] is called.
    pub fn start_auto_refresh(self: &Arc<Self>, interval: Duration) {
        // tokio::time::interval panics on a zero period
        let interval = interval.max(Duration::from_millis(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let engine = Arc::clone(self);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = interval.as_secs(),
                "Auto-refresh started"
            );

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Auto-refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        // Cancellation is only observed between ticks, so an
                        // in-flight refresh always completes and applies.
                        if let Err(e) = engine.refresh().await {
                            tracing::debug!(error = %e, "Scheduled refresh failed");
                        }
                    }
                }
            }
        });

        let previous = self
            .auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(AutoRefresh { cancel, handle });
        if let Some(previous) = previous {
            tracing::debug!("Replacing previous auto-refresh schedule");
            previous.cancel.cancel();
        }
    }

    /// Cancel the schedule. Returns the task handle so callers can await it.
    pub fn stop_auto_refresh(&self) -> Option<JoinHandle<()>> {
        let running = self
            .auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        running.cancel.cancel();
        Some(running.handle)
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.auto_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop refreshing, forget the session and discard the snapshot.
    pub fn sign_out(&self) {
        let _ = self.stop_auto_refresh();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *self.session.write().unwrap_or_else(PoisonError::into_inner) =
            SessionContext::anonymous();

        // `loading` stays with whichever refresh claimed it
        self.view.send_modify(|view| {
            view.snapshot = None;
            view.last_error = None;
        });
        tracing::info!("Signed out, snapshot discarded");
    }
}

fn log_client_error(operation: &'static str, key: Option<&str>, err: &MonitorError) {
    match err {
        MonitorError::MalformedResponse(detail) => tracing::error!(
            operation,
            key,
            kind = "malformed_response",
            detail = %detail,
            "Backend returned an unexpected payload"
        ),
        MonitorError::Transport { status, message } => tracing::warn!(
            operation,
            key,
            kind = "transport",
            status = ?status,
            error = %message,
            "Backend request failed"
        ),
        MonitorError::Unauthenticated | MonitorError::Forbidden { .. } => tracing::warn!(
            operation,
            key,
            kind = err.kind(),
            "Request not attempted"
        ),
    }
}
