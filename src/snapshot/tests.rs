//! Unit tests for the snapshot engine.

use super::*;
use crate::session::Role;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::AtomicUsize;
use tokio::sync::Notify;

// ============================================================================
// Fake backend
// ============================================================================

#[derive(Default)]
struct FakeMonitor {
    feeds: Mutex<VecDeque<Result<MonitorSnapshot, MonitorError>>>,
    rows: Mutex<HashMap<String, Result<MonitoredEndpoint, MonitorError>>>,
    fetch_calls: AtomicUsize,
    test_calls: AtomicUsize,
    fetch_gate: Option<Arc<Notify>>,
    test_gate: Option<Arc<Notify>>,
    /// Served once the queue is empty
    fallback_feed: Option<MonitorSnapshot>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeMonitor {
    fn with_feeds(feeds: Vec<Result<MonitorSnapshot, MonitorError>>) -> Self {
        Self {
            feeds: Mutex::new(feeds.into()),
            ..Default::default()
        }
    }

    fn queue_feed(&self, feed: Result<MonitorSnapshot, MonitorError>) {
        self.feeds.lock().unwrap().push_back(feed);
    }

    fn set_row(&self, key: &str, row: Result<MonitoredEndpoint, MonitorError>) {
        self.rows.lock().unwrap().insert(key.to_string(), row);
    }

    fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn test_calls(&self) -> usize {
        self.test_calls.load(Ordering::SeqCst)
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MonitorApi for FakeMonitor {
    async fn fetch_snapshot(
        &self,
        session: &SessionContext,
        _params: &ParameterSet,
    ) -> Result<MonitorSnapshot, MonitorError> {
        if !session.is_authenticated() {
            return Err(MonitorError::Unauthenticated);
        }
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);

        if let Some(gate) = &self.fetch_gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;

        let next = self.feeds.lock().unwrap().pop_front();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match (next, &self.fallback_feed) {
            (Some(feed), _) => feed,
            (None, Some(feed)) => Ok(feed.clone()),
            (None, None) => Err(MonitorError::transport(None, "no feed queued")),
        }
    }

    async fn test_endpoint(
        &self,
        session: &SessionContext,
        _params: &ParameterSet,
        key: &str,
    ) -> Result<MonitoredEndpoint, MonitorError> {
        if !session.is_authenticated() {
            return Err(MonitorError::Unauthenticated);
        }
        self.test_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.test_gate {
            gate.notified().await;
        }
        let row = self.rows.lock().unwrap().get(key).cloned();
        row.unwrap_or_else(|| Err(MonitorError::transport(Some(404), "unknown key")))
    }
}

// ============================================================================
// Builders
// ============================================================================

fn row(key: &str, status_code: Option<u16>, response_time_ms: Option<u64>) -> MonitoredEndpoint {
    MonitoredEndpoint {
        key: key.to_string(),
        name: format!("{} api", key),
        url: format!("https://api.example.com/{}", key),
        category: Some("Match".to_string()),
        sport: Some("cricket".to_string()),
        method: HttpMethod::Get,
        status_code,
        derived_status: derive_status(status_code, response_time_ms),
        response_time_ms,
        uptime_label: "100.00%".to_string(),
        last_checked_at: None,
        recent_samples: SampleWindow::new(),
        last_response_body: ResponseBody::Empty,
        reported_status: None,
    }
}

fn snapshot(rows: Vec<MonitoredEndpoint>) -> MonitorSnapshot {
    let healthy = rows.iter().filter(|r| r.derived_status.is_responding()).count() as u64;
    let summary = Summary {
        total_apis: rows.len() as u64,
        healthy_apis: healthy,
        failed_apis: rows.len() as u64 - healthy,
        avg_response_time_ms: 100,
    };
    MonitorSnapshot::new(summary, EndpointTable::from_rows(rows).unwrap())
}

fn user_session() -> SessionContext {
    SessionContext::new(Role::User, "RS_P_1", "token-1")
}

fn engine_with(fake: FakeMonitor) -> (Arc<SnapshotEngine>, Arc<FakeMonitor>) {
    engine_for(fake, user_session())
}

fn engine_for(
    fake: FakeMonitor,
    session: SessionContext,
) -> (Arc<SnapshotEngine>, Arc<FakeMonitor>) {
    let fake = Arc::new(fake);
    let engine = SnapshotEngine::new(
        fake.clone(),
        session,
        ParameterSet::default(),
        StatusPolicy::default(),
    );
    (Arc::new(engine), fake)
}

async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// ============================================================================
// Full refresh
// ============================================================================

#[tokio::test]
async fn test_starts_empty() {
    let (engine, _) = engine_with(FakeMonitor::default());
    assert_eq!(engine.phase(), Phase::Empty);
    assert!(engine.snapshot().is_none());
    assert!(!engine.is_loading());
}

#[tokio::test]
async fn test_refresh_populates_snapshot_in_server_order() {
    let feed = snapshot(vec![
        row("c", Some(200), Some(100)),
        row("a", Some(200), Some(100)),
        row("b", None, None),
    ]);
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(feed)]));

    let outcome = engine.refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Replaced { endpoints: 3 });
    assert_eq!(engine.phase(), Phase::Ready);
    assert_eq!(fake.fetch_calls(), 1);
    let current = engine.snapshot().unwrap();
    assert_eq!(current.endpoints.keys().collect::<Vec<_>>(), vec!["c", "a", "b"]);
}

#[tokio::test]
async fn test_full_refresh_replaces_rather_than_accumulates() {
    let first = snapshot(vec![
        row("a", Some(200), Some(100)),
        row("b", Some(200), Some(100)),
        row("c", None, None),
    ]);
    let second = snapshot(vec![row("b", Some(200), Some(90)), row("d", Some(200), Some(90))]);
    let (engine, _) = engine_with(FakeMonitor::with_feeds(vec![Ok(first), Ok(second)]));

    engine.refresh().await.unwrap();
    engine.refresh().await.unwrap();

    let current = engine.snapshot().unwrap();
    assert_eq!(current.endpoints.len(), 2);
    assert!(!current.endpoints.contains("a"));
    assert!(!current.endpoints.contains("c"));
    assert_eq!(current.summary.total_apis, 2);
}

#[tokio::test]
async fn test_refresh_failure_keeps_stale_snapshot() {
    let first = snapshot(vec![row("a", Some(200), Some(100))]);
    let (engine, _) = engine_with(FakeMonitor::with_feeds(vec![
        Ok(first),
        Err(MonitorError::transport(Some(503), "maintenance")),
    ]));

    engine.refresh().await.unwrap();
    let before = engine.snapshot().unwrap();

    let err = engine.refresh().await.unwrap_err();

    assert_eq!(err.kind(), "transport");
    let after = engine.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(engine.phase(), Phase::Ready);
    assert!(engine.view().last_error.unwrap().contains("503"));
}

#[tokio::test]
async fn test_refresh_failure_from_empty_stays_empty() {
    let (engine, _) = engine_with(FakeMonitor::with_feeds(vec![Err(
        MonitorError::MalformedResponse("missing `summary`".into()),
    )]));

    let err = engine.refresh().await.unwrap_err();

    assert_eq!(err.kind(), "malformed_response");
    assert_eq!(engine.phase(), Phase::Empty);
}

#[tokio::test]
async fn test_successful_refresh_clears_last_error() {
    let (engine, _) = engine_with(FakeMonitor::with_feeds(vec![
        Err(MonitorError::transport(None, "connection refused")),
        Ok(snapshot(vec![row("a", Some(200), Some(100))])),
    ]));

    assert!(engine.refresh().await.is_err());
    assert!(engine.view().last_error.is_some());

    engine.refresh().await.unwrap();
    assert!(engine.view().last_error.is_none());
}

#[tokio::test]
async fn test_refresh_unauthenticated_never_calls_backend() {
    let (engine, fake) = engine_for(FakeMonitor::default(), SessionContext::anonymous());

    let err = engine.refresh().await.unwrap_err();

    assert!(err.requires_login());
    assert_eq!(fake.fetch_calls(), 0);
    assert!(!engine.is_loading());
}

#[tokio::test]
async fn test_concurrent_refresh_is_single_flight() {
    let gate = Arc::new(Notify::new());
    let fake = FakeMonitor {
        fetch_gate: Some(gate.clone()),
        ..FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row("a", Some(200), Some(100))]))])
    };
    let (engine, fake) = engine_with(fake);

    let first = tokio::spawn({
        let engine = engine.clone();
        async move { engine.refresh().await }
    });
    wait_for(|| fake.fetch_calls() == 1).await;
    assert_eq!(engine.phase(), Phase::Loading);

    let second = engine.refresh().await.unwrap();
    assert_eq!(second, RefreshOutcome::AlreadyInFlight);

    gate.notify_one();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first, RefreshOutcome::Replaced { endpoints: 1 });
    assert_eq!(fake.fetch_calls(), 1);
    assert_eq!(engine.phase(), Phase::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_flight_holds_across_worker_threads() {
    let fake = FakeMonitor {
        fallback_feed: Some(snapshot(vec![row("a", Some(200), Some(100))])),
        ..Default::default()
    };
    let (engine, fake) = engine_with(fake);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move {
                for _ in 0..2_000 {
                    engine.refresh().await.unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    assert!(fake.fetch_calls() > 0);
    assert_eq!(fake.max_in_flight(), 1);
    assert!(!engine.is_loading());
}

#[test]
fn test_settled_guard_leaves_a_later_claim_alone() {
    let (view, _) = watch::channel(EngineView {
        loading: true,
        ..Default::default()
    });

    LoadingGuard::new(&view).settle(|v| v.last_error = Some("boom".into()));
    assert!(!view.borrow().loading);

    // A second refresh claims the flag; only its own guard may release it
    view.send_modify(|v| v.loading = true);
    let second = LoadingGuard::new(&view);
    assert!(view.borrow().loading);
    drop(second);
    assert!(!view.borrow().loading);
    assert_eq!(view.borrow().last_error.as_deref(), Some("boom"));
}

#[tokio::test]
async fn test_dropped_refresh_releases_loading_flag() {
    let gate = Arc::new(Notify::new());
    let fake = FakeMonitor {
        fetch_gate: Some(gate),
        ..Default::default()
    };
    let (engine, _) = engine_with(fake);

    let timed_out = tokio::time::timeout(Duration::from_millis(20), engine.refresh()).await;

    assert!(timed_out.is_err());
    assert!(!engine.is_loading());
}

#[tokio::test]
async fn test_subscribers_see_replacement() {
    let (engine, _) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row(
        "a",
        Some(200),
        Some(100),
    )]))]));
    let mut rx = engine.subscribe();

    engine.refresh().await.unwrap();

    rx.changed().await.unwrap();
    let view = rx.borrow_and_update().clone();
    assert_eq!(view.phase(), Phase::Ready);
    assert_eq!(view.snapshot.unwrap().endpoints.len(), 1);
}

#[tokio::test]
async fn test_refresh_applies_engine_policy() {
    let mut mislabelled = row("a", Some(503), Some(20));
    mislabelled.derived_status = DerivedStatus::Online;
    let fake = FakeMonitor::with_feeds(vec![Ok(snapshot(vec![mislabelled]))]);
    let fake = Arc::new(fake);
    let engine = SnapshotEngine::new(
        fake,
        user_session(),
        ParameterSet::default(),
        StatusPolicy {
            slow_threshold_ms: 10,
        },
    );

    engine.refresh().await.unwrap();

    let current = engine.snapshot().unwrap();
    assert_eq!(
        current.endpoints.get("a").unwrap().derived_status,
        DerivedStatus::Offline
    );
}

// ============================================================================
// Test-now
// ============================================================================

fn sampled_row(key: &str) -> MonitoredEndpoint {
    let mut endpoint = row(key, Some(200), Some(150));
    endpoint.recent_samples = SampleWindow::from_samples((0..5i64).map(|i| Sample {
        timestamp: chrono::Utc::now() - chrono::Duration::minutes(5 * i),
        response_time_ms: Some(100 + i as u64),
        status_code: Some(200),
    }));
    endpoint.last_response_body = ResponseBody::Json(serde_json::json!({"data": {"ok": true}}));
    endpoint
}

#[tokio::test]
async fn test_one_patches_only_the_target_row() {
    let feed = snapshot(vec![
        row("ping", Some(200), Some(120)),
        sampled_row("other"),
        sampled_row("third"),
    ]);
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(feed)]));
    engine.refresh().await.unwrap();
    let before = engine.snapshot().unwrap();

    fake.set_row("ping", Ok(row("ping", Some(500), Some(40))));
    let updated = engine.test_one("ping").await.unwrap();

    assert_eq!(updated.status_code, Some(500));
    assert_eq!(updated.derived_status, DerivedStatus::Offline);

    let after = engine.snapshot().unwrap();
    let patched = after.endpoints.get("ping").unwrap();
    assert_eq!(patched.status_code, Some(500));
    assert_eq!(patched.derived_status, DerivedStatus::Offline);

    // Siblings and summary untouched
    assert_eq!(after.endpoints.get("other"), before.endpoints.get("other"));
    assert_eq!(after.endpoints.get("third"), before.endpoints.get("third"));
    assert_eq!(after.summary, before.summary);
    assert_eq!(after.summary.healthy_apis, 3);
    assert_eq!(after.fetched_at, before.fetched_at);
    assert_eq!(after.endpoints.keys().collect::<Vec<_>>(), vec!["ping", "other", "third"]);
}

#[tokio::test]
async fn test_one_leaves_earlier_readers_untouched() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row(
        "ping",
        Some(200),
        Some(120),
    )]))]));
    engine.refresh().await.unwrap();
    let held = engine.snapshot().unwrap();

    fake.set_row("ping", Ok(row("ping", Some(500), Some(40))));
    engine.test_one("ping").await.unwrap();

    assert_eq!(held.endpoints.get("ping").unwrap().status_code, Some(200));
    assert_eq!(
        engine.snapshot().unwrap().endpoints.get("ping").unwrap().status_code,
        Some(500)
    );
}

#[tokio::test]
async fn test_one_unknown_key_is_consistency_error() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row(
        "a",
        Some(200),
        Some(100),
    )]))]));
    engine.refresh().await.unwrap();

    let err = engine.test_one("ghost").await.unwrap_err();

    assert_eq!(
        err,
        EngineError::Consistency {
            key: "ghost".to_string()
        }
    );
    assert_eq!(fake.test_calls(), 0);
    assert_eq!(engine.snapshot().unwrap().endpoints.len(), 1);
}

#[tokio::test]
async fn test_one_without_snapshot() {
    let (engine, fake) = engine_with(FakeMonitor::default());

    let err = engine.test_one("a").await.unwrap_err();

    assert!(matches!(err, EngineError::NoSnapshot { ref key } if key == "a"));
    assert!(err.is_consistency());
    assert_eq!(fake.test_calls(), 0);
}

#[tokio::test]
async fn test_one_failure_leaves_row_and_surfaces_error() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![
        row("a", Some(200), Some(100)),
        row("b", Some(200), Some(100)),
    ]))]));
    engine.refresh().await.unwrap();
    let before = engine.snapshot().unwrap();

    fake.set_row("a", Err(MonitorError::transport(Some(500), "boom")));
    let err = engine.test_one("a").await.unwrap_err();

    assert!(matches!(
        err,
        EngineError::Client(MonitorError::Transport {
            status: Some(500),
            ..
        })
    ));
    let after = engine.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(engine.phase(), Phase::Ready);
    assert!(engine.view().last_error.unwrap().starts_with("a: "));
}

#[tokio::test]
async fn test_one_rejects_mismatched_key() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![
        row("a", Some(200), Some(100)),
        row("b", Some(200), Some(100)),
    ]))]));
    engine.refresh().await.unwrap();

    fake.set_row("a", Ok(row("b", Some(500), None)));
    let err = engine.test_one("a").await.unwrap_err();

    assert_eq!(err.kind(), "malformed_response");
    let current = engine.snapshot().unwrap();
    assert_eq!(current.endpoints.get("b").unwrap().status_code, Some(200));
}

#[tokio::test]
async fn test_one_applies_engine_policy() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row(
        "a",
        Some(200),
        Some(100),
    )]))]));
    engine.refresh().await.unwrap();

    let mut slow = row("a", Some(200), Some(1200));
    slow.derived_status = DerivedStatus::Online;
    fake.set_row("a", Ok(slow));

    let updated = engine.test_one("a").await.unwrap();
    assert_eq!(updated.derived_status, DerivedStatus::Slow);
}

#[tokio::test]
async fn test_one_result_dropped_when_refresh_removed_key() {
    let gate = Arc::new(Notify::new());
    let fake = FakeMonitor {
        test_gate: Some(gate.clone()),
        ..FakeMonitor::with_feeds(vec![Ok(snapshot(vec![
            row("a", Some(200), Some(100)),
            row("b", Some(200), Some(100)),
        ]))])
    };
    let (engine, fake) = engine_with(fake);
    engine.refresh().await.unwrap();
    fake.set_row("b", Ok(row("b", Some(500), None)));

    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.test_one("b").await }
    });
    wait_for(|| fake.test_calls() == 1).await;

    // A full refresh lands first and drops `b` from the registry
    fake.queue_feed(Ok(snapshot(vec![row("a", Some(200), Some(100))])));
    engine.refresh().await.unwrap();
    gate.notify_one();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        EngineError::Consistency {
            key: "b".to_string()
        }
    );
    assert_eq!(engine.snapshot().unwrap().endpoints.len(), 1);
}

#[tokio::test]
async fn test_later_full_refresh_overwrites_patch() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![
        Ok(snapshot(vec![row("a", Some(200), Some(100))])),
        Ok(snapshot(vec![row("a", Some(200), Some(90))])),
    ]));
    engine.refresh().await.unwrap();
    fake.set_row("a", Ok(row("a", Some(500), None)));
    engine.test_one("a").await.unwrap();

    engine.refresh().await.unwrap();

    let current = engine.snapshot().unwrap();
    assert_eq!(current.endpoints.get("a").unwrap().status_code, Some(200));
    assert_eq!(current.endpoints.get("a").unwrap().response_time_ms, Some(90));
}

// ============================================================================
// Auto-refresh
// ============================================================================

#[tokio::test]
async fn test_auto_refresh_first_tick_is_immediate() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row(
        "a",
        Some(200),
        Some(100),
    )]))]));

    engine.start_auto_refresh(Duration::from_secs(3600));
    wait_for(|| engine.phase() == Phase::Ready).await;

    assert_eq!(fake.fetch_calls(), 1);
    assert!(engine.is_auto_refreshing());

    let handle = engine.stop_auto_refresh().unwrap();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(!engine.is_auto_refreshing());
}

#[tokio::test]
async fn test_auto_refresh_repeats_on_interval() {
    let fake = FakeMonitor::default();
    for _ in 0..10 {
        fake.queue_feed(Ok(snapshot(vec![row("a", Some(200), Some(100))])));
    }
    let (engine, fake) = engine_with(fake);

    engine.start_auto_refresh(Duration::from_millis(20));
    wait_for(|| fake.fetch_calls() >= 3).await;

    engine.stop_auto_refresh().unwrap().await.unwrap();
}

#[tokio::test]
async fn test_restart_replaces_schedule() {
    let fake = FakeMonitor::default();
    for _ in 0..4 {
        fake.queue_feed(Ok(snapshot(vec![row("a", Some(200), Some(100))])));
    }
    let (engine, fake) = engine_with(fake);

    engine.start_auto_refresh(Duration::from_secs(3600));
    wait_for(|| fake.fetch_calls() == 1 && engine.phase() == Phase::Ready).await;
    engine.start_auto_refresh(Duration::from_secs(3600));
    wait_for(|| fake.fetch_calls() == 2).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fake.fetch_calls(), 2);

    engine.stop_auto_refresh().unwrap().await.unwrap();
    assert!(engine.stop_auto_refresh().is_none());
}

#[tokio::test]
async fn test_stop_lets_in_flight_refresh_apply() {
    let gate = Arc::new(Notify::new());
    let fake = FakeMonitor {
        fetch_gate: Some(gate.clone()),
        ..FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row("a", Some(200), Some(100))]))])
    };
    let (engine, fake) = engine_with(fake);

    engine.start_auto_refresh(Duration::from_secs(3600));
    wait_for(|| fake.fetch_calls() == 1).await;

    let handle = engine.stop_auto_refresh().unwrap();
    gate.notify_one();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(engine.phase(), Phase::Ready);
}

// ============================================================================
// Sign-out
// ============================================================================

#[tokio::test]
async fn test_sign_out_discards_snapshot() {
    let (engine, fake) = engine_with(FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row(
        "a",
        Some(200),
        Some(100),
    )]))]));
    engine.refresh().await.unwrap();
    engine.start_auto_refresh(Duration::from_secs(3600));
    // The immediate tick finds no queued feed and fails quickly
    wait_for(|| fake.fetch_calls() == 2 && !engine.is_loading()).await;

    engine.sign_out();

    assert_eq!(engine.phase(), Phase::Empty);
    assert!(!engine.is_auto_refreshing());
    assert!(!engine.session().is_authenticated());

    let err = engine.refresh().await.unwrap_err();
    assert!(err.requires_login());
    assert_eq!(fake.fetch_calls(), 2);
}

#[tokio::test]
async fn test_sign_out_during_refresh_drops_result() {
    let gate = Arc::new(Notify::new());
    let fake = FakeMonitor {
        fetch_gate: Some(gate.clone()),
        ..FakeMonitor::with_feeds(vec![Ok(snapshot(vec![row("a", Some(200), Some(100))]))])
    };
    let (engine, fake) = engine_with(fake);

    let pending = tokio::spawn({
        let engine = engine.clone();
        async move { engine.refresh().await }
    });
    wait_for(|| fake.fetch_calls() == 1).await;

    engine.sign_out();
    gate.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), RefreshOutcome::Discarded);
    assert_eq!(engine.phase(), Phase::Empty);
}

#[tokio::test]
async fn test_set_params_used_for_next_request() {
    let (engine, _) = engine_with(FakeMonitor::default());
    let mut params = ParameterSet::default();
    params.match_key = "a-rz--cricket--other".to_string();

    engine.set_params(params.clone());

    assert_eq!(engine.params(), params);
}
