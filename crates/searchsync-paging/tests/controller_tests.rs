use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::time::Instant;

use searchsync_core::traits::PageSource;
use searchsync_core::types::{EntityId, HiddenPreferenceSet, Page, PreferenceSnapshot, SearchHit, SearchQuery};
use searchsync_core::{EngineError, FetchError};
use searchsync_paging::{HitListView, HitPaginationController, LoadOutcome, LoadReport, PaginationConfig, Phase};

/// Serves fixed pages of ids; pages listed in `fail_once` error on their first request.
struct ScriptedSource {
    pages: Vec<Vec<EntityId>>,
    fail_once: Mutex<HashSet<usize>>,
    latency: Option<Duration>,
    fetches: AtomicUsize,
}

impl ScriptedSource {
    fn new(pages: Vec<Vec<EntityId>>) -> Self {
        Self { pages, fail_once: Mutex::new(HashSet::new()), latency: None, fetches: AtomicUsize::new(0) }
    }

    fn failing_once(self, page: usize) -> Self {
        self.fail_once.lock().unwrap().insert(page);
        self
    }

    fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageSource for ScriptedSource {
    async fn fetch_page(&self, _query: &SearchQuery, page: usize) -> Result<Page, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.fail_once.lock().unwrap().remove(&page) {
            return Err(EngineError::Status { status: 502, message: "bad gateway".to_string() }.into());
        }
        let ids = self.pages.get(page).cloned().unwrap_or_default();
        Ok(Page {
            hits: ids.into_iter().map(|id| SearchHit::new(id).owned_by(id % 3)).collect(),
            is_last_page: page + 1 >= self.pages.len(),
        })
    }
}

fn five_pages() -> Vec<Vec<EntityId>> {
    (0..5).map(|p| (p * 10 + 1..=p * 10 + 10).collect()).collect()
}

fn controller(source: &Arc<ScriptedSource>, config: PaginationConfig) -> HitPaginationController<Arc<ScriptedSource>> {
    HitPaginationController::new(source.clone(), SearchQuery::new("models", "", 10), config)
}

fn ids(hits: &[SearchHit]) -> Vec<EntityId> {
    hits.iter().map(|h| h.id).collect()
}

fn report(outcome: LoadOutcome) -> LoadReport {
    match outcome {
        LoadOutcome::Fetched(report) => report,
        LoadOutcome::NoOp { phase } => panic!("expected a fetch, got no-op in {phase:?}"),
    }
}

#[tokio::test]
async fn target_on_third_page_is_found_by_one_call() {
    let source = Arc::new(ScriptedSource::new(five_pages()));
    let mut paging = controller(&source, PaginationConfig::default());
    paging.set_target(25);

    let report = report(paging.load_more().await);

    assert_eq!(source.fetches(), 3);
    assert_eq!(report.pages_fetched, 3);
    assert!(report.target_found);
    assert_eq!(report.phase, Phase::Idle);
    assert_eq!(paging.hits().len(), 30);
}

#[tokio::test]
async fn target_already_loaded_does_not_fetch_ahead() {
    let source = Arc::new(ScriptedSource::new(five_pages()));
    let mut paging = controller(&source, PaginationConfig::default());
    report(paging.load_more().await);
    paging.set_target(4);

    let report = report(paging.load_more().await);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(source.fetches(), 2);

    paging.clear_target();
    assert_eq!(paging.target(), None);
}

#[tokio::test]
async fn missing_target_stops_at_the_last_page() {
    let source = Arc::new(ScriptedSource::new(five_pages()));
    let mut paging = controller(&source, PaginationConfig::default());
    paging.set_target(999);

    let report = report(paging.load_more().await);
    assert_eq!(report.pages_fetched, 5);
    assert!(!report.target_found);
    assert_eq!(report.phase, Phase::Exhausted);
}

#[tokio::test]
async fn seek_is_bounded_by_max_seek_pages() {
    let source = Arc::new(ScriptedSource::new(five_pages()));
    let config = PaginationConfig { max_seek_pages: Some(2), ..Default::default() };
    let mut paging = controller(&source, config);
    paging.set_target(35);

    let first = report(paging.load_more().await);
    assert_eq!(first.pages_fetched, 2);
    assert!(!first.target_found);
    assert_eq!(paging.phase(), Phase::Idle);

    let second = report(paging.load_more().await);
    assert_eq!(second.pages_fetched, 2);
    assert!(second.target_found);
    assert_eq!(source.fetches(), 4);
}

#[tokio::test]
async fn overlapping_pages_keep_first_seen_position() {
    let source = Arc::new(ScriptedSource::new(vec![vec![1, 2, 3], vec![3, 4, 1, 5]]));
    let mut paging = controller(&source, PaginationConfig::default());

    report(paging.load_more().await);
    let second = report(paging.load_more().await);

    assert_eq!(second.new_hits, 2);
    assert_eq!(second.duplicates, 2);
    assert_eq!(ids(paging.hits()), vec![1, 2, 3, 4, 5]);
    assert_eq!(paging.phase(), Phase::Exhausted);
}

#[tokio::test]
async fn exhausted_session_ignores_load_more() {
    let source = Arc::new(ScriptedSource::new(vec![vec![1], vec![2]]));
    let mut paging = controller(&source, PaginationConfig::default());
    report(paging.load_more().await);
    report(paging.load_more().await);

    assert_eq!(paging.load_more().await, LoadOutcome::NoOp { phase: Phase::Exhausted });
    assert_eq!(paging.retry().await, LoadOutcome::NoOp { phase: Phase::Exhausted });
    assert_eq!(source.fetches(), 2);
    assert_eq!(paging.pages_loaded(), 2);
}

#[tokio::test]
async fn stalled_session_waits_for_explicit_retry() {
    let source = Arc::new(ScriptedSource::new(five_pages()).failing_once(1));
    let mut paging = controller(&source, PaginationConfig::default());
    paging.set_target(15);

    let first = report(paging.load_more().await);
    assert_eq!(first.pages_fetched, 1);
    assert_eq!(first.phase, Phase::Stalled);
    assert!(matches!(paging.last_error(), Some(FetchError::Engine(EngineError::Status { status: 502, .. }))));

    assert_eq!(paging.load_more().await, LoadOutcome::NoOp { phase: Phase::Stalled });
    assert_eq!(source.fetches(), 2, "no automatic retry");

    let resumed = report(paging.retry().await);
    assert!(resumed.target_found);
    assert_eq!(resumed.phase, Phase::Idle);
    assert!(paging.last_error().is_none());
    assert_eq!(ids(paging.hits())[10], 11, "the failed page is fetched again, not skipped");
}

#[tokio::test(start_paused = true)]
async fn slow_fetch_stalls_the_session() {
    let source = Arc::new(ScriptedSource::new(five_pages()).with_latency(Duration::from_secs(30)));
    let config = PaginationConfig { fetch_timeout: Some(Duration::from_secs(5)), ..Default::default() };
    let mut paging = controller(&source, config);

    let report = report(paging.load_more().await);
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(paging.phase(), Phase::Stalled);
    assert!(matches!(paging.last_error(), Some(FetchError::Stalled(d)) if *d == Duration::from_secs(5)));
    assert_eq!(paging.view(&PreferenceSnapshot::default(), None, Instant::now()), HitListView::Stalled);
}

#[tokio::test(start_paused = true)]
async fn empty_result_waits_out_the_grace_delay() {
    let source = Arc::new(ScriptedSource::new(vec![vec![]]));
    let mut paging = controller(&source, PaginationConfig::default());
    let prefs = PreferenceSnapshot::default();

    assert_eq!(paging.view(&prefs, None, Instant::now()), HitListView::Loading, "nothing loaded yet");
    assert_eq!(paging.no_results_deadline(), None);

    report(paging.load_more().await);
    assert_eq!(paging.phase(), Phase::Exhausted);
    let deadline = paging.no_results_deadline().expect("settled");
    assert_eq!(deadline, Instant::now() + Duration::from_millis(150));

    tokio::time::advance(Duration::from_millis(100)).await;
    assert_eq!(paging.view(&prefs, None, Instant::now()), HitListView::Loading);

    tokio::time::sleep_until(deadline).await;
    assert_eq!(paging.view(&prefs, None, Instant::now()), HitListView::NoResults { hidden_count: 0 });
}

#[tokio::test]
async fn grace_delay_is_tunable() {
    let source = Arc::new(ScriptedSource::new(vec![vec![]]));
    let config = PaginationConfig { no_results_grace: Duration::ZERO, ..Default::default() };
    let mut paging = controller(&source, config);
    report(paging.load_more().await);

    let now = paging.no_results_deadline().expect("settled");
    assert_eq!(paging.view(&PreferenceSnapshot::default(), None, now), HitListView::NoResults { hidden_count: 0 });
}

#[tokio::test]
async fn view_filters_hidden_hits() {
    let source = Arc::new(ScriptedSource::new(vec![vec![1, 2, 3, 4, 5, 6], vec![7]]));
    let mut paging = controller(&source, PaginationConfig::default());
    report(paging.load_more().await);

    let hidden: HiddenPreferenceSet = serde_json::from_value(json!({ "models": [2], "users": [1] })).expect("prefs");
    let snapshot = PreferenceSnapshot::ready(hidden);

    // owners are id % 3: user 1 owns 1 and 4
    match paging.view(&snapshot, None, Instant::now()) {
        HitListView::Results { visible, hidden_count, has_more, stalled } => {
            assert_eq!(ids(&visible), vec![3, 5, 6]);
            assert_eq!(hidden_count, 3);
            assert!(has_more);
            assert!(!stalled);
        }
        other => panic!("unexpected view {other:?}"),
    }

    // the viewer's own hits stay visible
    match paging.view(&snapshot, Some(1), Instant::now()) {
        HitListView::Results { visible, hidden_count, .. } => {
            assert_eq!(ids(&visible), vec![1, 3, 4, 5, 6]);
            assert_eq!(hidden_count, 1);
        }
        other => panic!("unexpected view {other:?}"),
    }

    assert_eq!(paging.view(&PreferenceSnapshot::loading(), None, Instant::now()), HitListView::Loading);
    assert_eq!(paging.hits().len(), 6, "filtering never touches the accumulated list");
}

#[tokio::test]
async fn failed_follow_up_page_is_flagged_in_results() {
    let source = Arc::new(ScriptedSource::new(five_pages()).failing_once(1));
    let mut paging = controller(&source, PaginationConfig::default());
    report(paging.load_more().await);
    report(paging.load_more().await);

    match paging.view(&PreferenceSnapshot::default(), None, Instant::now()) {
        HitListView::Results { visible, has_more, stalled, .. } => {
            assert_eq!(visible.len(), 10);
            assert!(!has_more);
            assert!(stalled);
        }
        other => panic!("unexpected view {other:?}"),
    }
}

#[tokio::test]
async fn restart_begins_a_fresh_session() {
    let source = Arc::new(ScriptedSource::new(five_pages()));
    let mut paging = controller(&source, PaginationConfig::default());
    paging.set_target(12);
    report(paging.load_more().await);
    assert_eq!(paging.pages_loaded(), 2);

    paging.restart(SearchQuery::new("models", "forge", 10));
    assert_eq!(paging.phase(), Phase::Idle);
    assert!(paging.hits().is_empty());
    assert_eq!(paging.target(), None);
    assert_eq!(paging.query().text, "forge");

    let report = report(paging.load_more().await);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(ids(paging.hits())[0], 1);
}

#[tokio::test]
async fn fully_hidden_session_reports_how_many_were_hidden() {
    let source = Arc::new(ScriptedSource::new(vec![vec![1, 4], vec![7]]));
    let mut paging = controller(&source, PaginationConfig::default());
    // owners are id % 3, so user 1 owns every hit
    let snapshot = PreferenceSnapshot::ready(serde_json::from_value(json!({ "users": [1] })).expect("prefs"));

    report(paging.load_more().await);
    match paging.view(&snapshot, None, Instant::now()) {
        HitListView::Results { visible, hidden_count, has_more, .. } => {
            assert!(visible.is_empty());
            assert_eq!(hidden_count, 2);
            assert!(has_more, "later pages may still hold visible hits");
        }
        other => panic!("unexpected view {other:?}"),
    }

    report(paging.load_more().await);
    assert_eq!(paging.phase(), Phase::Exhausted);
    assert_eq!(paging.view(&snapshot, None, Instant::now()), HitListView::NoResults { hidden_count: 3 });
    assert!(matches!(paging.view(&snapshot, Some(1), Instant::now()), HitListView::Results { .. }));
}
