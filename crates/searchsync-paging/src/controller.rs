use std::collections::HashSet;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use searchsync_core::config::PaginationSettings;
use searchsync_core::traits::PageSource;
use searchsync_core::types::{EntityId, Page, SearchHit, SearchQuery};
use searchsync_core::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    pub no_results_grace: Duration,
    /// A fetch running longer than this stalls the session.
    pub fetch_timeout: Option<Duration>,
    /// Upper bound on pages fetched by one `load_more` while seeking a target.
    pub max_seek_pages: Option<usize>,
}

impl PaginationConfig {
    pub const DEFAULT_NO_RESULTS_GRACE: Duration = Duration::from_millis(150);

    pub fn from_settings(settings: &PaginationSettings) -> Self {
        Self {
            no_results_grace: Duration::from_millis(settings.no_results_grace_ms),
            fetch_timeout: settings.fetch_timeout_ms.map(Duration::from_millis),
            max_seek_pages: settings.max_seek_pages,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { no_results_grace: Self::DEFAULT_NO_RESULTS_GRACE, fetch_timeout: None, max_seek_pages: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Stalled,
    Exhausted,
}

/// What one `load_more` (or `retry`) call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing fetched; the session was not idle.
    NoOp { phase: Phase },
    Fetched(LoadReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub pages_fetched: usize,
    pub new_hits: usize,
    /// Hits dropped because their id was already accumulated.
    pub duplicates: usize,
    pub target_found: bool,
    pub phase: Phase,
}

#[derive(Debug)]
pub(crate) struct PaginationState {
    pub(crate) next_page: usize,
    pub(crate) hits: Vec<SearchHit>,
    seen: HashSet<EntityId>,
    pub(crate) phase: Phase,
    target: Option<EntityId>,
    last_error: Option<FetchError>,
    pub(crate) settled_at: Option<Instant>,
}

impl PaginationState {
    fn new() -> Self {
        Self {
            next_page: 0,
            hits: Vec::new(),
            seen: HashSet::new(),
            phase: Phase::Idle,
            target: None,
            last_error: None,
            settled_at: None,
        }
    }

    /// Append unseen hits in page order. Returns (appended, duplicates).
    fn append(&mut self, page: Page) -> (usize, usize) {
        let mut appended = 0;
        let mut duplicates = 0;
        for hit in page.hits {
            if self.seen.insert(hit.id) {
                self.hits.push(hit);
                appended += 1;
            } else {
                duplicates += 1;
            }
        }
        (appended, duplicates)
    }

    fn target_found(&self) -> bool {
        self.target.is_some_and(|id| self.seen.contains(&id))
    }
}

/// Infinite-scroll state for one search session.
///
/// Every operation takes `&mut self`, so loads never overlap. A load whose
/// future is dropped mid-fetch leaves the phase at `Loading` and later calls
/// are no-ops; start a new session with [`restart`](Self::restart).
pub struct HitPaginationController<S: PageSource> {
    source: S,
    query: SearchQuery,
    pub(crate) config: PaginationConfig,
    pub(crate) state: PaginationState,
}

impl<S: PageSource> HitPaginationController<S> {
    pub fn new(source: S, query: SearchQuery, config: PaginationConfig) -> Self {
        Self { source, query, config, state: PaginationState::new() }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Accumulated hits, unfiltered, in first-seen order.
    pub fn hits(&self) -> &[SearchHit] {
        &self.state.hits
    }

    pub fn pages_loaded(&self) -> usize {
        self.state.next_page
    }

    pub fn target(&self) -> Option<EntityId> {
        self.state.target
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.state.last_error.as_ref()
    }

    /// Keep loading pages until a hit with this id has been accumulated.
    pub fn set_target(&mut self, id: EntityId) {
        self.state.target = Some(id);
    }

    pub fn clear_target(&mut self) {
        self.state.target = None;
    }

    /// Fetch the next page, then keep going while a target is set and still missing.
    pub async fn load_more(&mut self) -> LoadOutcome {
        if self.state.phase != Phase::Idle {
            return LoadOutcome::NoOp { phase: self.state.phase };
        }

        let mut report = LoadReport { pages_fetched: 0, new_hits: 0, duplicates: 0, target_found: false, phase: Phase::Idle };
        loop {
            self.state.phase = Phase::Loading;
            let page_no = self.state.next_page;
            match self.fetch(page_no).await {
                Ok(page) => {
                    let is_last = page.is_last_page;
                    let (appended, duplicates) = self.state.append(page);
                    report.pages_fetched += 1;
                    report.new_hits += appended;
                    report.duplicates += duplicates;
                    self.state.next_page += 1;
                    self.state.last_error = None;
                    self.state.phase = if is_last { Phase::Exhausted } else { Phase::Idle };
                    self.state.settled_at = Some(Instant::now());
                    debug!(index = %self.query.index, page = page_no, appended, duplicates, last = is_last, "page loaded");
                }
                Err(err) => {
                    warn!(index = %self.query.index, page = page_no, error = %err, "page fetch failed, session stalled");
                    self.state.last_error = Some(err);
                    self.state.phase = Phase::Stalled;
                    break;
                }
            }
            if !self.keep_seeking(report.pages_fetched) {
                break;
            }
        }

        report.target_found = self.state.target_found();
        report.phase = self.state.phase;
        LoadOutcome::Fetched(report)
    }

    /// Resume a stalled session from the page that failed.
    pub async fn retry(&mut self) -> LoadOutcome {
        if self.state.phase != Phase::Stalled {
            return LoadOutcome::NoOp { phase: self.state.phase };
        }
        self.state.phase = Phase::Idle;
        self.load_more().await
    }

    /// Drop the session and start over with a new query. The target is cleared too.
    pub fn restart(&mut self, query: SearchQuery) {
        self.query = query;
        self.state = PaginationState::new();
    }

    /// Earliest instant at which an empty session may be reported as having no results.
    pub fn no_results_deadline(&self) -> Option<Instant> {
        match self.state.phase {
            Phase::Idle | Phase::Exhausted if self.state.hits.is_empty() => {
                self.state.settled_at.map(|at| at + self.config.no_results_grace)
            }
            _ => None,
        }
    }

    fn keep_seeking(&self, pages_fetched: usize) -> bool {
        let Some(target) = self.state.target else {
            return false;
        };
        if self.state.phase != Phase::Idle || self.state.target_found() {
            return false;
        }
        if let Some(max) = self.config.max_seek_pages {
            if pages_fetched >= max {
                debug!(index = %self.query.index, target, pages_fetched, "target not found within seek bound");
                return false;
            }
        }
        true
    }

    async fn fetch(&self, page: usize) -> Result<Page, FetchError> {
        let request = self.source.fetch_page(&self.query, page);
        match self.config.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|_| FetchError::Stalled(limit))?,
            None => request.await,
        }
    }
}
