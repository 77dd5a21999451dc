use tokio::time::Instant;

use searchsync_core::traits::PageSource;
use searchsync_core::types::{EntityId, PreferenceSnapshot, SearchHit};
use searchsync_core::filter_hits;

use crate::controller::{HitPaginationController, Phase};

/// What a hit list screen should render right now.
#[derive(Debug, Clone, PartialEq)]
pub enum HitListView {
    Loading,
    /// The first page failed; offer a retry.
    Stalled,
    /// Nothing to show: the session found no hits, or hid all of them.
    NoResults { hidden_count: usize },
    Results {
        visible: Vec<SearchHit>,
        hidden_count: usize,
        /// Another page can be requested with `load_more`.
        has_more: bool,
        /// A follow-up page failed.
        stalled: bool,
    },
}

impl<S: PageSource> HitPaginationController<S> {
    pub fn view(&self, preferences: &PreferenceSnapshot, current_user: Option<EntityId>, now: Instant) -> HitListView {
        if self.state.hits.is_empty() {
            return match self.state.phase {
                Phase::Loading => HitListView::Loading,
                Phase::Stalled => HitListView::Stalled,
                Phase::Idle | Phase::Exhausted => match self.no_results_deadline() {
                    Some(deadline) if now >= deadline => HitListView::NoResults { hidden_count: 0 },
                    // nothing settled yet, or still inside the grace window
                    _ => HitListView::Loading,
                },
            };
        }

        if preferences.is_loading {
            return HitListView::Loading;
        }

        let filtered = filter_hits(&self.state.hits, &preferences.hidden, current_user);
        // every hit of a finished session is hidden
        if filtered.visible.is_empty() && self.state.phase == Phase::Exhausted {
            return HitListView::NoResults { hidden_count: filtered.hidden_count };
        }

        HitListView::Results {
            visible: filtered.visible,
            hidden_count: filtered.hidden_count,
            has_more: self.state.phase == Phase::Idle,
            stalled: self.state.phase == Phase::Stalled,
        }
    }
}
