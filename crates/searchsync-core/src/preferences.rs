//! Removal of hits the current user asked not to see.

use crate::types::{EntityId, HiddenPreferenceSet, SearchHit};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredHits {
    pub visible: Vec<SearchHit>,
    pub hidden_count: usize,
}

/// Whether `hit` is hidden by `hidden`, ignoring ownership.
pub fn is_hidden(hit: &SearchHit, hidden: &HiddenPreferenceSet) -> bool {
    hidden.models.contains(&hit.id)
        || hit.image_ids.iter().any(|id| hidden.images.contains(id))
        || hit.tag_ids.iter().any(|id| hidden.tags.contains(id))
        || hit.user_id.is_some_and(|id| hidden.users.contains(&id))
}

/// Drop hidden hits, keeping input order. A user's own hits are never dropped.
pub fn filter_hits(hits: &[SearchHit], hidden: &HiddenPreferenceSet, current_user_id: Option<EntityId>) -> FilteredHits {
    let visible: Vec<SearchHit> = hits
        .iter()
        .filter(|hit| {
            let own = current_user_id.is_some() && hit.user_id == current_user_id;
            own || !is_hidden(hit, hidden)
        })
        .cloned()
        .collect();
    let hidden_count = hits.len() - visible.len();
    FilteredHits { visible, hidden_count }
}
