//! searchsync-paging
//!
//! Read path of the search pipeline: [`HitPaginationController`] accumulates
//! pages of hits for one search session and turns them into a [`HitListView`].
pub mod controller;
pub mod view;

pub use controller::{HitPaginationController, LoadOutcome, LoadReport, PaginationConfig, Phase};
pub use view::HitListView;
