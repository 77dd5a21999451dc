//! searchsync-text
//!
//! Tantivy-backed local engine. Implements the same write (`IndexEngine`) and
//! paged read (`PageSource`) contracts as the live engine so the pipeline can
//! run offline.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyEngine;
