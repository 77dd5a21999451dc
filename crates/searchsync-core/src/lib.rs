#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod batcher;
pub mod config;
pub mod error;
pub mod preferences;
pub mod traits;
pub mod types;

pub use batcher::DocumentBatcher;
pub use error::{EngineError, Error, FetchError, Result};
pub use preferences::{filter_hits, FilteredHits};
