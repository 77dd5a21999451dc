//! Fixed-size batching of document submissions.

use std::num::NonZeroUsize;

use crate::error::{Error, Result};
use crate::types::{DocumentRecord, IndexBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentBatcher {
    batch_size: NonZeroUsize,
}

impl DocumentBatcher {
    pub const DEFAULT_BATCH_SIZE: usize = 1000;

    pub fn new(batch_size: usize) -> Result<Self> {
        NonZeroUsize::new(batch_size)
            .map(|batch_size| Self { batch_size })
            .ok_or_else(|| Error::InvalidArgument("batch size must be positive".to_string()))
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.get()
    }

    /// Lazily split `docs` into batches of `batch_size`, the last one possibly shorter.
    pub fn batches<'a>(&self, docs: &'a [DocumentRecord]) -> impl Iterator<Item = IndexBatch<'a>> + 'a {
        docs.chunks(self.batch_size.get()).enumerate().map(|(seq, chunk)| IndexBatch::new(seq, chunk))
    }

    pub fn batch_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size.get())
    }
}

impl Default for DocumentBatcher {
    fn default() -> Self {
        Self { batch_size: NonZeroUsize::new(Self::DEFAULT_BATCH_SIZE).unwrap_or(NonZeroUsize::MIN) }
    }
}
