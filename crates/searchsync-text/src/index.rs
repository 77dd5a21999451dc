use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tantivy::directory::MmapDirectory;
use tantivy::schema::Field;
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

use searchsync_core::traits::IndexEngine;
use searchsync_core::types::{DocumentRecord, IndexBatch, SyncTask, TaskStatus};
use searchsync_core::EngineError;

use crate::tantivy_utils::{build_schema, register_tokenizer, searchable_text, ID_FIELD, SOURCE_FIELD, TEXT_FIELD};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub(crate) fn local_err(e: impl std::fmt::Display) -> EngineError {
	EngineError::Local(e.to_string())
}

/// One named tantivy index: documents keyed by id, searchable text, stored JSON source.
pub(crate) struct LocalIndex {
	pub(crate) index: Index,
	pub(crate) reader: IndexReader,
	// opened on first write so read-only handles never take the directory lock
	writer: Mutex<Option<IndexWriter>>,
	id_field: Field,
	pub(crate) text_field: Field,
	pub(crate) source_field: Field,
}

impl LocalIndex {
	fn open(index: Index) -> Result<Self, EngineError> {
		register_tokenizer(&index);
		let schema = index.schema();
		let id_field = schema.get_field(ID_FIELD).map_err(local_err)?;
		let text_field = schema.get_field(TEXT_FIELD).map_err(local_err)?;
		let source_field = schema.get_field(SOURCE_FIELD).map_err(local_err)?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into().map_err(local_err)?;
		Ok(Self { index, reader, writer: Mutex::new(None), id_field, text_field, source_field })
	}

	/// Insert or replace every document of the batch, then commit. Returns the commit opstamp.
	fn upsert(&self, docs: &[DocumentRecord]) -> Result<u64, EngineError> {
		let mut guard = self.writer.lock().map_err(|_| EngineError::Local("index writer poisoned".to_string()))?;
		if guard.is_none() {
			let writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES).map_err(local_err)?;
			*guard = Some(writer);
		}
		let writer = guard.as_mut().ok_or_else(|| EngineError::Local("index writer unavailable".to_string()))?;
		for record in docs {
			let id = record.id_string();
			let source = serde_json::to_string(record).map_err(local_err)?;
			let text = searchable_text(&serde_json::Value::Object(record.fields().clone()));
			writer.delete_term(Term::from_field_text(self.id_field, &id));
			writer
				.add_document(doc!(
					self.id_field => id,
					self.text_field => text,
					self.source_field => source,
				))
				.map_err(local_err)?;
		}
		let opstamp = writer.commit().map_err(local_err)?;
		self.reader.reload().map_err(local_err)?;
		Ok(opstamp)
	}
}

/// Embedded engine for offline use and tests: one tantivy index per index name,
/// kept in RAM or under a root directory.
pub struct TantivyEngine {
	root: Option<PathBuf>,
	indexes: Mutex<HashMap<String, Arc<LocalIndex>>>,
}

impl TantivyEngine {
	pub fn open(root: &Path) -> Result<Self, EngineError> {
		std::fs::create_dir_all(root).map_err(local_err)?;
		Ok(Self { root: Some(root.to_path_buf()), indexes: Mutex::new(HashMap::new()) })
	}

	pub fn in_memory() -> Self {
		Self { root: None, indexes: Mutex::new(HashMap::new()) }
	}

	/// Look up an index, opening it from disk or creating it when `create` is set.
	pub(crate) fn local_index(&self, name: &str, create: bool) -> Result<Option<Arc<LocalIndex>>, EngineError> {
		validate_index_name(name)?;
		let mut indexes = self.indexes.lock().map_err(|_| EngineError::Local("index registry poisoned".to_string()))?;
		if let Some(existing) = indexes.get(name) {
			return Ok(Some(existing.clone()));
		}
		let index = match &self.root {
			Some(root) => {
				let dir = root.join(name);
				if !dir.exists() && !create {
					return Ok(None);
				}
				std::fs::create_dir_all(&dir).map_err(local_err)?;
				let directory = MmapDirectory::open(&dir).map_err(local_err)?;
				Index::open_or_create(directory, build_schema()).map_err(local_err)?
			}
			None if create => Index::create_in_ram(build_schema()),
			None => return Ok(None),
		};
		let local = Arc::new(LocalIndex::open(index)?);
		indexes.insert(name.to_string(), local.clone());
		Ok(Some(local))
	}
}

fn validate_index_name(name: &str) -> Result<(), EngineError> {
	let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
	if valid {
		Ok(())
	} else {
		Err(EngineError::Local(format!("invalid index name '{}'", name)))
	}
}

/// Stored sources are read back as hits keyed by an integer id, so nothing else may be written.
fn check_ids(index: &str, batches: &[IndexBatch<'_>]) -> Result<(), EngineError> {
	let bad = batches.iter().flat_map(|b| b.documents()).find(|doc| doc.id().as_i64().is_none());
	match bad {
		Some(doc) => Err(EngineError::Local(format!("index '{}': document id {} is not an integer", index, doc.id()))),
		None => Ok(()),
	}
}

#[async_trait]
impl IndexEngine for TantivyEngine {
	async fn submit_batches(&self, index: &str, batches: &[IndexBatch<'_>]) -> Result<Vec<SyncTask>, EngineError> {
		check_ids(index, batches)?;
		let local = self
			.local_index(index, true)?
			.ok_or_else(|| EngineError::Local(format!("index '{}' could not be created", index)))?;
		let mut tasks = Vec::with_capacity(batches.len());
		for batch in batches {
			let writer = local.clone();
			let docs = batch.documents().to_vec();
			// commit and reload do blocking disk I/O
			let opstamp = tokio::task::spawn_blocking(move || writer.upsert(&docs)).await.map_err(local_err)??;
			tracing::debug!(index, seq = batch.seq, documents = batch.len(), opstamp, "committed local batch");
			tasks.push(SyncTask {
				task_uid: opstamp,
				index_uid: Some(index.to_string()),
				status: TaskStatus::Succeeded,
				kind: "documentAdditionOrUpdate".to_string(),
				enqueued_at: None,
			});
		}
		Ok(tasks)
	}
}
