//! Domain types shared by the write path (index sync) and the read path
//! (pagination and preference filtering).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{Error, Result};

/// Numeric identity of models, images, tags and users.
pub type EntityId = i64;

/// One indexable entity, stored as an opaque JSON object.
///
/// The only shape requirement is an `id` field; everything else is owned by
/// whoever produced the record and is forwarded to the engine untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct DocumentRecord {
    fields: Map<String, Value>,
}

impl DocumentRecord {
    pub const ID_FIELD: &'static str = "id";

    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Self::from_fields(fields),
            other => Err(Error::InvalidArgument(format!("document must be a JSON object, got {}", other))),
        }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Result<Self> {
        match fields.get(Self::ID_FIELD) {
            None | Some(Value::Null) => Err(Error::InvalidArgument("document is missing an 'id' field".to_string())),
            Some(_) => Ok(Self { fields }),
        }
    }

    pub fn id(&self) -> &Value {
        &self.fields[Self::ID_FIELD]
    }

    /// The id rendered as a plain string (`42`, `"abc"` -> `abc`).
    pub fn id_string(&self) -> String {
        match self.id() {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Value> for DocumentRecord {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(value)
    }
}

impl From<DocumentRecord> for Value {
    fn from(doc: DocumentRecord) -> Self {
        Value::Object(doc.fields)
    }
}

/// A contiguous run of documents carved out of a larger submission.
#[derive(Debug, Clone, Copy)]
pub struct IndexBatch<'a> {
    pub seq: usize,
    docs: &'a [DocumentRecord],
}

impl<'a> IndexBatch<'a> {
    pub(crate) fn new(seq: usize, docs: &'a [DocumentRecord]) -> Self {
        Self { seq, docs }
    }

    pub fn documents(&self) -> &'a [DocumentRecord] {
        self.docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Enqueued,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

/// Engine acknowledgement that one batch was accepted (not necessarily
/// indexed yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncTask {
    pub task_uid: u64,
    pub index_uid: Option<String>,
    pub status: TaskStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub enqueued_at: Option<String>,
}

/// A result record returned by a paged search.
///
/// `user_id`, `image_ids` and `tag_ids` are the category-tagged references
/// consulted by preference filtering; other stored fields ride along in
/// `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: EntityId,
    #[serde(default)]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub image_ids: Vec<EntityId>,
    #[serde(default)]
    pub tag_ids: Vec<EntityId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchHit {
    pub fn new(id: EntityId) -> Self {
        Self { id, user_id: None, image_ids: Vec::new(), tag_ids: Vec::new(), extra: Map::new() }
    }

    pub fn owned_by(mut self, user_id: EntityId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_images(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.image_ids.extend(ids);
        self
    }

    pub fn with_tags(mut self, ids: impl IntoIterator<Item = EntityId>) -> Self {
        self.tag_ids.extend(ids);
        self
    }
}

/// Per-user hidden entity ids, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HiddenPreferenceSet {
    pub models: HashSet<EntityId>,
    pub images: HashSet<EntityId>,
    pub tags: HashSet<EntityId>,
    pub users: HashSet<EntityId>,
}

impl HiddenPreferenceSet {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty() && self.images.is_empty() && self.tags.is_empty() && self.users.is_empty()
    }
}

/// What the preferences collaborator currently exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSnapshot {
    #[serde(flatten)]
    pub hidden: HiddenPreferenceSet,
    #[serde(default)]
    pub is_loading: bool,
}

impl PreferenceSnapshot {
    pub fn ready(hidden: HiddenPreferenceSet) -> Self {
        Self { hidden, is_loading: false }
    }

    pub fn loading() -> Self {
        Self { hidden: HiddenPreferenceSet::default(), is_loading: true }
    }
}

/// Parameters of one search session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub index: String,
    #[serde(default)]
    pub text: String,
    pub page_size: usize,
    #[serde(default)]
    pub sort: Vec<String>,
}

impl SearchQuery {
    pub fn new(index: impl Into<String>, text: impl Into<String>, page_size: usize) -> Self {
        Self { index: index.into(), text: text.into(), page_size, sort: Vec::new() }
    }

    /// Sort rules in engine syntax, most significant first (`"metrics.rating:desc"`).
    pub fn with_sort<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort = rules.into_iter().map(Into::into).collect();
        self
    }
}

/// One page of hits as delivered by the paged-search client.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub hits: Vec<SearchHit>,
    pub is_last_page: bool,
}
