use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// A stored record: a JSON object carrying its identifier under `_id`
pub type Document = Map<String, Value>;

/// Field name the identifier is exposed under
pub const ID_FIELD: &str = "_id";

/// Errors from a DocumentStore backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// The two collections the API works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Jobs,
    JobApplications,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Jobs, Collection::JobApplications];

    /// Public collection name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::JobApplications => "job-applications",
        }
    }

    /// SQL table backing the collection
    pub fn table(&self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::JobApplications => "job_applications",
        }
    }
}

/// Equality filter over top-level document fields. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::default().and(field, value)
    }

    pub fn and(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.0.iter().all(|(k, v)| doc.get(k) == Some(v))
    }

    pub fn as_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
    pub upserted_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
            upserted_id: None,
            upserted_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Document store the API is written against.
///
/// Implementations share handles cheaply; the store is cloned into
/// application state once at startup and never reconnected.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents matching `filter`, in insertion order
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Batched point lookup. Unknown ids are skipped; order is unspecified.
    async fn find_by_ids(&self, collection: Collection, ids: &[Uuid]) -> Result<Vec<Document>, StoreError>;

    /// Insert a document under a freshly generated id. Any `_id` in `doc` is ignored.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<InsertOneResult, StoreError>;

    /// `$set` semantics: overwrite the given top-level fields, leave the rest
    async fn update_set(&self, collection: Collection, id: Uuid, fields: Document) -> Result<UpdateResult, StoreError>;

    /// Atomically add `by` to an integer field, treating an absent field as 0
    async fn increment(&self, collection: Collection, id: Uuid, field: &str, by: i64) -> Result<UpdateResult, StoreError>;

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<DeleteResult, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Release underlying connections; called once after the server drains
    async fn close(&self);
}

/// Parse an identifier supplied by a client
pub fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw.trim()).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

/// Put `_id` on a stored document body
pub(crate) fn with_id(id: Uuid, mut doc: Document) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc
}
