use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::store::{
    with_id, Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, StoreError,
    UpdateResult, ID_FIELD,
};

/// In-process document store. Same semantics as the postgres backend; used for
/// local runs without a database and throughout the test suite.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<(Uuid, Document)>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let docs = collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(id, doc)| with_id(*id, doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|rows| rows.iter().find(|(row_id, _)| *row_id == id))
            .map(|(id, doc)| with_id(*id, doc.clone())))
    }

    async fn find_by_ids(&self, collection: Collection, ids: &[Uuid]) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|(id, _)| ids.contains(id))
                    .map(|(id, doc)| with_id(*id, doc.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        doc.remove(ID_FIELD);
        let id = Uuid::new_v4();
        let mut collections = self.collections.write().await;
        collections.entry(collection).or_default().push((id, doc));
        Ok(InsertOneResult { acknowledged: true, inserted_id: id })
    }

    async fn update_set(&self, collection: Collection, id: Uuid, mut fields: Document) -> Result<UpdateResult, StoreError> {
        fields.remove(ID_FIELD);
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|(row_id, _)| *row_id == id))
            .map(|(_, doc)| doc)
        else {
            return Ok(UpdateResult::new(0, 0));
        };

        let changed = fields.iter().any(|(k, v)| doc.get(k) != Some(v));
        if changed {
            doc.extend(fields);
        }
        Ok(UpdateResult::new(1, changed as u64))
    }

    async fn increment(&self, collection: Collection, id: Uuid, field: &str, by: i64) -> Result<UpdateResult, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&collection)
            .and_then(|rows| rows.iter_mut().find(|(row_id, _)| *row_id == id))
            .map(|(_, doc)| doc)
        else {
            return Ok(UpdateResult::new(0, 0));
        };

        let current = match doc.get(field) {
            None | Some(Value::Null) => 0,
            Some(v) => v.as_i64().ok_or_else(|| {
                StoreError::QueryError(format!("cannot increment non-integer field '{}'", field))
            })?,
        };
        let next = current.checked_add(by).ok_or_else(|| {
            StoreError::QueryError(format!("incrementing '{}' in {} overflows", field, collection.name()))
        })?;
        doc.insert(field.to_string(), Value::from(next));
        Ok(UpdateResult::new(1, 1))
    }

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<DeleteResult, StoreError> {
        let mut collections = self.collections.write().await;
        let deleted = match collections.get_mut(&collection) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|(row_id, _)| *row_id != id);
                (before - rows.len()) as u64
            }
            None => 0,
        };
        Ok(DeleteResult { acknowledged: true, deleted_count: deleted })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {}
}
