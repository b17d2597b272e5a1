use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::config::DatabaseConfig;

use super::store::{
    with_id, Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, StoreError,
    UpdateResult, ID_FIELD,
};

/// PostgreSQL-backed document store. Each collection is a table holding one
/// JSONB document per row; the row id is the document `_id`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open the pool and make sure both collection tables exist
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let store = Self { pool };
        store.ensure_collections().await?;
        info!("Connected to document store ({} collections ready)", Collection::ALL.len());
        Ok(store)
    }

    pub async fn ensure_collections(&self) -> Result<(), StoreError> {
        for collection in Collection::ALL {
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{}" (
                    id UUID PRIMARY KEY,
                    seq BIGSERIAL,
                    doc JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#,
                collection.table()
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }
}

type DocRow = (Uuid, Json<Document>);

fn into_documents(rows: Vec<DocRow>) -> Vec<Document> {
    rows.into_iter().map(|(id, Json(doc))| with_id(id, doc)).collect()
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn find(&self, collection: Collection, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            r#"SELECT id, doc FROM "{}" WHERE doc @> $1 ORDER BY seq"#,
            collection.table()
        );
        let rows: Vec<DocRow> = sqlx::query_as(&sql)
            .bind(filter.as_value())
            .fetch_all(&self.pool)
            .await?;
        Ok(into_documents(rows))
    }

    async fn find_by_id(&self, collection: Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let sql = format!(r#"SELECT id, doc FROM "{}" WHERE id = $1"#, collection.table());
        let row: Option<DocRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(|(id, Json(doc))| with_id(id, doc)))
    }

    async fn find_by_ids(&self, collection: Collection, ids: &[Uuid]) -> Result<Vec<Document>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = format!(r#"SELECT id, doc FROM "{}" WHERE id = ANY($1)"#, collection.table());
        let rows: Vec<DocRow> = sqlx::query_as(&sql).bind(ids).fetch_all(&self.pool).await?;
        Ok(into_documents(rows))
    }

    async fn insert_one(&self, collection: Collection, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        doc.remove(ID_FIELD);
        let id = Uuid::new_v4();
        let sql = format!(r#"INSERT INTO "{}" (id, doc) VALUES ($1, $2)"#, collection.table());
        sqlx::query(&sql).bind(id).bind(Json(doc)).execute(&self.pool).await?;
        Ok(InsertOneResult { acknowledged: true, inserted_id: id })
    }

    async fn update_set(&self, collection: Collection, id: Uuid, mut fields: Document) -> Result<UpdateResult, StoreError> {
        fields.remove(ID_FIELD);
        let table = collection.table();
        // Matched and modified are counted separately; a $set that leaves the
        // document byte-identical matches without modifying.
        let sql = format!(
            r#"
            WITH target AS (
                SELECT id, doc FROM "{table}" WHERE id = $1 FOR UPDATE
            ), updated AS (
                UPDATE "{table}" AS t SET doc = t.doc || $2
                FROM target
                WHERE t.id = target.id AND (target.doc || $2) IS DISTINCT FROM target.doc
                RETURNING t.id
            )
            SELECT (SELECT count(*) FROM target), (SELECT count(*) FROM updated)
            "#
        );
        let (matched, modified): (i64, i64) = sqlx::query_as(&sql)
            .bind(id)
            .bind(Value::Object(fields))
            .fetch_one(&self.pool)
            .await?;
        Ok(UpdateResult::new(matched as u64, modified as u64))
    }

    async fn increment(&self, collection: Collection, id: Uuid, field: &str, by: i64) -> Result<UpdateResult, StoreError> {
        // Single statement: the row lock taken by UPDATE serializes concurrent increments
        let sql = format!(
            r#"
            UPDATE "{}"
            SET doc = jsonb_set(doc, ARRAY[$2::text], to_jsonb(COALESCE((doc->>$2)::bigint, 0) + $3))
            WHERE id = $1
            "#,
            collection.table()
        );
        let result = sqlx::query(&sql)
            .bind(id)
            .bind(field)
            .bind(by)
            .execute(&self.pool)
            .await?;
        let n = result.rows_affected();
        Ok(UpdateResult::new(n, n))
    }

    async fn delete_by_id(&self, collection: Collection, id: Uuid) -> Result<DeleteResult, StoreError> {
        let sql = format!(r#"DELETE FROM "{}" WHERE id = $1"#, collection.table());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(DeleteResult { acknowledged: true, deleted_count: result.rows_affected() })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Document store connections closed");
    }
}
