pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    parse_id, Collection, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, StoreError,
    UpdateResult, ID_FIELD,
};

use std::sync::Arc;

use crate::config::{DatabaseConfig, StoreBackend};

/// Shared store handle held in application state
pub type SharedStore = Arc<dyn DocumentStore>;

/// Open the configured backend
pub async fn connect(config: &DatabaseConfig) -> Result<SharedStore, StoreError> {
    match config.backend {
        StoreBackend::Postgres => Ok(Arc::new(PgStore::connect(config).await?)),
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
