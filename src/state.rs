//! Application state.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::SharedStore;

/// Shared application state, constructed once in `main` and handed to every
/// handler through axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SharedStore,
}

impl AppState {
    pub fn new(config: AppConfig, store: SharedStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}
