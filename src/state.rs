//! Application state shared across all request handlers

use std::sync::Arc;

use crate::registry::Registry;
use crate::store::MappingStore;

/// Cloned into every handler by axum
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,

    /// Prefix used to derive `shortUrl` values
    pub base_url: Arc<str>,
}

impl AppState {
    pub fn new(store: Arc<dyn MappingStore>, base_url: &str) -> Self {
        Self {
            registry: Registry::new(store),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}
