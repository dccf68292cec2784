//! Route definitions for the URL shortener API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handler::{list_urls, redirect_url, shorten_url};
use crate::state::AppState;

/// Creates the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /{shortcode}` - Redirects to the original URL
/// - `POST /api/shorten` - Creates a short URL
/// - `GET /api/admin/urls` - Lists all mappings
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use snapurl::database::init_db;
/// # use snapurl::route::create_app;
/// # use snapurl::state::AppState;
/// # use snapurl::store::RedbStore;
/// # let db = init_db("data.db").unwrap();
/// let state = AppState::new(Arc::new(RedbStore::new(Arc::new(db))), "http://localhost:8080");
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/shorten", post(shorten_url))
        .route("/admin/urls", get(list_urls));

    Router::new()
        .route("/{shortcode}", get(redirect_url))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
