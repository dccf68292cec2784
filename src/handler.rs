//! HTTP request handlers for the URL shortener API
//!
//! Each handler is a thin adapter over one [`crate::registry::Registry`]
//! operation:
//! - Shortening a long URL
//! - Redirecting a shortcode to its original destination
//! - Listing every mapping for the admin view

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::error::RegistryError;
use crate::model::{AdminEntry, ListParams, ShortenRequest, ShortenResponse};
use crate::state::AppState;

/// Creates (or returns the existing) short URL for a long URL
///
/// # Request Body
///
/// ```json
/// { "longUrl": "https://example.com/very/long/url" }
/// ```
///
/// # Response
///
/// - **201 Created** - New mapping created
/// - **200 OK** - URL was already shortened; existing mapping returned
/// - **400 Bad Request** - `longUrl` missing or not an absolute URL, or the
///   body is not a JSON object of the expected shape
/// - **500 Internal Server Error** - Shortcode allocation exhausted or storage failure
pub async fn shorten_url(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Response, RegistryError> {
    // Body rejections (bad JSON, wrong types, missing content-type) share the 400 contract
    let Json(payload) = payload.map_err(|rejection| RegistryError::InvalidInput(rejection.body_text()))?;

    // A missing URL fails validation like any other malformed one
    let long_url = payload.long_url.unwrap_or_default();
    let shortened = state.registry.shorten(&long_url)?;

    // 201 for a new mapping, 200 when the URL was already shortened
    let status = if shortened.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    let body = ShortenResponse::from_mapping(shortened.mapping, &state.base_url);
    Ok((status, Json(body)).into_response())
}

/// Redirects a shortcode to its original destination, counting one click
///
/// # Response
///
/// - **307 Temporary Redirect** - `Location` set to the original URL
/// - **404 Not Found** - Unknown shortcode
///
/// A temporary redirect keeps browsers coming back, so every visit is counted.
pub async fn redirect_url(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, RegistryError> {
    // Counts the click before the redirect is sent
    let original_url = state.registry.resolve(&shortcode)?;
    Ok(Redirect::temporary(&original_url))
}

/// Lists mappings for the admin view, newest first
///
/// # Query Parameters
///
/// - `page` (optional) - Page number, starts from 1
/// - `limit` (optional) - Items per page, max 100
///
/// Without either parameter every mapping is returned.
///
/// # Example Request
///
/// `GET /api/admin/urls?page=2&limit=20`
pub async fn list_urls(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<AdminEntry>>, RegistryError> {
    // No pagination parameters means the full listing
    let mappings = if params.page.is_none() && params.limit.is_none() {
        state.registry.list_all()?
    } else {
        state.registry.list_page(params.page, params.limit)?
    };

    Ok(Json(
        mappings
            .into_iter()
            .map(|mapping| AdminEntry::from_mapping(mapping, &state.base_url))
            .collect(),
    ))
}
