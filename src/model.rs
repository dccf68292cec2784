//! Data models for the URL shortener
//!
//! This module defines the persisted mapping record and the request/response
//! shapes exchanged with HTTP clients.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A persisted association between a shortcode and its destination
///
/// `shortcode`, `original_url` and `created_at` never change after creation.
/// Only `clicks` is mutated, and only by resolving the shortcode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    /// Unique short identifier (e.g., "Ab3kX9z")
    pub shortcode: String,

    /// The destination the shortcode redirects to
    pub original_url: String,

    /// Number of successful resolutions
    #[serde(default)]
    pub clicks: u64,

    /// Timestamp when this mapping was created
    pub created_at: DateTime<Utc>,
}

impl UrlMapping {
    /// Builds a fresh mapping with a zero click counter
    ///
    /// `created_at` is truncated to microseconds, the precision of the redb
    /// creation index, so every store orders mappings identically.
    pub fn new(shortcode: impl Into<String>, original_url: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            shortcode: shortcode.into(),
            original_url: original_url.into(),
            clicks: 0,
            created_at: created_at.trunc_subsecs(6),
        }
    }

    /// Derives the public short URL under `base_url`
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.shortcode)
    }
}

/// Request payload for shortening a URL
///
/// # Example
/// ```json
/// { "longUrl": "https://example.com/very/long/url" }
/// ```
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    /// The URL to shorten. Missing values are rejected as invalid input.
    pub long_url: Option<String>,
}

/// Response returned by the shorten endpoint
///
/// # Example
/// ```json
/// {
///   "shortcode": "Ab3kX9z",
///   "shortUrl": "http://localhost:8080/Ab3kX9z",
///   "originalUrl": "https://example.com/a/b",
///   "clicks": 0
/// }
/// ```
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub shortcode: String,
    pub short_url: String,
    pub original_url: String,
    pub clicks: u64,
}

impl ShortenResponse {
    pub fn from_mapping(mapping: UrlMapping, base_url: &str) -> Self {
        Self {
            short_url: mapping.short_url(base_url),
            shortcode: mapping.shortcode,
            original_url: mapping.original_url,
            clicks: mapping.clicks,
        }
    }
}

/// One row of the admin listing
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdminEntry {
    /// Primary key of the mapping; equal to the shortcode
    pub id: String,
    pub shortcode: String,
    pub original_url: String,
    pub short_url: String,
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
}

impl AdminEntry {
    pub fn from_mapping(mapping: UrlMapping, base_url: &str) -> Self {
        Self {
            id: mapping.shortcode.clone(),
            short_url: mapping.short_url(base_url),
            shortcode: mapping.shortcode,
            original_url: mapping.original_url,
            clicks: mapping.clicks,
            created_at: mapping.created_at,
        }
    }
}

/// Query parameters for the admin listing
///
/// Without `page` and `limit` every mapping is returned.
///
/// # Example
/// Query string: `?page=2&limit=20`
#[derive(Deserialize, Debug)]
pub struct ListParams {
    /// Page number for pagination (starts from 1)
    pub page: Option<usize>,

    /// Number of items per page, maximum is 100
    pub limit: Option<usize>,
}
