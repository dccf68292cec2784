//! Shortcode registry
//!
//! Allocates shortcodes for original URLs, resolves shortcodes while counting
//! clicks, and lists every mapping. All state lives in the injected
//! [`MappingStore`]; the registry itself holds no locks.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::RegistryError;
use crate::model::UrlMapping;
use crate::shortcode;
use crate::store::{Inserted, MappingStore, StoreError};

/// Number of candidate codes tried before giving up on a `shorten` call
pub const MAX_ALLOCATION_ATTEMPTS: usize = 5;

/// Default and maximum page sizes for [`Registry::list_page`]
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Result of [`Registry::shorten`]
#[derive(Debug, Clone)]
pub struct Shortened {
    pub mapping: UrlMapping,
    /// False when the URL was already registered and the existing mapping was returned
    pub created: bool,
}

#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn MappingStore>,
}

impl Registry {
    pub fn new(store: Arc<dyn MappingStore>) -> Self {
        Self { store }
    }

    /// Returns the mapping for `original_url`, creating one if needed
    ///
    /// An already registered URL (exact string match) yields the existing
    /// mapping untouched. Otherwise up to [`MAX_ALLOCATION_ATTEMPTS`] random
    /// codes are tried against the store's uniqueness constraint.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidInput`] if the URL has no scheme or host
    /// - [`RegistryError::AllocationExhausted`] if every candidate collided
    /// - [`RegistryError::Storage`] on persistence failures
    pub fn shorten(&self, original_url: &str) -> Result<Shortened, RegistryError> {
        validate_url(original_url)?;

        if let Some(mapping) = self.store.find_by_original(original_url)? {
            debug!(shortcode = %mapping.shortcode, "url already shortened");
            return Ok(Shortened { mapping, created: false });
        }

        let mut attempts = 0;
        while attempts < MAX_ALLOCATION_ATTEMPTS {
            attempts += 1;

            let candidate = UrlMapping::new(shortcode::generate(), original_url, Utc::now());
            match self.store.insert(&candidate) {
                Ok(Inserted::Created(mapping)) => {
                    info!(shortcode = %mapping.shortcode, url = %mapping.original_url, "created mapping");
                    return Ok(Shortened { mapping, created: true });
                }
                // A concurrent call registered the same URL first
                Ok(Inserted::Existing(mapping)) => {
                    debug!(shortcode = %mapping.shortcode, "url registered concurrently");
                    return Ok(Shortened { mapping, created: false });
                }
                Err(StoreError::ShortcodeTaken(code)) => {
                    warn!(shortcode = %code, attempt = attempts, "shortcode collision");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(attempts, url = %original_url, "shortcode allocation exhausted");
        Err(RegistryError::AllocationExhausted { attempts })
    }

    /// Resolves a shortcode to its original URL, counting one click
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if no mapping has this code
    /// - [`RegistryError::Storage`] on persistence failures
    pub fn resolve(&self, code: &str) -> Result<String, RegistryError> {
        if !shortcode::is_valid(code) {
            return Err(RegistryError::NotFound(code.to_string()));
        }

        match self.store.increment_clicks(code)? {
            Some(mapping) => {
                debug!(shortcode = %code, clicks = mapping.clicks, "resolved");
                Ok(mapping.original_url)
            }
            None => Err(RegistryError::NotFound(code.to_string())),
        }
    }

    /// Every mapping, newest first
    pub fn list_all(&self) -> Result<Vec<UrlMapping>, RegistryError> {
        Ok(self.store.list_recent(0, None)?)
    }

    /// One page of mappings, newest first
    ///
    /// `page` starts at 1 (default 1), `limit` is capped at [`MAX_PAGE_SIZE`]
    /// (default [`DEFAULT_PAGE_SIZE`]).
    pub fn list_page(&self, page: Option<usize>, limit: Option<usize>) -> Result<Vec<UrlMapping>, RegistryError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(limit);

        Ok(self.store.list_recent(offset, Some(limit))?)
    }
}

/// Accepts only absolute URLs with a scheme and a host
///
/// The string is stored and later sent verbatim as a `Location` header, so it
/// must be printable ASCII. `Url::parse` alone is not enough: it silently drops
/// tabs and newlines that would remain in the stored string.
fn validate_url(candidate: &str) -> Result<(), RegistryError> {
    if let Some(bad) = candidate.chars().find(|c| !(c.is_ascii_graphic() || *c == ' ')) {
        return Err(RegistryError::InvalidInput(format!(
            "`{}` contains {:?}; percent-encode it",
            candidate.escape_debug(),
            bad
        )));
    }

    let parsed = Url::parse(candidate).map_err(|e| RegistryError::InvalidInput(e.to_string()))?;

    if !parsed.has_host() {
        return Err(RegistryError::InvalidInput(format!("`{candidate}` has no host")));
    }

    Ok(())
}
