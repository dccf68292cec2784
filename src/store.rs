//! Mapping storage
//!
//! [`MappingStore`] is the seam between the registry and persistence. Both
//! implementations serialize writers, which is what makes shortcode uniqueness,
//! original URL deduplication and click increments atomic:
//!
//! - [`RedbStore`] relies on redb admitting a single write transaction at a time.
//! - [`MemoryStore`] holds a mutex for the duration of each operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use redb::{Database, ReadableDatabase, ReadableTable, WriteTransaction};

use crate::database::{created_index_key, TABLE_CREATED_INDEX, TABLE_MAPPINGS, TABLE_ORIGINAL_INDEX};
use crate::model::UrlMapping;

/// Errors raised by a [`MappingStore`]
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The shortcode uniqueness constraint rejected an insert
    #[error("shortcode `{0}` is already taken")]
    ShortcodeTaken(String),

    #[error("database transaction failed: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("database table unavailable: {0}")]
    Table(#[from] redb::TableError),

    #[error("database storage failure: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("database commit failed: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("corrupt mapping record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Outcome of [`MappingStore::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inserted {
    /// The mapping was written
    Created(UrlMapping),
    /// The original URL was already registered; nothing was written
    Existing(UrlMapping),
}

/// Storage operations needed by the registry
///
/// Every method touches at most one mapping and runs as one transaction.
pub trait MappingStore: Send + Sync {
    /// Looks up a mapping by its exact original URL
    fn find_by_original(&self, original_url: &str) -> Result<Option<UrlMapping>, StoreError>;

    /// Writes a new mapping
    ///
    /// Returns [`Inserted::Existing`] when the original URL is already
    /// registered, and [`StoreError::ShortcodeTaken`] when the shortcode is.
    fn insert(&self, mapping: &UrlMapping) -> Result<Inserted, StoreError>;

    /// Adds one click to the mapping and returns its updated state
    ///
    /// Returns `Ok(None)` and writes nothing when the shortcode is unknown.
    fn increment_clicks(&self, shortcode: &str) -> Result<Option<UrlMapping>, StoreError>;

    /// Lists mappings newest first, skipping `offset` and returning at most `limit`
    fn list_recent(&self, offset: usize, limit: Option<usize>) -> Result<Vec<UrlMapping>, StoreError>;
}

/// Persistent store backed by the embedded redb database
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Wraps a database initialized by [`crate::database::init_db`]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

fn get_mapping(
    table: &impl ReadableTable<&'static str, &'static str>,
    shortcode: &str,
) -> Result<Option<UrlMapping>, StoreError> {
    match table.get(shortcode)? {
        Some(json) => Ok(Some(serde_json::from_str(json.value())?)),
        None => Ok(None),
    }
}

fn insert_in(txn: &WriteTransaction, mapping: &UrlMapping) -> Result<Inserted, StoreError> {
    // Open the main table and the original URL index
    let mut table = txn.open_table(TABLE_MAPPINGS)?;
    let mut original_index = txn.open_table(TABLE_ORIGINAL_INDEX)?;

    // Return the existing mapping if the URL was registered first
    let indexed = original_index
        .get(mapping.original_url.as_str())?
        .map(|code| code.value().to_string());
    if let Some(code) = indexed {
        if let Some(existing) = get_mapping(&table, &code)? {
            return Ok(Inserted::Existing(existing));
        }
    }

    // Check if the shortcode is already taken
    if table.get(mapping.shortcode.as_str())?.is_some() {
        return Err(StoreError::ShortcodeTaken(mapping.shortcode.clone()));
    }

    // Insert the record and index it by original URL
    let json = serde_json::to_string(mapping)?;
    table.insert(mapping.shortcode.as_str(), json.as_str())?;
    original_index.insert(mapping.original_url.as_str(), mapping.shortcode.as_str())?;

    // Index by creation time for newest-first listing
    let mut created_index = txn.open_table(TABLE_CREATED_INDEX)?;
    let key = created_index_key(mapping.created_at.timestamp_micros(), &mapping.shortcode);
    created_index.insert(key.as_str(), mapping.shortcode.as_str())?;

    Ok(Inserted::Created(mapping.clone()))
}

impl MappingStore for RedbStore {
    fn find_by_original(&self, original_url: &str) -> Result<Option<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let original_index = read_txn.open_table(TABLE_ORIGINAL_INDEX)?;

        let Some(code) = original_index.get(original_url)?.map(|code| code.value().to_string()) else {
            return Ok(None);
        };

        let table = read_txn.open_table(TABLE_MAPPINGS)?;
        get_mapping(&table, &code)
    }

    fn insert(&self, mapping: &UrlMapping) -> Result<Inserted, StoreError> {
        // Writers are serialized, so check-then-insert is atomic
        let write_txn = self.db.begin_write()?;
        let inserted = insert_in(&write_txn, mapping);

        // Only a created mapping is persisted; everything else rolls back
        match inserted {
            Ok(Inserted::Created(_)) => write_txn.commit()?,
            _ => write_txn.abort()?,
        }

        inserted
    }

    fn increment_clicks(&self, shortcode: &str) -> Result<Option<UrlMapping>, StoreError> {
        // Read-increment-write inside one write transaction
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = write_txn.open_table(TABLE_MAPPINGS)?;
            match get_mapping(&table, shortcode)? {
                Some(mut mapping) => {
                    mapping.clicks = mapping.clicks.saturating_add(1);
                    let json = serde_json::to_string(&mapping)?;
                    table.insert(shortcode, json.as_str())?;
                    Some(mapping)
                }
                None => None,
            }
        };

        // Unknown shortcodes leave no trace
        if updated.is_some() {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }

        Ok(updated)
    }

    fn list_recent(&self, offset: usize, limit: Option<usize>) -> Result<Vec<UrlMapping>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let created_index = read_txn.open_table(TABLE_CREATED_INDEX)?;
        let table = read_txn.open_table(TABLE_MAPPINGS)?;

        // Reverse scan of the creation index yields newest first
        let mut mappings = Vec::new();
        for entry in created_index
            .iter()?
            .rev()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
        {
            let (_, code) = entry?;
            if let Some(mapping) = get_mapping(&table, code.value())? {
                mappings.push(mapping);
            }
        }

        Ok(mappings)
    }
}

#[derive(Default)]
struct MemoryTables {
    mappings: HashMap<String, UrlMapping>,
    original_index: HashMap<String, String>,
}

/// In-process store, used by tests and for throwaway instances
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<MemoryTables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryTables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl MappingStore for MemoryStore {
    fn find_by_original(&self, original_url: &str) -> Result<Option<UrlMapping>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .original_index
            .get(original_url)
            .and_then(|code| tables.mappings.get(code))
            .cloned())
    }

    fn insert(&self, mapping: &UrlMapping) -> Result<Inserted, StoreError> {
        let mut tables = self.lock()?;

        if let Some(existing) = tables
            .original_index
            .get(&mapping.original_url)
            .and_then(|code| tables.mappings.get(code))
        {
            return Ok(Inserted::Existing(existing.clone()));
        }

        if tables.mappings.contains_key(&mapping.shortcode) {
            return Err(StoreError::ShortcodeTaken(mapping.shortcode.clone()));
        }

        tables
            .mappings
            .insert(mapping.shortcode.clone(), mapping.clone());
        tables
            .original_index
            .insert(mapping.original_url.clone(), mapping.shortcode.clone());

        Ok(Inserted::Created(mapping.clone()))
    }

    fn increment_clicks(&self, shortcode: &str) -> Result<Option<UrlMapping>, StoreError> {
        let mut tables = self.lock()?;
        Ok(tables.mappings.get_mut(shortcode).map(|mapping| {
            mapping.clicks = mapping.clicks.saturating_add(1);
            mapping.clone()
        }))
    }

    fn list_recent(&self, offset: usize, limit: Option<usize>) -> Result<Vec<UrlMapping>, StoreError> {
        let tables = self.lock()?;
        let mut mappings: Vec<UrlMapping> = tables.mappings.values().cloned().collect();
        mappings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.shortcode.cmp(&a.shortcode))
        });

        Ok(mappings
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_db;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn redb_store() -> (RedbStore, NamedTempFile) {
        let temp_db = NamedTempFile::new().expect("Failed to create temp file");
        let db = init_db(temp_db.path().to_str().unwrap()).expect("Failed to initialize test database");
        (RedbStore::new(Arc::new(db)), temp_db)
    }

    fn stored(store: &dyn MappingStore, code: &str) -> Option<UrlMapping> {
        store
            .list_recent(0, None)
            .unwrap()
            .into_iter()
            .find(|m| m.shortcode == code)
    }

    fn mapping(code: &str, url: &str, offset_secs: i64) -> UrlMapping {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        UrlMapping::new(code, url, base + Duration::seconds(offset_secs))
    }

    fn check_insert_and_lookup(store: &dyn MappingStore) {
        let m = mapping("aaaaaaa", "https://example.com/a", 0);
        assert_eq!(store.insert(&m).unwrap(), Inserted::Created(m.clone()));

        assert_eq!(stored(store, "aaaaaaa"), Some(m.clone()));
        assert_eq!(store.find_by_original("https://example.com/a").unwrap(), Some(m));
        assert_eq!(stored(store, "bbbbbbb"), None);
        assert_eq!(store.find_by_original("https://example.com/b").unwrap(), None);
    }

    fn check_shortcode_constraint(store: &dyn MappingStore) {
        store.insert(&mapping("aaaaaaa", "https://example.com/a", 0)).unwrap();

        let clash = mapping("aaaaaaa", "https://example.com/other", 1);
        assert!(matches!(store.insert(&clash), Err(StoreError::ShortcodeTaken(code)) if code == "aaaaaaa"));
        assert_eq!(store.find_by_original("https://example.com/other").unwrap(), None);
        assert_eq!(store.list_recent(0, None).unwrap().len(), 1);
    }

    fn check_original_dedup(store: &dyn MappingStore) {
        let first = mapping("aaaaaaa", "https://example.com/a", 0);
        store.insert(&first).unwrap();

        let second = mapping("bbbbbbb", "https://example.com/a", 1);
        assert_eq!(store.insert(&second).unwrap(), Inserted::Existing(first));
        assert_eq!(stored(store, "bbbbbbb"), None);
    }

    fn check_increment(store: &dyn MappingStore) {
        store.insert(&mapping("aaaaaaa", "https://example.com/a", 0)).unwrap();

        assert_eq!(store.increment_clicks("aaaaaaa").unwrap().unwrap().clicks, 1);
        assert_eq!(store.increment_clicks("aaaaaaa").unwrap().unwrap().clicks, 2);
        assert_eq!(stored(store, "aaaaaaa").unwrap().clicks, 2);

        assert_eq!(store.increment_clicks("missing").unwrap(), None);
        assert_eq!(stored(store, "missing"), None);
    }

    fn check_list_order(store: &dyn MappingStore) {
        store.insert(&mapping("second1", "https://example.com/2", 20)).unwrap();
        store.insert(&mapping("first11", "https://example.com/1", 10)).unwrap();
        store.insert(&mapping("third11", "https://example.com/3", 30)).unwrap();

        let codes: Vec<String> = store
            .list_recent(0, None)
            .unwrap()
            .into_iter()
            .map(|m| m.shortcode)
            .collect();
        assert_eq!(codes, ["third11", "second1", "first11"]);

        let page: Vec<String> = store
            .list_recent(1, Some(1))
            .unwrap()
            .into_iter()
            .map(|m| m.shortcode)
            .collect();
        assert_eq!(page, ["second1"]);
    }

    fn check_same_microsecond_ties(store: &dyn MappingStore) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        // The later nanosecond goes to the lower shortcode
        let early = UrlMapping::new("zzzzzzz", "https://example.com/early", base + Duration::nanoseconds(100));
        let late = UrlMapping::new("aaaaaaa", "https://example.com/late", base + Duration::nanoseconds(900));
        store.insert(&early).unwrap();
        store.insert(&late).unwrap();

        let codes: Vec<String> = store
            .list_recent(0, None)
            .unwrap()
            .into_iter()
            .map(|m| m.shortcode)
            .collect();
        assert_eq!(codes, ["zzzzzzz", "aaaaaaa"]);
    }

    #[test]
    fn memory_store_insert_and_lookup() {
        check_insert_and_lookup(&MemoryStore::new());
    }

    #[test]
    fn memory_store_enforces_shortcode_uniqueness() {
        check_shortcode_constraint(&MemoryStore::new());
    }

    #[test]
    fn memory_store_dedups_original_url() {
        check_original_dedup(&MemoryStore::new());
    }

    #[test]
    fn memory_store_increments_clicks() {
        check_increment(&MemoryStore::new());
    }

    #[test]
    fn memory_store_lists_newest_first() {
        check_list_order(&MemoryStore::new());
    }

    #[test]
    fn redb_store_insert_and_lookup() {
        let (store, _temp_db) = redb_store();
        check_insert_and_lookup(&store);
    }

    #[test]
    fn redb_store_enforces_shortcode_uniqueness() {
        let (store, _temp_db) = redb_store();
        check_shortcode_constraint(&store);
    }

    #[test]
    fn redb_store_dedups_original_url() {
        let (store, _temp_db) = redb_store();
        check_original_dedup(&store);
    }

    #[test]
    fn redb_store_increments_clicks() {
        let (store, _temp_db) = redb_store();
        check_increment(&store);
    }

    #[test]
    fn redb_store_lists_newest_first() {
        let (store, _temp_db) = redb_store();
        check_list_order(&store);
    }

    #[test]
    fn memory_store_breaks_ties_by_shortcode() {
        check_same_microsecond_ties(&MemoryStore::new());
    }

    #[test]
    fn redb_store_breaks_ties_by_shortcode() {
        let (store, _temp_db) = redb_store();
        check_same_microsecond_ties(&store);
    }

    #[test]
    fn redb_store_survives_reopen() {
        let temp_db = NamedTempFile::new().unwrap();
        let path = temp_db.path().to_str().unwrap().to_string();

        {
            let store = RedbStore::new(Arc::new(init_db(&path).unwrap()));
            store.insert(&mapping("aaaaaaa", "https://example.com/a", 0)).unwrap();
            store.increment_clicks("aaaaaaa").unwrap();
        }

        let store = RedbStore::new(Arc::new(init_db(&path).unwrap()));
        let reopened = stored(&store, "aaaaaaa").unwrap();
        assert_eq!(reopened.clicks, 1);
        assert_eq!(reopened.original_url, "https://example.com/a");
    }
}
