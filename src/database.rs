//! Database initialization and table definitions
//!
//! This module handles the setup of the embedded redb database.
//! It defines the tables backing [`crate::store::RedbStore`].

use redb::{Database, TableDefinition};

/// Main table for storing mappings
///
/// Key: shortcode
/// Value: JSON-serialized UrlMapping
///
/// Example:
/// - Key: "Ab3kX9z"
/// - Value: '{"shortcode":"Ab3kX9z","original_url":"https://example.com",...}'
///
/// The key doubles as the uniqueness constraint on shortcodes.
pub const TABLE_MAPPINGS: TableDefinition<&str, &str> = TableDefinition::new("mappings_v1");

/// Index from original URL to shortcode
///
/// Key: original URL, exactly as submitted
/// Value: shortcode
pub const TABLE_ORIGINAL_INDEX: TableDefinition<&str, &str> = TableDefinition::new("original_index_v1");

/// Index for listing mappings in creation order
///
/// Key: composite key in format "{created_at_micros:020}:{shortcode}"
/// Value: shortcode
///
/// Example:
/// - Key: "00001705501234567890:Ab3kX9z"
/// - Value: "Ab3kX9z"
///
/// The zero-padded timestamp makes lexicographic order chronological, so a
/// reverse scan yields newest first. The shortcode suffix keeps keys unique.
pub const TABLE_CREATED_INDEX: TableDefinition<&str, &str> = TableDefinition::new("created_index_v1");

/// Builds the [`TABLE_CREATED_INDEX`] key for a mapping
pub fn created_index_key(created_micros: i64, shortcode: &str) -> String {
    format!("{:020}:{}", created_micros, shortcode)
}

/// Initializes the embedded database and creates required tables
///
/// # Arguments
///
/// * `db_path` - File path where the database should be stored (e.g., "data.db")
///
/// # Example
///
/// ```no_run
/// # use snapurl::database::init_db;
/// let db = init_db("data.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_MAPPINGS)?;
        write_txn.open_table(TABLE_ORIGINAL_INDEX)?;
        write_txn.open_table(TABLE_CREATED_INDEX)?;
    }
    write_txn.commit()?;

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_index_keys_sort_chronologically() {
        let earlier = created_index_key(999_999, "zzzzzzz");
        let later = created_index_key(1_000_000, "AAAAAAA");
        assert!(earlier < later);
        assert_eq!(later, "00000000000001000000:AAAAAAA");
    }
}
