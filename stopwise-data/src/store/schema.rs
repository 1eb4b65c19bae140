//! Table layout for persisted address lists.

use rusqlite::Connection;

use super::SqliteStoreError;

/// Statements creating every table and index; safe to run repeatedly.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS address_lists (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    label TEXT NOT NULL,
    starting_note TEXT,
    version INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS address_lists_owner ON address_lists (owner);

CREATE TABLE IF NOT EXISTS addresses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_id INTEGER NOT NULL REFERENCES address_lists (id) ON DELETE CASCADE,
    raw_text TEXT NOT NULL,
    formatted_address TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    comment TEXT,
    order_index INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS addresses_list ON addresses (list_id, order_index);

CREATE TABLE IF NOT EXISTS recipients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    list_id INTEGER NOT NULL REFERENCES address_lists (id) ON DELETE CASCADE,
    email TEXT NOT NULL,
    UNIQUE (list_id, email)
);
";

/// Enable foreign keys and create the tables if missing.
pub(super) fn initialise(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SqliteStoreError::Schema { source })?;
    connection
        .execute_batch(SCHEMA)
        .map_err(|source| SqliteStoreError::Schema { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn initialise_is_idempotent() {
        let connection = Connection::open_in_memory().expect("open database");

        initialise(&connection).expect("first run");
        initialise(&connection).expect("second run");

        let tables: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                 AND name IN ('address_lists', 'addresses', 'recipients')",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 3);
    }
}
