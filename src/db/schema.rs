//! SQL DDL for the catalog and the exclusion ledger.
//!
//! The two tables never reference each other: sources and excluded categories
//! are only joined by the recommendation engine at query time.

use rusqlite::Connection;

const SCHEMA_SQL: &str = r#"
-- Source catalog; seq preserves insertion order
CREATE TABLE IF NOT EXISTS sources (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE CHECK(length(id) > 0),
    name TEXT NOT NULL CHECK(length(name) > 0),
    category TEXT NOT NULL,
    memo TEXT NOT NULL DEFAULT '',
    duration_min INTEGER,
    anchor_id TEXT,
    priority INTEGER,
    tags TEXT,
    kind TEXT,
    created_at TEXT NOT NULL
);

-- Exclusion ledger
CREATE TABLE IF NOT EXISTS excluded_categories (
    category TEXT PRIMARY KEY,
    seq INTEGER NOT NULL,
    excluded_at TEXT NOT NULL
);

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;

    Ok(())
}
