//! The exclusion ledger.
//!
//! The local `excluded_categories` table is the only source of truth for which
//! categories are hidden from recommendations. Every operation is synchronous
//! and idempotent; membership changes are recorded in `exclusion_log`.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

/// One row of the exclusion audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct ExclusionLogEntry {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub created_at: String,
}

/// Exclude a category. Returns `true` if membership changed.
pub fn add_exclusion(conn: &Connection, category: &str) -> Result<bool> {
    let now = chrono::Utc::now().to_rfc3339();
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO excluded_categories (category, seq, excluded_at) \
         VALUES (?1, (SELECT COALESCE(MAX(seq), 0) + 1 FROM excluded_categories), ?2)",
        params![category, now],
    )?;

    if inserted > 0 {
        write_log(conn, "exclude", Some(category), None)?;
        tracing::debug!(category, "category excluded");
    }
    Ok(inserted > 0)
}

/// Restore a category. Returns `true` if it was excluded.
pub fn remove_exclusion(conn: &Connection, category: &str) -> Result<bool> {
    let removed = conn.execute(
        "DELETE FROM excluded_categories WHERE category = ?1",
        params![category],
    )?;

    if removed > 0 {
        write_log(conn, "restore", Some(category), None)?;
        tracing::debug!(category, "category restored");
    }
    Ok(removed > 0)
}

/// Drop every exclusion. Returns how many were cleared.
pub fn clear_exclusions(conn: &Connection) -> Result<usize> {
    let cleared = conn.execute("DELETE FROM excluded_categories", [])?;
    if cleared > 0 {
        write_log(
            conn,
            "clear",
            None,
            Some(&serde_json::json!({ "cleared": cleared })),
        )?;
    }
    Ok(cleared)
}

/// Excluded categories in the order they were excluded.
pub fn list_exclusions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT category FROM excluded_categories ORDER BY seq")?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(rows)
}

pub fn is_excluded(conn: &Connection, category: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT COUNT(*) > 0 FROM excluded_categories WHERE category = ?1",
        params![category],
        |row| row.get(0),
    )?)
}

/// Most recent audit entries, newest first.
pub fn exclusion_history(conn: &Connection, limit: usize) -> Result<Vec<ExclusionLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT operation, category, details, created_at FROM exclusion_log ORDER BY id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| {
            let details: Option<String> = row.get(2)?;
            Ok(ExclusionLogEntry {
                operation: row.get(0)?,
                category: row.get(1)?,
                details: details.and_then(|d| serde_json::from_str(&d).ok()),
                created_at: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn write_log(
    conn: &Connection,
    operation: &str,
    category: Option<&str>,
    details: Option<&serde_json::Value>,
) -> Result<()> {
    let details_json = details.map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO exclusion_log (operation, category, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, category, details_json, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}
