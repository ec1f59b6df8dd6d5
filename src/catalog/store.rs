//! Source catalog persistence.
//!
//! Sources are listed in insertion order (`seq`). Exclusions never touch this
//! table; the only ways a source disappears are [`remove_source`] and
//! [`clear_sources`].

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::catalog::types::{NewSource, Source};

const SOURCE_COLUMNS: &str = "id, name, category, memo, duration_min, anchor_id, priority, tags, kind";

/// Insert a source. Generates a UUID v7 id when none is supplied.
pub fn add_source(conn: &Connection, new: &NewSource) -> Result<Source> {
    let id = match new.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        Some(_) => bail!("source id must not be empty"),
        None => uuid::Uuid::now_v7().to_string(),
    };
    if new.name.trim().is_empty() {
        bail!("source name must not be empty");
    }

    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sources WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    if exists {
        bail!("source already exists: {id}");
    }

    let tags_json = new.tags.as_ref().map(serde_json::to_string).transpose()?;
    conn.execute(
        "INSERT INTO sources (id, name, category, memo, duration_min, anchor_id, priority, tags, kind, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            new.name,
            new.category,
            new.memo,
            new.duration_min,
            new.anchor_id,
            new.priority,
            tags_json,
            new.kind,
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("failed to insert source {id}"))?;

    Ok(Source {
        id,
        name: new.name.clone(),
        category: new.category.clone(),
        memo: new.memo.clone(),
        duration_min: new.duration_min,
        anchor_id: new.anchor_id.clone(),
        priority: new.priority,
        tags: new.tags.clone(),
        kind: new.kind.clone(),
    })
}

/// Remove a source by id. Returns the removed record, or `None` if absent.
pub fn remove_source(conn: &Connection, id: &str) -> Result<Option<Source>> {
    let tx = conn.unchecked_transaction()?;
    let existing = tx
        .query_row(
            &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = ?1"),
            params![id],
            row_to_source,
        )
        .optional()?;

    if existing.is_some() {
        tx.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
    }
    tx.commit()?;

    Ok(existing)
}

/// All sources in insertion order.
pub fn list_sources(conn: &Connection) -> Result<Vec<Source>> {
    let mut stmt = conn.prepare(&format!("SELECT {SOURCE_COLUMNS} FROM sources ORDER BY seq"))?;
    let rows = stmt
        .query_map([], row_to_source)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Sources carrying exactly `category`, in insertion order.
pub fn list_by_category(conn: &Connection, category: &str) -> Result<Vec<Source>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SOURCE_COLUMNS} FROM sources WHERE category = ?1 ORDER BY seq"
    ))?;
    let rows = stmt
        .query_map(params![category], row_to_source)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Source count per category, ordered by first appearance in the catalog.
pub fn category_counts(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT category, COUNT(*) FROM sources GROUP BY category ORDER BY MIN(seq)",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let count: i64 = row.get(1)?;
            Ok((row.get::<_, String>(0)?, count as usize))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Delete every source. Returns the number removed.
pub fn clear_sources(conn: &Connection) -> Result<usize> {
    Ok(conn.execute("DELETE FROM sources", [])?)
}

fn row_to_source(row: &Row<'_>) -> rusqlite::Result<Source> {
    let tags: Option<String> = row.get(7)?;
    Ok(Source {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        memo: row.get(3)?,
        duration_min: row.get(4)?,
        anchor_id: row.get(5)?,
        priority: row.get(6)?,
        tags: tags.and_then(|t| serde_json::from_str(&t).ok()),
        kind: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn named(id: &str, name: &str, category: &str) -> NewSource {
        NewSource {
            id: Some(id.into()),
            ..NewSource::new(name, category)
        }
    }

    #[test]
    fn list_preserves_insertion_order() {
        let conn = db::open_memory_database().unwrap();
        add_source(&conn, &named("b", "Second", "museum")).unwrap();
        add_source(&conn, &named("a", "First", "cafe")).unwrap();
        add_source(&conn, &named("c", "Third", "cafe")).unwrap();

        let ids: Vec<String> = list_sources(&conn).unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let cafes = list_by_category(&conn, "cafe").unwrap();
        assert_eq!(cafes.len(), 2);
        assert_eq!(cafes[0].id, "a");
    }

    #[test]
    fn generated_id_when_absent() {
        let conn = db::open_memory_database().unwrap();
        let s = add_source(&conn, &NewSource::new("Tate Modern", "museum")).unwrap();
        assert!(!s.id.is_empty());
        assert_eq!(list_sources(&conn).unwrap()[0].id, s.id);
    }

    #[test]
    fn empty_name_or_id_rejected() {
        let conn = db::open_memory_database().unwrap();
        assert!(add_source(&conn, &NewSource::new("  ", "cafe")).is_err());
        assert!(add_source(&conn, &named("", "Name", "cafe")).is_err());
    }

    #[test]
    fn duplicate_id_rejected() {
        let conn = db::open_memory_database().unwrap();
        add_source(&conn, &named("x", "One", "cafe")).unwrap();
        let err = add_source(&conn, &named("x", "Two", "cafe")).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn remove_returns_record_or_none() {
        let conn = db::open_memory_database().unwrap();
        let mut new = named("m1", "British Museum", "museum");
        new.tags = Some(vec!["free".into()]);
        new.duration_min = Some(120);
        add_source(&conn, &new).unwrap();

        let removed = remove_source(&conn, "m1").unwrap().unwrap();
        assert_eq!(removed.name, "British Museum");
        assert_eq!(removed.tags, Some(vec!["free".to_string()]));
        assert_eq!(removed.duration_min, Some(120));
        assert!(remove_source(&conn, "m1").unwrap().is_none());
        assert!(list_sources(&conn).unwrap().is_empty());
    }

    #[test]
    fn category_counts_in_first_seen_order() {
        let conn = db::open_memory_database().unwrap();
        add_source(&conn, &named("1", "A", "market")).unwrap();
        add_source(&conn, &named("2", "B", "cafe")).unwrap();
        add_source(&conn, &named("3", "C", "market")).unwrap();

        let counts = category_counts(&conn).unwrap();
        assert_eq!(counts, vec![("market".to_string(), 2), ("cafe".to_string(), 1)]);
    }
}
