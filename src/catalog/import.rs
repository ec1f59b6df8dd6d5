//! Bulk import of a trip document into the catalog.
//!
//! The document carries trip metadata, anchors and a `sources` array whose
//! `title`/`notes` fields map onto [`Source`](crate::catalog::types::Source)
//! `name`/`memo`. Timeline blocks are accepted but ignored. Importing replaces
//! the whole catalog and resets the exclusion ledger.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::store;
use crate::catalog::types::NewSource;
use crate::exclusion::ledger;

#[derive(Debug, Deserialize)]
pub struct TripImport {
    pub trip: TripMeta,
    #[serde(default)]
    pub context: Option<TripContext>,
    pub sources: Vec<ImportedSource>,
}

#[derive(Debug, Deserialize)]
pub struct TripMeta {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
pub struct TripContext {
    #[serde(default)]
    pub anchors: Vec<Anchor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Anchor {
    pub anchor_id: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportedSource {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub anchor_id: Option<String>,
    #[serde(default)]
    pub duration_min: Option<u32>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl From<&ImportedSource> for NewSource {
    fn from(s: &ImportedSource) -> Self {
        NewSource {
            id: Some(s.id.clone()),
            name: s.title.clone(),
            category: s.category.clone(),
            memo: s.notes.clone().unwrap_or_default(),
            duration_min: s.duration_min,
            anchor_id: s.anchor_id.clone(),
            priority: s.priority,
            tags: s.tags.clone(),
            kind: s.kind.clone(),
        }
    }
}

/// What an import did, for logging and CLI output.
#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub trip_id: String,
    pub title: String,
    pub destination: String,
    pub source_count: usize,
    pub category_counts: Vec<(String, usize)>,
    pub anchors: Vec<Anchor>,
    pub cleared_exclusions: usize,
}

/// Parse a trip document from a JSON file.
pub fn read_trip_file(path: &Path) -> Result<TripImport> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file: {}", path.display()))?;
    serde_json::from_str(&json).context("failed to parse trip JSON")
}

/// Replace the catalog with the document's sources and clear all exclusions.
///
/// Runs in a single transaction: a failed import leaves the previous catalog
/// and ledger untouched.
pub fn import_trip(conn: &Connection, data: &TripImport) -> Result<ImportSummary> {
    let tx = conn.unchecked_transaction()?;

    store::clear_sources(&tx)?;
    for source in &data.sources {
        store::add_source(&tx, &NewSource::from(source))
            .with_context(|| format!("failed to import source {}", source.id))?;
    }
    let cleared_exclusions = ledger::clear_exclusions(&tx)?;
    let category_counts = store::category_counts(&tx)?;

    tx.commit()?;

    let destination = match (data.trip.city.is_empty(), data.trip.country.is_empty()) {
        (false, false) => format!("{}, {}", data.trip.city, data.trip.country),
        (false, true) => data.trip.city.clone(),
        _ => data.trip.country.clone(),
    };

    tracing::info!(
        trip = %data.trip.id,
        sources = data.sources.len(),
        categories = category_counts.len(),
        "trip imported"
    );

    Ok(ImportSummary {
        trip_id: data.trip.id.clone(),
        title: data.trip.title.clone(),
        destination,
        source_count: data.sources.len(),
        category_counts,
        anchors: data
            .context
            .as_ref()
            .map(|c| c.anchors.clone())
            .unwrap_or_default(),
        cleared_exclusions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const TRIP: &str = r#"{
        "trip": {"id": "ldn", "title": "London 3 days", "city": "London", "country": "UK",
                 "start_date": "2025-05-01", "end_date": "2025-05-03"},
        "context": {"anchors": [{"anchor_id": "anchor_covent_garden", "label": "Covent Garden", "lat": 51.5, "lng": -0.12}]},
        "sources": [
            {"id": "src_1", "type": "place", "title": "Monmouth Coffee", "category": "cafe",
             "anchor_id": "anchor_covent_garden", "duration_min": 30, "priority": 4, "notes": "flat white"},
            {"id": "src_2", "title": "National Gallery", "category": "museum", "duration_min": 120}
        ],
        "timeline": [{"day": "1", "date": "2025-05-01", "blocks": []}]
    }"#;

    #[test]
    fn import_maps_fields_and_replaces_catalog() {
        let conn = db::open_memory_database().unwrap();
        store::add_source(&conn, &NewSource::new("Stale", "shop")).unwrap();
        ledger::add_exclusion(&conn, "cafe").unwrap();

        let data: TripImport = serde_json::from_str(TRIP).unwrap();
        let summary = import_trip(&conn, &data).unwrap();

        assert_eq!(summary.destination, "London, UK");
        assert_eq!(summary.source_count, 2);
        assert_eq!(summary.cleared_exclusions, 1);
        assert_eq!(summary.anchors.len(), 1);

        let sources = store::list_sources(&conn).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "Monmouth Coffee");
        assert_eq!(sources[0].memo, "flat white");
        assert_eq!(sources[0].kind.as_deref(), Some("place"));
        assert_eq!(sources[1].memo, "");
        assert!(ledger::list_exclusions(&conn).unwrap().is_empty());
    }

    #[test]
    fn failed_import_rolls_back() {
        let conn = db::open_memory_database().unwrap();
        store::add_source(&conn, &NewSource::new("Keep me", "shop")).unwrap();

        let dup = r#"{"trip": {"id": "t", "title": "T"}, "sources": [
            {"id": "x", "title": "A", "category": "cafe"},
            {"id": "x", "title": "B", "category": "cafe"}]}"#;
        let data: TripImport = serde_json::from_str(dup).unwrap();
        assert!(import_trip(&conn, &data).is_err());

        let sources = store::list_sources(&conn).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Keep me");
    }
}
