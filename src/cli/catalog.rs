//! CLI `import` and `sources` commands.

use anyhow::Result;
use std::path::Path;

use super::open_session;
use crate::catalog::import::read_trip_file;
use crate::catalog::types::category_label;
use crate::config::DetourConfig;

/// Replace the catalog with the sources in a trip file.
pub fn import(config: &DetourConfig, file: &Path) -> Result<()> {
    let data = read_trip_file(file)?;
    let session = open_session(config)?;
    let summary = session.import(&data)?;

    println!("Imported \"{}\" ({})", summary.title, summary.trip_id);
    if !summary.destination.is_empty() {
        println!("Destination:       {}", summary.destination);
    }
    println!("Sources:           {}", summary.source_count);
    for (category, count) in &summary.category_counts {
        println!("  {:<16} {count}", category_label(category));
    }
    if !summary.anchors.is_empty() {
        let anchors: Vec<&str> = summary.anchors.iter().map(|a| a.anchor_id.as_str()).collect();
        println!("Anchors:           {}", anchors.join(", "));
    }
    if summary.cleared_exclusions > 0 {
        println!("Cleared {} exclusions.", summary.cleared_exclusions);
    }
    Ok(())
}

/// Print the catalog, marking sources hidden by an exclusion.
pub fn sources(config: &DetourConfig, category: Option<&str>) -> Result<()> {
    let session = open_session(config)?;
    let sources = session.list_sources(category)?;
    let excluded = session.exclusions()?;

    if sources.is_empty() {
        println!("No sources.");
        return Ok(());
    }

    for s in &sources {
        let hidden = if excluded.contains(&s.category) { " (forgotten)" } else { "" };
        let duration = s
            .declared_duration()
            .map(|d| format!("{d}min"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<38} {:<28} {:<12} {:>6}  p{}{hidden}",
            s.id,
            s.name,
            s.category,
            duration,
            s.effective_priority()
        );
    }
    println!("\n{} sources", sources.len());
    Ok(())
}
