//! CLI `forget`, `restore`, `exclusions` and `verify` commands.

use anyhow::Result;

use super::{finish, open_session};
use crate::catalog::types::category_label;
use crate::config::DetourConfig;

pub async fn forget(config: &DetourConfig, category: &str) -> Result<()> {
    let session = open_session(config)?;
    let outcome = session.forget_category(category)?;

    if outcome.changed {
        println!("Forgot \"{}\".", outcome.label);
        if !outcome.affected_sources.is_empty() {
            println!("Hidden: {}", outcome.affected_sources.join(", "));
        }
        println!("{} sources kept in the catalog.", outcome.catalog_size);
    } else {
        println!("\"{}\" was already forgotten.", outcome.label);
    }
    println!("Excluded: [{}]", outcome.exclusions.join(", "));
    finish(&session).await;
    Ok(())
}

pub async fn restore(config: &DetourConfig, category: &str) -> Result<()> {
    let session = open_session(config)?;
    let outcome = session.restore_category(category)?;

    if outcome.changed {
        println!("Restored \"{}\".", outcome.label);
    } else {
        println!("\"{}\" was not forgotten.", outcome.label);
    }
    println!("Excluded: [{}]", outcome.exclusions.join(", "));
    finish(&session).await;
    Ok(())
}

/// Print current exclusions and the recent ledger history.
pub fn exclusions(config: &DetourConfig, history: usize) -> Result<()> {
    let session = open_session(config)?;
    let excluded = session.exclusions()?;

    if excluded.is_empty() {
        println!("No forgotten categories.");
    } else {
        for (i, category) in excluded.iter().enumerate() {
            println!("{}. {} ({category})", i + 1, category_label(category));
        }
    }

    if history > 0 {
        let log = session.exclusion_history(history)?;
        if !log.is_empty() {
            println!("\nRecent changes:");
            for entry in log {
                println!(
                    "  {}  {:<8} {}",
                    entry.created_at,
                    entry.operation,
                    entry.category.as_deref().unwrap_or("*")
                );
            }
        }
    }
    Ok(())
}

/// Compare the memory service with the local ledger.
pub async fn verify(config: &DetourConfig, json: bool) -> Result<()> {
    let session = open_session(config)?;
    let report = session.verify().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if !report.reachable {
        println!(
            "Memory service unreachable: {}",
            report.error.as_deref().unwrap_or("unknown error")
        );
        println!("Local exclusions: [{}]", report.local.join(", "));
        return Ok(());
    }

    println!("Remote items:      {}", report.items);
    println!("Local:             [{}]", report.local.join(", "));
    println!("Confirmed:         [{}]", report.confirmed.join(", "));
    println!("Missing remotely:  [{}]", report.missing_remote.join(", "));
    println!("Stale remotely:    [{}]", report.stale_remote.join(", "));
    println!(
        "Status:            {}",
        if report.in_sync() { "in sync" } else { "diverged (local ledger wins)" }
    );
    Ok(())
}
