//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use crate::config::DetourConfig;
use crate::db;
use crate::remote::api_key_from_env;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &DetourConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `detour import <trip.json>` or `detour serve` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Detour Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!();
    println!("Row counts:");
    println!("  Sources:         {}", report.source_count);
    println!("  Exclusions:      {}", report.exclusion_count);
    println!("  Exclusion log:   {}", report.log_count);
    println!();
    println!("Collaborators:");
    println!(
        "  Memory service:  {}",
        collaborator_status(config.memory.enabled, &config.memory.api_key_env)
    );
    println!(
        "  Chat model:      {}",
        collaborator_status(config.chat.enabled, &config.chat.api_key_env)
    );
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED");
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db {}", db_path.display());
        println!("  2. Or delete the file and re-import your trip: detour import trip.json");
    }

    Ok(())
}

fn collaborator_status(enabled: bool, key_env: &str) -> String {
    match (enabled, api_key_from_env(key_env).is_some()) {
        (false, _) => "disabled".into(),
        (true, true) => "enabled".into(),
        (true, false) => format!("enabled, but ${key_env} is not set (running offline)"),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
