//! CLI `reset` command: clear exclusions (and optionally the catalog) after confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use super::open_session;
use crate::config::DetourConfig;

pub fn reset(config: &DetourConfig, include_catalog: bool, yes: bool) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !yes {
        if include_catalog {
            println!("WARNING: This will delete ALL sources and clear every forgotten category.");
        } else {
            println!("This will clear every forgotten category. Sources are kept.");
        }
        println!("Database: {}", db_path.display());
        print!("\nType YES to confirm: ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim() != "YES" {
            bail!("reset cancelled");
        }
    }

    let session = open_session(config)?;
    let outcome = session.reset(include_catalog)?;

    println!("Cleared {} exclusions.", outcome.cleared_exclusions);
    if include_catalog {
        println!("Deleted {} sources.", outcome.cleared_sources);
    }
    Ok(())
}
