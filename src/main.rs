use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use detour::{cli, config, server};

#[derive(Parser)]
#[command(name = "detour", version, about = "Gap-filling place suggestions for travelers, with category forgetting")]
struct Cli {
    /// Config file (default: ~/.detour/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (stdio transport by default)
    Serve {
        /// Serve MCP over streamable HTTP plus the /api routes
        #[arg(long)]
        http: bool,
        /// Use an in-memory database that is discarded on exit
        #[arg(long)]
        ephemeral: bool,
    },
    /// Replace the catalog with the sources in a trip JSON file
    Import { file: PathBuf },
    /// List catalog sources
    Sources {
        #[arg(long)]
        category: Option<String>,
    },
    /// Suggest places for a block of free time
    Suggest {
        #[arg(long)]
        anchor: Option<String>,
        #[arg(long = "free-time")]
        free_time: u32,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Forget a whole category
    Forget { category: String },
    /// Restore a forgotten category
    Restore { category: String },
    /// List forgotten categories
    Exclusions {
        /// Also show this many recent ledger changes
        #[arg(long, default_value_t = 0)]
        history: usize,
    },
    /// Compare the memory service with the local exclusion list
    Verify {
        #[arg(long)]
        json: bool,
    },
    /// Send a message as the traveler
    Say {
        message: String,
        #[arg(long)]
        json: bool,
    },
    /// Clear forgotten categories (and with --all, the catalog)
    Reset {
        #[arg(long)]
        all: bool,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Run database diagnostics
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::DetourConfig::load_from(path)?,
        None => config::DetourConfig::load()?,
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve { http, ephemeral } => {
            let use_http = http || config.server.transport == "http";
            if use_http {
                server::serve_http(config, ephemeral).await?;
            } else {
                server::serve_stdio(config, ephemeral).await?;
            }
        }
        Command::Import { file } => cli::catalog::import(&config, &file)?,
        Command::Sources { category } => cli::catalog::sources(&config, category.as_deref())?,
        Command::Suggest {
            anchor,
            free_time,
            message,
            json,
        } => cli::suggest::suggest(&config, anchor, free_time, message, json).await?,
        Command::Forget { category } => cli::exclusions::forget(&config, &category).await?,
        Command::Restore { category } => cli::exclusions::restore(&config, &category).await?,
        Command::Exclusions { history } => cli::exclusions::exclusions(&config, history)?,
        Command::Verify { json } => cli::exclusions::verify(&config, json).await?,
        Command::Say { message, json } => cli::suggest::say(&config, &message, json).await?,
        Command::Reset { all, yes } => cli::reset::reset(&config, all, yes)?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
