//! Gap-filling place suggestions for travelers, with category forgetting.
//!
//! Detour keeps a catalog of candidate places a traveler registered for a trip
//! and, when a block of free time opens up, ranks up to three of them against
//! the remaining time and the current location. The traveler can "forget" a
//! whole category ("enough cafes"); forgotten categories are never suggested
//! again until restored. The local exclusion ledger is authoritative. A remote
//! long-term memory service only shadows it.
//!
//! | Surface | Entry point |
//! |---------|-------------|
//! | MCP over stdio / HTTP | [`server::serve_stdio`], [`server::serve_http`] |
//! | JSON HTTP | `POST /api/suggest`, `GET /api/health` ([`api`]) |
//! | CLI | the `detour` binary ([`cli`]) |
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite database initialization, schema, migrations, and health checks
//! - [`catalog`]: Source storage, listing, and trip import
//! - [`exclusion`]: The exclusion ledger and its memory-service mirror
//! - [`recommend`]: The pure suggestion engine
//! - [`intent`]: Message classification
//! - [`remote`]: Memory service and chat model collaborators
//! - [`session`]: Per-traveler orchestration tying everything together

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod db;
pub mod exclusion;
pub mod intent;
pub mod recommend;
pub mod remote;
pub mod server;
pub mod session;
pub mod tools;
