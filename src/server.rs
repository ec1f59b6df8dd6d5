//! MCP server initialization for stdio and HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! database, remote collaborators and session into a running server.

use crate::api;
use crate::config::DetourConfig;
use crate::db;
use crate::remote::{chat, memory};
use crate::session::Session;
use crate::tools::DetourTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Open the database (or an in-memory one) and build the shared session.
pub fn build_session(config: &DetourConfig, ephemeral: bool) -> Result<Arc<Session>> {
    let conn = if ephemeral {
        tracing::info!("using in-memory database");
        db::open_memory_database()?
    } else {
        let db_path = config.resolved_db_path();
        let conn = db::open_database(&db_path)?;
        tracing::info!(db = %db_path.display(), "database ready");
        conn
    };

    let memory = memory::create_memory_service(&config.memory);
    let chat = chat::create_chat_service(&config.chat);
    tracing::info!(
        memory = config.memory.enabled,
        chat = config.chat.enabled,
        "collaborators ready"
    );

    let session = Session::new(
        Arc::new(Mutex::new(conn)),
        config.session_context(),
        memory,
        chat,
    );
    Ok(Arc::new(session))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: DetourConfig, ephemeral: bool) -> Result<()> {
    tracing::info!("starting Detour MCP server on stdio");

    let session = build_session(&config, ephemeral)?;
    let tools = DetourTools::new(session);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP, plus the `/api` JSON routes.
pub async fn serve_http(config: DetourConfig, ephemeral: bool) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    tracing::info!(addr = %bind_addr, "starting Detour server on HTTP");

    let session = build_session(&config, ephemeral)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(DetourTools::new(Arc::clone(&session))),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = api::router().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening at http://{bind_addr}/mcp and /api");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
