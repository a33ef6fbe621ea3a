//! polymarket-mcp — Polymarket markets and NewsAPI headlines as MCP tools
//!
//! Entry point. Loads configuration, initialises logging on stderr, builds
//! the upstream clients and serves JSON-RPC over stdio until the client
//! closes the stream or Ctrl+C is received.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use polymarket_mcp::config;
use polymarket_mcp::data::news::NewsClient;
use polymarket_mcp::platforms::polymarket::PolymarketScraper;
use polymarket_mcp::server::McpServer;
use polymarket_mcp::tools::Dispatcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = config::AppConfig::load_or_default("config.toml")?;
    info!(
        name = %cfg.server.name,
        version = %cfg.server.version,
        polymarket = %cfg.polymarket.base_url,
        newsapi = %cfg.news.base_url,
        "polymarket-mcp starting up"
    );

    // -- Initialise components -------------------------------------------

    let scraper = PolymarketScraper::new(&cfg.polymarket)?;
    let news = NewsClient::new(&cfg.news, cfg.news.resolve_api_key())?;
    let dispatcher = Dispatcher::new(Arc::new(scraper), Arc::new(news));
    let server = McpServer::new(dispatcher, cfg.server.clone());

    // -- Serve -----------------------------------------------------------

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    tokio::select! {
        res = server.serve(stdin, stdout) => res?,
        _ = &mut shutdown => info!("Shutdown signal received."),
    }

    info!("polymarket-mcp shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber. Stdout carries the protocol, so
/// everything goes to stderr.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("polymarket_mcp=info"));

    let json_logging = std::env::var("POLYMARKET_MCP_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(std::io::stderr)
            .init();
    }
}
