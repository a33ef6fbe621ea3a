//! Polymarket homepage scraper.
//!
//! The homepage is a Next.js app that ships its initial query cache inside
//! `<script id="__NEXT_DATA__">`. We parse that blob instead of calling an
//! API, which means the extraction depends on an undocumented front-end
//! shape. All knowledge of that shape lives in [`events_from_next_data`].
//!
//! Homepage: https://polymarket.com

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::PolymarketConfig;
use crate::platforms::MarketSource;
use crate::types::{MarketSummary, OutcomeProbability, ToolError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const NEXT_DATA_SELECTOR: &str = "script#__NEXT_DATA__";

/// JSON pointer to the event list inside `__NEXT_DATA__`.
const EVENTS_POINTER: &str = "/props/pageProps/dehydratedState/queries/0/state/data/pages/0/events";

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Locate the homepage event list inside the decoded `__NEXT_DATA__` blob.
///
/// Returns `None` when any segment of the path is missing or `events` is
/// not an array. Update this function when Polymarket changes its page.
pub fn events_from_next_data(data: &Value) -> Option<&Vec<Value>> {
    data.pointer(EVENTS_POINTER)?.as_array()
}

/// Pull the `__NEXT_DATA__` script out of a page and decode it.
pub fn next_data_from_html(html: &str) -> Result<Value, ToolError> {
    let selector = Selector::parse(NEXT_DATA_SELECTOR)
        .map_err(|e| ToolError::Parse(format!("invalid selector: {e}")))?;
    let document = Html::parse_document(html);

    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ToolError::Parse("__NEXT_DATA__ script not found".to_string()))?;
    let raw: String = script.text().collect();

    serde_json::from_str(&raw)
        .map_err(|e| ToolError::Parse(format!("malformed __NEXT_DATA__ JSON: {e}")))
}

/// Project at most `limit` market summaries out of a homepage document.
pub fn extract_markets(
    html: &str,
    base_url: &str,
    limit: usize,
) -> Result<Vec<MarketSummary>, ToolError> {
    let data = next_data_from_html(html)?;
    let events = events_from_next_data(&data)
        .ok_or_else(|| ToolError::Parse("unexpected __NEXT_DATA__ shape: events not found".to_string()))?;

    debug!(total = events.len(), limit, "Found homepage events");

    Ok(events
        .iter()
        .take(limit)
        .map(|event| summarize_event(event, base_url))
        .collect())
}

/// Build a summary from one event record.
///
/// Only the first market of the event is read. Events without markets
/// still produce a summary, with no outcomes.
fn summarize_event(event: &Value, base_url: &str) -> MarketSummary {
    let title = event.get("title").and_then(Value::as_str).unwrap_or_default();
    let slug = event.get("slug").and_then(Value::as_str).unwrap_or_default();

    let outcomes = event
        .get("markets")
        .and_then(|m| m.get(0))
        .map(|market| {
            let names = string_list(market.get("outcomes"));
            let prices = string_list(market.get("outcomePrices"));
            names
                .into_iter()
                .zip(prices)
                .map(|(outcome, probability)| OutcomeProbability { outcome, probability })
                .collect()
        })
        .unwrap_or_default();

    MarketSummary {
        title: title.to_string(),
        url: format!("{base_url}/market/{slug}"),
        outcomes,
    }
}

/// Read a list of strings that may be a JSON array or a JSON-encoded
/// string holding an array, e.g. `"[\"Yes\",\"No\"]"`.
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => serde_json::from_str::<Vec<Value>>(s).unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct PolymarketScraper {
    http: Client,
    base_url: String,
    max_events: usize,
}

impl PolymarketScraper {
    pub fn new(config: &PolymarketConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("polymarket-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build Polymarket HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_events: config.max_events,
        })
    }

    #[cfg(test)]
    fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET the homepage HTML.
    async fn fetch_homepage(&self) -> Result<String, ToolError> {
        let fetch_err = |message: String| ToolError::Fetch {
            url: self.base_url.clone(),
            message,
        };

        debug!(url = %self.base_url, "Fetching Polymarket homepage");

        let resp = self
            .http
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        resp.text().await.map_err(|e| fetch_err(e.to_string()))
    }
}

#[async_trait]
impl MarketSource for PolymarketScraper {
    async fn fetch_markets(&self) -> Result<Vec<MarketSummary>, ToolError> {
        let html = self.fetch_homepage().await?;
        let markets = extract_markets(&html, &self.base_url, self.max_events)?;
        info!(count = markets.len(), "Scraped Polymarket markets");
        Ok(markets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
