//! Polymarket scraper and dispatcher against a local mock homepage.

use std::sync::Arc;

use polymarket_mcp::config::{NewsConfig, PolymarketConfig};
use polymarket_mcp::data::news::NewsClient;
use polymarket_mcp::platforms::polymarket::PolymarketScraper;
use polymarket_mcp::platforms::MarketSource;
use polymarket_mcp::tools::Dispatcher;
use polymarket_mcp::types::{MarketSummary, ToolError};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn homepage(events: Value) -> String {
    let data = json!({
        "buildId": "abc",
        "props": {"pageProps": {"dehydratedState": {"queries": [
            {"queryKey": ["events"], "state": {"data": {"pages": [{"events": events}]}}}
        ]}}}
    });
    format!(
        "<!DOCTYPE html><html><body><div id=\"__next\"></div>\
         <script id=\"__NEXT_DATA__\" type=\"application/json\">{data}</script></body></html>"
    )
}

async fn serve_homepage(body: String, status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn scraper(server: &MockServer) -> PolymarketScraper {
    PolymarketScraper::new(&PolymarketConfig {
        base_url: server.uri(),
        ..PolymarketConfig::default()
    })
    .unwrap()
}

fn dispatcher(server: &MockServer) -> Dispatcher {
    let news = NewsClient::new(&NewsConfig::default(), None).unwrap();
    Dispatcher::new(Arc::new(scraper(server)), Arc::new(news))
}

#[tokio::test]
async fn test_fetch_markets_caps_at_twenty() {
    let events: Vec<Value> = (0..30)
        .map(|i| {
            json!({
                "title": format!("Market {i}"),
                "slug": format!("market-{i}"),
                "markets": [{"outcomes": "[\"Yes\",\"No\"]", "outcomePrices": "[\"0.3\",\"0.7\"]"}]
            })
        })
        .collect();
    let server = serve_homepage(homepage(Value::Array(events)), 200).await;

    let markets = scraper(&server).fetch_markets().await.unwrap();
    assert_eq!(markets.len(), 20);
    assert_eq!(markets[0].title, "Market 0");
    assert_eq!(markets[19].title, "Market 19");
    assert_eq!(markets[3].url, format!("{}/market/market-3", server.uri()));
    assert_eq!(markets[3].outcomes[1].outcome, "No");
    assert_eq!(markets[3].outcomes[1].probability, "0.7");
}

#[tokio::test]
async fn test_http_error_is_fetch_error() {
    let server = serve_homepage("unavailable".into(), 503).await;
    let err = scraper(&server).fetch_markets().await.unwrap_err();
    assert!(matches!(err, ToolError::Fetch { .. }), "{err}");
}

#[tokio::test]
async fn test_dispatch_missing_script_becomes_text() {
    let server = serve_homepage("<html><body>maintenance</body></html>".into(), 200).await;
    let out = dispatcher(&server).call_tool("scrape-polymarket", None).await;
    assert!(out[0].as_text().starts_with("Error scraping Polymarket:"));
}

#[tokio::test]
async fn test_dispatch_returns_market_json() {
    let server = serve_homepage(
        homepage(json!([{
            "title": "Will it rain?",
            "slug": "rain",
            "markets": [{"outcomes": ["Yes", "No", "Maybe"], "outcomePrices": ["0.2", "0.8"]}]
        }])),
        200,
    )
    .await;

    let out = dispatcher(&server).call_tool("scrape-polymarket", None).await;
    let markets: Vec<MarketSummary> = serde_json::from_str(out[0].as_text()).unwrap();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].outcomes.len(), 2);
}

#[tokio::test]
async fn test_dispatch_news_without_key() {
    let server = MockServer::start().await;
    let out = dispatcher(&server)
        .call_tool("get-news-headlines", json!({"query": "x"}).as_object())
        .await;
    assert_eq!(
        out[0].as_text(),
        "Missing API key: set NEWSAPI_KEY in the environment."
    );
}
