//! Routes tool invocations by name and converts every outcome to text.
//!
//! Failures never escape as protocol errors: each tool's error is rendered
//! into a text item here, at one boundary, for all tools alike.

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::registry::{self, ToolName};
use crate::data::headlines::format_headlines;
use crate::data::NewsSource;
use crate::platforms::MarketSource;
use crate::types::{
    EverythingQuery, HeadlinesQuery, SortBy, ToolContent, ToolDescriptor, ToolError, MAX_PAGE_SIZE,
};

pub type Arguments = Map<String, Value>;

pub struct Dispatcher {
    markets: Arc<dyn MarketSource>,
    news: Arc<dyn NewsSource>,
}

impl Dispatcher {
    pub fn new(markets: Arc<dyn MarketSource>, news: Arc<dyn NewsSource>) -> Self {
        Self { markets, news }
    }

    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        registry::list_tools()
    }

    /// Invoke `name` with `arguments`. Always yields exactly one text item.
    pub async fn call_tool(&self, name: &str, arguments: Option<&Arguments>) -> Vec<ToolContent> {
        let Ok(tool) = name.parse::<ToolName>() else {
            warn!(tool = name, "Unknown tool requested");
            return vec![ToolContent::text(format!("Unknown tool: {name}"))];
        };

        info!(tool = %tool, "Tool call");
        let empty = Arguments::new();
        let args = arguments.unwrap_or(&empty);

        let text = match self.run(tool, args).await {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = %tool, error = %e, "Tool call failed");
                render_error(tool, &e)
            }
        };
        vec![ToolContent::text(text)]
    }

    async fn run(&self, tool: ToolName, args: &Arguments) -> Result<String, ToolError> {
        match tool {
            ToolName::ScrapePolymarket => {
                let markets = self.markets.fetch_markets().await?;
                serde_json::to_string(&markets)
                    .map_err(|e| ToolError::Parse(format!("failed to encode markets: {e}")))
            }
            ToolName::GetNewsHeadlines => {
                let query = headlines_query(args)?;
                let raw = self.news.top_headlines(&query).await?;
                Ok(format_headlines(&raw))
            }
            ToolName::GetNewsEverything => {
                let query = everything_query(args)?;
                let raw = self.news.everything(&query).await?;
                Ok(format_headlines(&raw))
            }
        }
    }
}

fn render_error(tool: ToolName, err: &ToolError) -> String {
    match (tool, err) {
        (ToolName::ScrapePolymarket, e) => format!("Error scraping Polymarket: {e}"),
        (_, e @ ToolError::MissingApiKey { .. }) => e.to_string(),
        (_, ToolError::InvalidArguments(msg)) => format!("Invalid arguments: {msg}"),
        (_, e) => format!("Error fetching news: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

pub fn headlines_query(args: &Arguments) -> Result<HeadlinesQuery, ToolError> {
    let mut query = HeadlinesQuery::new(required_str(args, "query")?);
    if let Some(lang) = optional_str(args, "language")? {
        query.language = lang;
    }
    if let Some(size) = optional_u32(args, "pageSize", 1, MAX_PAGE_SIZE)? {
        query.page_size = size;
    }
    Ok(query)
}

pub fn everything_query(args: &Arguments) -> Result<EverythingQuery, ToolError> {
    let mut query = EverythingQuery::new(required_str(args, "query")?);
    query.language = optional_str(args, "language")?;
    query.from = optional_str(args, "from")?;
    query.to = optional_str(args, "to")?;
    if let Some(size) = optional_u32(args, "pageSize", 1, MAX_PAGE_SIZE)? {
        query.page_size = size;
    }
    if let Some(page) = optional_u32(args, "page", 1, u32::MAX)? {
        query.page = page;
    }
    if let Some(sort) = optional_str(args, "sortBy")? {
        query.sort_by = sort.parse::<SortBy>()?;
    }
    Ok(query)
}

fn required_str(args: &Arguments, key: &str) -> Result<String, ToolError> {
    optional_str(args, key)?
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ToolError::InvalidArguments(format!("missing required argument: {key}")))
}

fn optional_str(args: &Arguments, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ToolError::InvalidArguments(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

/// Accepts integers and numeric strings, since some clients send both.
fn optional_u32(args: &Arguments, key: &str, min: u32, max: u32) -> Result<Option<u32>, ToolError> {
    let raw = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        // JSON clients may send `5.0` for an integer.
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u64)
        }),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match raw {
        Some(n) if n >= u64::from(min) && n <= u64::from(max) => Ok(Some(n as u32)),
        _ => Err(ToolError::InvalidArguments(format!(
            "{key} must be an integer between {min} and {max}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MockNewsSource;
    use crate::platforms::MockMarketSource;
    use crate::types::{MarketSummary, OutcomeProbability};
    use serde_json::json;

    fn args(v: Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    fn dispatcher(markets: MockMarketSource, news: MockNewsSource) -> Dispatcher {
        Dispatcher::new(Arc::new(markets), Arc::new(news))
    }

    async fn call(d: &Dispatcher, name: &str, a: Option<Value>) -> String {
        let a = a.map(args);
        let out = d.call_tool(name, a.as_ref()).await;
        assert_eq!(out.len(), 1);
        out[0].as_text().to_string()
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let d = dispatcher(MockMarketSource::new(), MockNewsSource::new());
        assert_eq!(call(&d, "not-a-tool", None).await, "Unknown tool: not-a-tool");
    }

    #[tokio::test]
    async fn test_list_tools_matches_dispatchable_names() {
        let d = dispatcher(MockMarketSource::new(), MockNewsSource::new());
        for tool in d.list_tools() {
            assert!(tool.name.parse::<ToolName>().is_ok(), "{} not dispatchable", tool.name);
        }
    }

    #[tokio::test]
    async fn test_scrape_success_is_compact_json() {
        let mut markets = MockMarketSource::new();
        markets.expect_fetch_markets().times(1).returning(|| {
            Ok(vec![MarketSummary {
                title: "T".into(),
                url: "https://polymarket.com/market/t".into(),
                outcomes: vec![OutcomeProbability { outcome: "Yes".into(), probability: "0.9".into() }],
            }])
        });
        let d = dispatcher(markets, MockNewsSource::new());
        let text = call(&d, "scrape-polymarket", None).await;
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["outcomes"][0]["probability"], "0.9");
        assert!(!text.contains('\n'));
    }

    #[tokio::test]
    async fn test_scrape_failure_becomes_text() {
        let mut markets = MockMarketSource::new();
        markets
            .expect_fetch_markets()
            .returning(|| Err(ToolError::Parse("__NEXT_DATA__ script not found".into())));
        let d = dispatcher(markets, MockNewsSource::new());
        let text = call(&d, "scrape-polymarket", None).await;
        assert!(text.starts_with("Error scraping Polymarket:"), "{text}");
        assert!(text.contains("__NEXT_DATA__"));
    }

    #[tokio::test]
    async fn test_headlines_defaults_and_formatting() {
        let mut news = MockNewsSource::new();
        news.expect_top_headlines()
            .withf(|q| q.query == "bitcoin" && q.language == "en" && q.page_size == 5)
            .times(1)
            .returning(|_| Ok(json!({"status": "error", "message": "rate limited"})));
        let d = dispatcher(MockMarketSource::new(), news);
        let text = call(&d, "get-news-headlines", Some(json!({"query": "bitcoin"}))).await;
        assert_eq!(text, "NewsAPI error: rate limited");
    }

    #[tokio::test]
    async fn test_everything_passes_arguments() {
        let mut news = MockNewsSource::new();
        news.expect_everything()
            .withf(|q| {
                q.query == "fed"
                    && q.sort_by == SortBy::Relevancy
                    && q.page_size == 10
                    && q.page == 2
                    && q.from.as_deref() == Some("2024-01-01")
                    && q.to.is_none()
            })
            .times(1)
            .returning(|_| Ok(json!({"status": "ok", "articles": []})));
        let d = dispatcher(MockMarketSource::new(), news);
        let text = call(
            &d,
            "get-news-everything",
            Some(json!({"query": "fed", "sortBy": "relevancy", "pageSize": 10, "page": 2, "from": "2024-01-01"})),
        )
        .await;
        assert_eq!(text, "No news articles found.");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_text() {
        let mut news = MockNewsSource::new();
        news.expect_top_headlines().returning(|_| {
            Err(ToolError::MissingApiKey { env_var: "NEWSAPI_KEY".into() })
        });
        let d = dispatcher(MockMarketSource::new(), news);
        let text = call(&d, "get-news-headlines", Some(json!({"query": "x"}))).await;
        assert_eq!(text, "Missing API key: set NEWSAPI_KEY in the environment.");
    }

    #[tokio::test]
    async fn test_news_fetch_failure_is_text() {
        let mut news = MockNewsSource::new();
        news.expect_everything().returning(|_| {
            Err(ToolError::Fetch { url: "https://newsapi.org/v2/everything".into(), message: "timed out".into() })
        });
        let d = dispatcher(MockMarketSource::new(), news);
        let text = call(&d, "get-news-everything", Some(json!({"query": "x"}))).await;
        assert!(text.starts_with("Error fetching news:"), "{text}");
    }

    #[tokio::test]
    async fn test_invalid_arguments_make_no_request() {
        let mut news = MockNewsSource::new();
        news.expect_top_headlines().times(0);
        news.expect_everything().times(0);
        let d = dispatcher(MockMarketSource::new(), news);

        let text = call(&d, "get-news-headlines", None).await;
        assert_eq!(text, "Invalid arguments: missing required argument: query");

        let text = call(&d, "get-news-headlines", Some(json!({"query": "x", "pageSize": 101}))).await;
        assert!(text.starts_with("Invalid arguments: pageSize"), "{text}");

        let text = call(&d, "get-news-everything", Some(json!({"query": "x", "sortBy": "newest"}))).await;
        assert!(text.starts_with("Invalid arguments: sortBy"), "{text}");

        let text = call(&d, "get-news-everything", Some(json!({"query": "x", "page": 0}))).await;
        assert!(text.starts_with("Invalid arguments: page"), "{text}");
    }

    #[test]
    fn test_everything_query_defaults_when_absent() {
        let q = everything_query(&args(json!({"query": "x"}))).unwrap();
        assert_eq!(q, EverythingQuery::new("x"));
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let q = headlines_query(&args(json!({"query": "x", "pageSize": "20"}))).unwrap();
        assert_eq!(q.page_size, 20);
    }

    #[test]
    fn test_integral_floats_accepted() {
        let q = headlines_query(&args(json!({"query": "x", "pageSize": 5.0}))).unwrap();
        assert_eq!(q.page_size, 5);
        let q = everything_query(&args(json!({"query": "x", "page": 2.0}))).unwrap();
        assert_eq!(q.page, 2);

        let err = headlines_query(&args(json!({"query": "x", "pageSize": 5.5}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        let err = headlines_query(&args(json!({"query": "x", "pageSize": -1.0}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = headlines_query(&args(json!({"query": 5}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
