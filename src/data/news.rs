//! NewsAPI client.
//!
//! API: `https://newsapi.org/v2/top-headlines` and `/v2/everything`
//! Auth: API key via `apiKey` query param. Free tier: 100 req/day.
//!
//! One request per call, no retries. Error payloads (`"status": "error"`)
//! are returned as-is and rendered by the headline formatter.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

use super::NewsSource;
use crate::config::NewsConfig;
use crate::types::{EverythingQuery, HeadlinesQuery, ToolError};

/// Longest slice of a non-JSON error body kept in the error message.
const MAX_ERROR_BODY: usize = 200;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Query pairs for `top-headlines`.
pub fn headlines_params(query: &HeadlinesQuery, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.query.clone()),
        ("language", query.language.clone()),
        ("pageSize", query.page_size.to_string()),
        ("apiKey", api_key.to_string()),
    ]
}

/// Query pairs for `everything`. Optional fields are left out entirely
/// when unset rather than sent empty.
pub fn everything_params(query: &EverythingQuery, api_key: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.query.clone()),
        ("apiKey", api_key.to_string()),
        ("sortBy", query.sort_by.to_string()),
        ("pageSize", query.page_size.to_string()),
        ("page", query.page.to_string()),
    ];

    let optional = [
        ("language", &query.language),
        ("from", &query.from),
        ("to", &query.to),
    ];
    for (key, value) in optional {
        if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
            params.push((key, v.to_string()));
        }
    }

    params
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct NewsClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
    api_key_env: String,
}

impl NewsClient {
    pub fn new(config: &NewsConfig, api_key: Option<SecretString>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("polymarket-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build news HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_key_env: config.api_key_env.clone(),
        })
    }

    #[cfg(test)]
    fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ToolError> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .ok_or_else(|| ToolError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            })
    }

    /// GET `{base_url}/{endpoint}` and decode the body as JSON.
    async fn get_json(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
    ) -> Result<Value, ToolError> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, "NewsAPI request");

        // `without_url` keeps the api key out of error text.
        let fetch_err = |e: reqwest::Error| ToolError::Fetch {
            url: url.clone(),
            message: e.without_url().to_string(),
        };

        let resp = self
            .http
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(fetch_err)?;

        let status = resp.status();
        let body = resp.text().await.map_err(fetch_err)?;

        match serde_json::from_str::<Value>(&body) {
            Ok(value) => {
                info!(endpoint, status = status.as_u16(), "NewsAPI response");
                Ok(value)
            }
            Err(_) if !status.is_success() => Err(ToolError::Upstream {
                status: status.as_u16(),
                message: body.chars().take(MAX_ERROR_BODY).collect(),
            }),
            Err(e) => Err(ToolError::Parse(format!("NewsAPI returned non-JSON body: {e}"))),
        }
    }
}

#[async_trait]
impl NewsSource for NewsClient {
    async fn top_headlines(&self, query: &HeadlinesQuery) -> Result<Value, ToolError> {
        let key = self.api_key()?;
        self.get_json("top-headlines", &headlines_params(query, key)).await
    }

    async fn everything(&self, query: &EverythingQuery) -> Result<Value, ToolError> {
        let key = self.api_key()?;
        self.get_json("everything", &everything_params(query, key)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
