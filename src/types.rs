//! Shared types for the polymarket MCP server.
//!
//! Everything here is built fresh per tool invocation and dropped once the
//! response has been written back to the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Markets
// ---------------------------------------------------------------------------

/// Normalised projection of one Polymarket event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub title: String,
    /// Canonical detail page: `{base_url}/market/{slug}`
    pub url: String,
    /// Outcome/price pairs in upstream order.
    pub outcomes: Vec<OutcomeProbability>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeProbability {
    pub outcome: String,
    /// Price as reported upstream, e.g. "0.65"
    pub probability: String,
}

// ---------------------------------------------------------------------------
// News queries
// ---------------------------------------------------------------------------

/// Sort order accepted by the NewsAPI `everything` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "relevancy")]
    Relevancy,
    #[serde(rename = "popularity")]
    Popularity,
    #[serde(rename = "publishedAt")]
    PublishedAt,
}

impl SortBy {
    pub const ALL: [SortBy; 3] = [SortBy::Relevancy, SortBy::Popularity, SortBy::PublishedAt];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevancy => "relevancy",
            SortBy::Popularity => "popularity",
            SortBy::PublishedAt => "publishedAt",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortBy::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!(
                    "sortBy must be one of relevancy, popularity, publishedAt (got {s:?})"
                ))
            })
    }
}

/// Parameters for the `top-headlines` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlinesQuery {
    pub query: String,
    pub language: String,
    pub page_size: u32,
}

impl HeadlinesQuery {
    pub const DEFAULT_LANGUAGE: &'static str = "en";
    pub const DEFAULT_PAGE_SIZE: u32 = 5;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: Self::DEFAULT_LANGUAGE.to_string(),
            page_size: Self::DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parameters for the `everything` endpoint.
///
/// Optional fields are only sent upstream when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EverythingQuery {
    pub query: String,
    pub language: Option<String>,
    pub page_size: u32,
    pub page: u32,
    pub sort_by: SortBy,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl EverythingQuery {
    pub const DEFAULT_PAGE_SIZE: u32 = 100;
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_SORT: SortBy = SortBy::Popularity;

    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: None,
            page_size: Self::DEFAULT_PAGE_SIZE,
            page: Self::DEFAULT_PAGE,
            sort_by: Self::DEFAULT_SORT,
            from: None,
            to: None,
        }
    }
}

/// Upper bound NewsAPI accepts for `pageSize`.
pub const MAX_PAGE_SIZE: u32 = 100;

// ---------------------------------------------------------------------------
// Tool protocol types
// ---------------------------------------------------------------------------

/// A tool as advertised through `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// One item of a tool result. Only text content is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            ToolContent::Text { text } => text,
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures raised while running a tool.
///
/// None of these reach the transport as protocol errors: the dispatcher
/// renders every variant into a text result.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Fetch failed ({url}): {message}")]
    Fetch { url: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing API key: set {env_var} in the environment.")]
    MissingApiKey { env_var: String },

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    InvalidArguments(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
