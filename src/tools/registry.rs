//! The fixed set of tools this server advertises.
//!
//! `ToolName` is the single source of truth: `list_tools` is generated from
//! `ToolName::ALL` and the dispatcher matches on `ToolName`, so a tool can't
//! be declared without being dispatchable or the other way round.

use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::types::{SortBy, ToolDescriptor, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ScrapePolymarket,
    GetNewsHeadlines,
    GetNewsEverything,
}

impl ToolName {
    /// Declaration order, as returned by `tools/list`.
    pub const ALL: [ToolName; 3] = [
        ToolName::ScrapePolymarket,
        ToolName::GetNewsHeadlines,
        ToolName::GetNewsEverything,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ScrapePolymarket => "scrape-polymarket",
            ToolName::GetNewsHeadlines => "get-news-headlines",
            ToolName::GetNewsEverything => "get-news-everything",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ToolName::ScrapePolymarket => "Scrape latest prediction markets from Polymarket homepage",
            ToolName::GetNewsHeadlines => "Get top news headlines using NewsAPI.org",
            ToolName::GetNewsEverything => {
                "Get news articles using NewsAPI.org's everything endpoint (broader search)."
            }
        }
    }

    pub fn input_schema(&self) -> Value {
        match self {
            ToolName::ScrapePolymarket => json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
            ToolName::GetNewsHeadlines => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keywords or phrase to search for in the news headlines."
                    },
                    "language": {
                        "type": "string",
                        "description": "2-letter ISO-639-1 code of the language you want to get headlines for.",
                        "default": "en"
                    },
                    "pageSize": page_size_schema()
                },
                "required": ["query"]
            }),
            ToolName::GetNewsEverything => json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Keywords or phrase to search for in the news articles."
                    },
                    "language": {
                        "type": "string",
                        "description": "2-letter ISO-639-1 code of the language you want to get articles for. Omit to search all languages."
                    },
                    "pageSize": page_size_schema(),
                    "from": {
                        "type": "string",
                        "description": "A date and optional time for the oldest article allowed. (YYYY-MM-DD)"
                    },
                    "to": {
                        "type": "string",
                        "description": "A date and optional time for the newest article allowed. (YYYY-MM-DD)"
                    },
                    "sortBy": {
                        "type": "string",
                        "description": "The order to sort the articles in. Possible options: relevancy, popularity, publishedAt",
                        "enum": SortBy::ALL.map(|s| s.as_str()),
                        "default": SortBy::PublishedAt.as_str()
                    },
                    "page": {
                        "type": "integer",
                        "description": "Page number of results to return.",
                        "minimum": 1
                    }
                },
                "required": ["query"]
            }),
        }
    }

    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

fn page_size_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Number of results to return per page (max 100)",
        "default": 5,
        "minimum": 1,
        "maximum": MAX_PAGE_SIZE
    })
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// All tool descriptors, in declaration order.
pub fn list_tools() -> Vec<ToolDescriptor> {
    ToolName::ALL.iter().map(ToolName::descriptor).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
