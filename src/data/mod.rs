//! News data: the NewsAPI client and the headline formatter.

pub mod headlines;
pub mod news;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{EverythingQuery, HeadlinesQuery, ToolError};

/// Abstraction over a news-search backend.
///
/// Both operations return the raw decoded JSON body; typing happens once
/// in [`headlines::NewsResponse`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Query the top-headlines endpoint.
    async fn top_headlines(&self, query: &HeadlinesQuery) -> Result<Value, ToolError>;

    /// Query the everything endpoint (broader search).
    async fn everything(&self, query: &EverythingQuery) -> Result<Value, ToolError>;
}
