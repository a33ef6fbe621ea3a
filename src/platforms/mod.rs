//! Prediction-market sources.
//!
//! Defines the `MarketSource` trait and the Polymarket homepage scraper.

pub mod polymarket;

use async_trait::async_trait;

use crate::types::{MarketSummary, ToolError};

/// Abstraction over a source of market summaries.
///
/// Implementors perform at most one outbound request per call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch the current market summaries, in upstream order.
    async fn fetch_markets(&self) -> Result<Vec<MarketSummary>, ToolError>;
}
