//! Rendering of NewsAPI responses into plain text for tool results.

use serde::Deserialize;
use serde_json::Value;

const NOT_AVAILABLE: &str = "N/A";

/// A NewsAPI response, validated once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum NewsResponse {
    Ok { articles: Vec<Article> },
    Error { message: Option<String> },
    /// Null or non-object payload.
    Unavailable,
}

/// One article entry. Fields are kept as raw JSON so a non-string value
/// (a numeric title, say) renders instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Article {
    #[serde(default)]
    pub title: Option<Value>,
    /// Expected shape: `{"id": .., "name": ..}`. Only `name` is shown.
    #[serde(default)]
    pub source: Option<Value>,
    #[serde(default, rename = "publishedAt")]
    pub published_at: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
}

impl NewsResponse {
    /// Classify a raw payload. Fails only when an `"ok"` payload carries
    /// articles of the wrong shape.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        let Some(obj) = value.as_object() else {
            return Ok(NewsResponse::Unavailable);
        };
        if obj.is_empty() {
            return Ok(NewsResponse::Unavailable);
        }

        if obj.get("status").and_then(Value::as_str) != Some("ok") {
            let message = obj.get("message").and_then(|m| match m {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });
            return Ok(NewsResponse::Error { message });
        }

        let articles = match obj.get("articles") {
            None | Some(Value::Null) => Vec::new(),
            Some(raw) => Vec::<Article>::deserialize(raw)?,
        };
        Ok(NewsResponse::Ok { articles })
    }

    pub fn render(&self) -> String {
        match self {
            NewsResponse::Unavailable => "No news data available.".to_string(),
            NewsResponse::Error { message } => format!(
                "NewsAPI error: {}",
                message.as_deref().unwrap_or("Unknown error")
            ),
            NewsResponse::Ok { articles } if articles.is_empty() => {
                "No news articles found.".to_string()
            }
            NewsResponse::Ok { articles } => {
                let mut parts = Vec::with_capacity(articles.len() + 1);
                parts.push("Top News Headlines:\n".to_string());
                parts.extend(articles.iter().map(render_article));
                parts.join("\n")
            }
        }
    }
}

fn render_article(article: &Article) -> String {
    let source = article.source.as_ref().and_then(|s| s.get("name"));
    format!(
        "Title: {}\nSource: {}\nPublished: {}\nURL: {}\n---\n",
        field_text(article.title.as_ref()),
        field_text(source),
        field_text(article.published_at.as_ref()),
        field_text(article.url.as_ref()),
    )
}

/// Display text for one article field: strings verbatim, other JSON
/// values in compact form, missing or null as "N/A".
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => NOT_AVAILABLE.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Render a raw NewsAPI payload as display text. Never fails.
pub fn format_headlines(value: &Value) -> String {
    match NewsResponse::from_value(value) {
        Ok(resp) => resp.render(),
        Err(e) => format!("Error formatting news: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
