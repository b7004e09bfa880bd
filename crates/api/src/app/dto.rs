use serde::{Deserialize, Serialize};

use piestand_core::PieId;
use piestand_infra::PieSummary;

// -------------------------
// Request DTOs
// -------------------------

/// Query string of `GET /pies/recommend`.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendQuery {
    pub username: Option<String>,
    pub budget: Option<String>,
    /// Comma-separated label list.
    pub labels: Option<String>,
}

impl RecommendQuery {
    /// Labels split on commas; empty segments are dropped.
    pub fn labels(&self) -> Vec<String> {
        self.labels
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect()
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PieListing {
    #[serde(flatten)]
    pub summary: PieSummary,
    pub permalink: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub pie_url: String,
}

pub fn pie_url(host: &str, id: PieId) -> String {
    format!("http://{host}/pies/{id}")
}

/// Parse a `:id` path segment, accepting an optional `.json` suffix.
pub fn parse_pie_path(raw: &str) -> Option<PieId> {
    raw.strip_suffix(".json").unwrap_or(raw).parse().ok()
}
