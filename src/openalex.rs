//! OpenAlex API Client
//!
//! Two read-only queries per cell, both filtered by publication year and a
//! free-text topic match:
//! - a count query (`per_page=1`) whose `meta.count` is the total match count
//! - a top query sorted by `cited_by_count:desc`, capped at 5 results
//!
//! API Best Practices (per OpenAlex docs):
//! - Use `mailto:email` parameter for polite pool (10 req/s vs 1 req/s)
//! - Filters are comma-separated, so a topic must not contain a comma

use crate::abstracts::InvertedIndex;
use crate::error::{HarvestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

/// OpenAlex API base URL
pub const OPENALEX_API_BASE: &str = "https://api.openalex.org";

/// Number of top-cited works sampled per cell
pub const TOP_N: usize = 5;

/// Upstream source of works for one (topic, year) scope.
#[async_trait]
pub trait WorksSource: Send + Sync {
    /// Total number of works matching the scope.
    async fn count_works(&self, topic: &str, year: i32) -> Result<u64>;

    /// Up to `limit` works for the scope, most-cited first.
    async fn top_cited_works(&self, topic: &str, year: i32, limit: usize) -> Result<Vec<RawWork>>;
}

/// One work record as returned by OpenAlex. Every field may be absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawWork {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub publication_year: Option<i32>,
    pub doi: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub authorships: Option<Vec<RawAuthorship>>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub concepts: Option<Vec<RawConcept>>,
    pub abstract_inverted_index: Option<InvertedIndex>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthorship {
    pub author: Option<RawAuthor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConcept {
    pub display_name: Option<String>,
}

/// Decode a list field entry by entry, dropping entries of the wrong shape.
///
/// A field that is not a list at all decodes as absent.
fn lenient_list<'de, D, T>(deserializer: D) -> std::result::Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// OpenAlex API response structures
#[derive(Debug, Deserialize)]
struct CountResponse {
    meta: OpenAlexMeta,
}

#[derive(Debug, Deserialize)]
struct OpenAlexMeta {
    count: u64,
}

#[derive(Debug, Deserialize)]
struct WorksResponse {
    results: Vec<RawWork>,
}

/// HTTP client for the OpenAlex works endpoint.
#[derive(Debug, Clone)]
pub struct OpenAlexClient {
    client: Client,
    base_url: String,
    mailto: String,
}

impl OpenAlexClient {
    /// Create a client against `base_url` ([`OPENALEX_API_BASE`] for the public API).
    ///
    /// # Arguments
    ///
    /// * `base_url` - API root, without the `/works` path
    /// * `mailto` - Courtesy contact identifier for the polite pool
    pub fn with_base_url(base_url: &str, mailto: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "biblioharvest/{} (mailto:{})",
                env!("CARGO_PKG_VERSION"),
                mailto
            ))
            .build()
            .map_err(|e| HarvestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            mailto: mailto.to_string(),
        })
    }

    /// Query parameters shared by both queries of a cell
    fn scope_params(&self, topic: &str, year: i32) -> Vec<(&'static str, String)> {
        vec![
            ("filter", scope_filter(topic, year)),
            ("mailto", self.mailto.clone()),
        ]
    }

    /// GET `/works` with the given parameters and decode the JSON body.
    async fn get_works<T: DeserializeOwned>(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<T> {
        let url = format!("{}/works", self.base_url);
        debug!(url = %url, params = ?params, "Querying OpenAlex");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(HarvestError::RateLimited);
        }

        if !status.is_success() {
            return Err(HarvestError::Api {
                code: status.as_u16(),
                message: format!("OpenAlex API error: {}", status),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| HarvestError::Parse(format!("Failed to parse OpenAlex response: {}", e)))
    }
}

#[async_trait]
impl WorksSource for OpenAlexClient {
    async fn count_works(&self, topic: &str, year: i32) -> Result<u64> {
        let mut params = self.scope_params(topic, year);
        params.push(("per_page", "1".to_string()));

        let response: CountResponse = self.get_works(&params).await?;
        Ok(response.meta.count)
    }

    async fn top_cited_works(&self, topic: &str, year: i32, limit: usize) -> Result<Vec<RawWork>> {
        let mut params = self.scope_params(topic, year);
        params.push(("sort", "cited_by_count:desc".to_string()));
        params.push(("per_page", limit.to_string()));

        let response: WorksResponse = self.get_works(&params).await?;
        Ok(response.results)
    }
}

/// Build the OpenAlex filter expression for one cell
pub fn scope_filter(topic: &str, year: i32) -> String {
    format!("publication_year:{},default.search:{}", year, topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scope_filter() {
        assert_eq!(
            scope_filter("Smart contract", 2023),
            "publication_year:2023,default.search:Smart contract"
        );
    }

    #[test]
    fn test_base_url_trailing_slash() -> Result<()> {
        let client = OpenAlexClient::with_base_url("http://localhost:1234/", "me@example.com")?;
        assert_eq!(client.base_url, "http://localhost:1234");
        let params = client.scope_params("Blockchain", 2021);
        assert!(params.contains(&("mailto", "me@example.com".to_string())));
        Ok(())
    }

    #[test]
    fn test_raw_work_tolerates_missing_fields() -> serde_json::Result<()> {
        let work: RawWork = serde_json::from_value(json!({}))?;
        assert!(work.display_name.is_none());
        assert!(work.authorships.is_none());
        assert!(work.abstract_inverted_index.is_none());

        let work: RawWork = serde_json::from_value(json!({
            "display_name": null,
            "authorships": [{"author": null}, {}],
            "concepts": [{"display_name": "Computer science", "score": 0.9}],
            "abstract_inverted_index": {"hello": [1], "world": [0]},
            "cited_by_count": 12
        }))?;
        assert_eq!(work.authorships.map(|a| a.len()), Some(2));
        assert_eq!(work.abstract_inverted_index.map(|i| i.len()), Some(2));
        Ok(())
    }

    #[test]
    fn test_badly_shaped_list_entries_are_dropped() -> serde_json::Result<()> {
        let work: RawWork = serde_json::from_value(json!({
            "display_name": "Kept",
            "authorships": [
                {"author": "anonymous"},
                null,
                7,
                {"author": {"display_name": "Ada"}}
            ],
            "concepts": ["Blockchain", {"display_name": "Ledger"}, {"display_name": 3}]
        }))?;
        assert_eq!(work.display_name.as_deref(), Some("Kept"));
        let authors: Vec<_> = work
            .authorships
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.author.and_then(|a| a.display_name))
            .collect();
        assert_eq!(authors, ["Ada"]);
        let concepts: Vec<_> = work
            .concepts
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| c.display_name)
            .collect();
        assert_eq!(concepts, ["Ledger"]);

        let work: RawWork = serde_json::from_value(json!({
            "authorships": "none",
            "concepts": {"display_name": "not a list"}
        }))?;
        assert!(work.authorships.is_none());
        assert!(work.concepts.is_none());
        Ok(())
    }

    #[test]
    fn test_count_response_requires_meta() {
        assert!(serde_json::from_str::<CountResponse>(r#"{"results": []}"#).is_err());
        assert!(serde_json::from_str::<CountResponse>(r#"{"meta": {}}"#).is_err());
        let ok: std::result::Result<CountResponse, _> =
            serde_json::from_str(r#"{"meta": {"count": 42, "per_page": 1}}"#);
        assert!(matches!(ok, Ok(r) if r.meta.count == 42));
    }
}
