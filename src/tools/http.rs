//! HTTP binding of the tool boundary.
//!
//! The tool server exposes search, scrape and extract as `POST` endpoints and
//! a `GET` health endpoint under a single base URL. Paths default to
//! `/mcp/search`, `/mcp/scrape`, `/mcp/extract` and `/mcp/health` and can be
//! changed in `[tools]`.

use crate::tools::client::{
    ExtractResult, ScrapeResult, SearchHit, SearchResult, ToolClient, ToolFailure, ToolResult,
};
use crate::types::{AppError, Result};
use crate::utils::toml_config::ToolsConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    url: String,
    content_text: String,
    #[serde(default)]
    date_fetched: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    query: &'a str,
    raw_text: &'a str,
    source_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    findings: Vec<ExtractedFinding>,
}

#[derive(Debug, Deserialize)]
struct ExtractedFinding {
    summary: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Tool client talking JSON over HTTP to the tool server.
#[derive(Clone)]
pub struct HttpToolClient {
    client: reqwest::Client,
    base_url: String,
    search_max_results: usize,
    scrape_max_chars: usize,
    search_path: String,
    scrape_path: String,
    extract_path: String,
    health_path: String,
}

impl HttpToolClient {
    pub fn new(config: &ToolsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.resolved_base_url().trim_end_matches('/').to_string(),
            search_max_results: config.search_max_results,
            scrape_max_chars: config.scrape_max_chars,
            search_path: config.search_path.clone(),
            scrape_path: config.scrape_path.clone(),
            extract_path: config.extract_path.clone(),
            health_path: config.health_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> ToolResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(transport_failure)?;
        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ToolResult<T> {
        let response = self
            .client
            .get(self.endpoint(path))
            .send()
            .await
            .map_err(transport_failure)?;
        decode(response).await
    }
}

fn transport_failure(err: reqwest::Error) -> ToolFailure {
    if err.is_timeout() {
        ToolFailure::network(format!("request timed out: {}", err))
    } else {
        ToolFailure::network(err.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ToolResult<T> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_failure)?;

    if !status.is_success() {
        let detail = String::from_utf8_lossy(&body);
        return Err(ToolFailure::network(format!(
            "tool server returned {}: {}",
            status,
            detail.trim()
        )));
    }

    serde_json::from_slice(&body)
        .map_err(|e| ToolFailure::protocol(format!("unparseable tool response: {}", e)))
}

fn parse_fetched_at(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                // Naive timestamps from the tool server are UTC.
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|naive| naive.and_utc())
                    .ok()
            })
    })
    .unwrap_or_else(Utc::now)
}

#[async_trait]
impl ToolClient for HttpToolClient {
    async fn search(&self, query: &str) -> ToolResult<SearchResult> {
        let response: SearchResponse = self
            .post(
                &self.search_path,
                &SearchRequest {
                    query,
                    max_results: self.search_max_results,
                },
            )
            .await?;

        Ok(SearchResult {
            results: response.results,
        })
    }

    async fn scrape(&self, url: &str) -> ToolResult<ScrapeResult> {
        let response: ScrapeResponse = self
            .post(
                &self.scrape_path,
                &ScrapeRequest {
                    url,
                    max_chars: self.scrape_max_chars,
                },
            )
            .await?;

        Ok(ScrapeResult {
            fetched_at: parse_fetched_at(response.date_fetched.as_deref()),
            url: response.url,
            content_text: response.content_text,
        })
    }

    async fn extract(
        &self,
        text: &str,
        context: &str,
        source_url: &str,
    ) -> ToolResult<ExtractResult> {
        let response: ExtractResponse = self
            .post(
                &self.extract_path,
                &ExtractRequest {
                    query: context,
                    raw_text: text,
                    source_url,
                },
            )
            .await?;

        let summary = response
            .findings
            .into_iter()
            .map(|f| f.summary.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ExtractResult { summary })
    }

    async fn health(&self) -> ToolResult<()> {
        let response: HealthResponse = self.get(&self.health_path).await?;
        if response.status.eq_ignore_ascii_case("ok") {
            Ok(())
        } else {
            Err(ToolFailure::protocol(format!(
                "tool server reported status '{}'",
                response.status
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetched_at_formats() {
        let rfc = parse_fetched_at(Some("2024-01-01T10:00:00Z"));
        assert_eq!(rfc.to_rfc3339(), "2024-01-01T10:00:00+00:00");

        let naive = parse_fetched_at(Some("2024-01-01T10:00:00.123456"));
        assert_eq!(naive.timestamp(), rfc.timestamp());

        let before = Utc::now();
        assert!(parse_fetched_at(Some("yesterday")) >= before);
        assert!(parse_fetched_at(None) >= before);
    }

    #[test]
    fn test_base_url_is_normalized() {
        let config = ToolsConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        };
        let client = HttpToolClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("/mcp/search"), "http://localhost:8000/mcp/search");
    }
}
