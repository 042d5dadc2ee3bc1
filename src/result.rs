//! # Crawl Result Module
//!
//! Decoding and normalization of crawl responses.
//!
//! The API answers with loosely shaped JSON whose fields differ per mode and
//! per server version. Responses are decoded at the boundary into the
//! `CrawlResponse` sum type (single success, batch success, or error) and any
//! other shape is rejected with `Error::Decode`. `normalize` then widens a
//! response into a `NormalizedResult` where every display field is present.
//!
//! ## Precedence
//!
//! The AI text is the first non-empty of `ai_synthesis`, `ai_analysis` and
//! `extracted_content`, in that order. `content` shows that text when there is
//! one and the raw page content otherwise; `raw_content` always keeps the raw
//! page content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Storage pointers the API attaches to persisted crawls
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseRef {
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub stored_at: Option<String>,
    #[serde(default)]
    pub content_length: Option<u64>,
}

/// A successful single-URL crawl, as sent by the server
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SingleCrawl {
    pub url: Option<String>,
    pub mode: Option<String>,
    pub crawl_type: Option<String>,
    pub timestamp: Option<String>,
    pub content: Option<String>,
    pub ai_synthesis: Option<Value>,
    pub ai_analysis: Option<Value>,
    pub extracted_content: Option<Value>,
    pub media: Option<Value>,
    pub links: Option<Value>,
    pub metadata: Option<Value>,
    pub stealth_features: Option<Value>,
    pub database: Option<DatabaseRef>,
    pub result_id: Option<String>,
    pub pages_crawled: Option<u64>,
    pub total_content_length: Option<u64>,
    pub individual_pages: Vec<Value>,
}

/// A successful multi-URL crawl, as sent by the server
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchCrawl {
    pub url: Option<String>,
    pub timestamp: Option<String>,
    pub batch_results: Vec<Value>,
    pub results: Vec<Value>,
    pub total_urls: Option<u64>,
    pub successful: Option<u64>,
    pub failed: Option<u64>,
}

impl BatchCrawl {
    fn items(&self) -> &[Value] {
        if self.batch_results.is_empty() {
            &self.results
        } else {
            &self.batch_results
        }
    }
}

/// An application-level failure (`status: "error"`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub suggestion: Option<String>,
    pub url: Option<String>,
    pub code: Option<String>,
    pub result_id: Option<String>,
}

/// Decoded crawl response
#[derive(Debug, Clone)]
pub enum CrawlResponse {
    Single(Box<SingleCrawl>),
    Batch(BatchCrawl),
    Error(ErrorBody),
}

impl CrawlResponse {
    /// Decode a raw JSON body
    ///
    /// `status` must be `"success"` (or `"completed"` for batch replies) or
    /// `"error"`; anything else is a decode error.
    pub fn from_value(value: Value) -> Result<Self> {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Decode("response has no string `status` field".to_string()))?
            .to_string();

        let is_batch = value.get("batch_results").is_some_and(Value::is_array)
            || (value.get("results").is_some_and(Value::is_array)
                && value.get("total_urls").is_some());

        match status.as_str() {
            "error" => Ok(CrawlResponse::Error(decode(value, "error")?)),
            "success" | "completed" if is_batch => Ok(CrawlResponse::Batch(decode(value, "batch")?)),
            "success" => Ok(CrawlResponse::Single(Box::new(decode(value, "crawl")?))),
            other => Err(Error::Decode(format!("unknown response status: {}", other))),
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, CrawlResponse::Error(_))
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, kind: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| Error::Decode(format!("malformed {} response: {}", kind, e)))
}

/// Batch counters reported by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchCounts {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
}

/// Display-oriented crawl result with every field present
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub status: String,
    pub url: String,
    pub mode: String,
    pub crawl_type: Option<String>,
    pub timestamp: Option<String>,
    pub content: String,
    pub raw_content: String,
    pub ai_analysis: Option<String>,
    pub content_length: u64,
    pub formatted_size: String,
    pub word_count: usize,
    pub images: usize,
    pub videos: usize,
    pub links: usize,
    pub pages_crawled: u64,
    pub stealth_features: Option<Value>,
    pub metadata: Value,
    pub database: Option<DatabaseRef>,
    pub batch: Option<BatchCounts>,
}

/// Uniform error shape for transport and application failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ErrorRecord {
    pub fn new(url: Option<&str>, error: impl Into<String>, suggestion: Option<String>) -> Self {
        Self {
            status: "error".to_string(),
            url: url.map(str::to_string),
            error: error.into(),
            suggestion,
        }
    }

    /// Convert a transport or decoding failure
    pub fn from_error(err: &Error, url: Option<&str>) -> Self {
        let suggestion = if err.is_connect() {
            Some("Check that the crawl API server is running and the API URL is correct".to_string())
        } else if err.is_timeout() {
            Some("The crawl took too long; try fewer pages or a smaller depth".to_string())
        } else {
            match err.status_code() {
                Some(401) | Some(403) => {
                    Some("Set a valid API key with `crawlterm key set`".to_string())
                }
                Some(429) => Some("Rate limited by the server; wait a minute and try again".to_string()),
                Some(code) if code >= 500 => {
                    Some("The server failed while crawling; check its logs".to_string())
                }
                _ => match err {
                    Error::Decode(_) | Error::Json(_) => {
                        Some("The API returned an unexpected payload; check server version".to_string())
                    }
                    Error::InvalidRequest(_) => Some("Fix the highlighted input and resubmit".to_string()),
                    _ => None,
                },
            }
        };
        Self::new(url, err.to_string(), suggestion)
    }

    /// Convert an application-level failure body
    pub fn from_body(body: &ErrorBody, url: Option<&str>) -> Self {
        let error = body
            .error
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "Unknown error occurred".to_string());
        let suggestion = body.suggestion.clone().or_else(|| suggest_for_message(&error));
        let url = body.url.as_deref().or(url);
        Self::new(url, error, suggestion)
    }
}

fn suggest_for_message(message: &str) -> Option<String> {
    let lower = message.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        Some("The crawl took too long; try fewer pages or a smaller depth".to_string())
    } else if lower.contains("api key") || lower.contains("api_key") || lower.contains("unauthorized") {
        Some("Set a valid API key with `crawlterm key set`".to_string())
    } else if lower.contains("rate limit") {
        Some("Rate limited by the server; wait a minute and try again".to_string())
    } else {
        None
    }
}

/// Outcome of one crawl, ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CrawlOutcome {
    Success(Box<NormalizedResult>),
    Failure(ErrorRecord),
}

impl CrawlOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CrawlOutcome::Success(_))
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            CrawlOutcome::Success(result) => Some(result.url.as_str()),
            CrawlOutcome::Failure(record) => record.url.as_deref(),
        }
    }
}

/// Widen a decoded response into its display shape
pub fn normalize(response: &CrawlResponse, requested_url: &str) -> CrawlOutcome {
    match response {
        CrawlResponse::Single(single) => {
            CrawlOutcome::Success(Box::new(normalize_single(single, requested_url)))
        }
        CrawlResponse::Batch(batch) => {
            CrawlOutcome::Success(Box::new(normalize_batch(batch, requested_url)))
        }
        CrawlResponse::Error(body) => {
            CrawlOutcome::Failure(ErrorRecord::from_body(body, Some(requested_url)))
        }
    }
}

fn normalize_single(single: &SingleCrawl, requested_url: &str) -> NormalizedResult {
    let raw_content = single.content.clone().unwrap_or_default();
    let ai_analysis = [
        &single.ai_synthesis,
        &single.ai_analysis,
        &single.extracted_content,
    ]
    .into_iter()
    .find_map(|field| field.as_ref().and_then(value_text));

    let content = ai_analysis.clone().unwrap_or_else(|| raw_content.clone());

    let database = match (&single.database, &single.result_id) {
        (Some(db), _) => Some(db.clone()),
        (None, Some(id)) => Some(DatabaseRef {
            result_id: Some(id.clone()),
            ..DatabaseRef::default()
        }),
        (None, None) => None,
    };

    let content_length = database
        .as_ref()
        .and_then(|db| db.content_length)
        .or(single.total_content_length)
        .unwrap_or(content.len() as u64);

    let media = single.media.as_ref();
    let pages_crawled = single
        .pages_crawled
        .unwrap_or(single.individual_pages.len() as u64)
        .max(1);

    NormalizedResult {
        status: "success".to_string(),
        url: single.url.clone().unwrap_or_else(|| requested_url.to_string()),
        mode: single.mode.clone().unwrap_or_else(|| "smart".to_string()),
        crawl_type: single.crawl_type.clone(),
        timestamp: single.timestamp.clone(),
        word_count: word_count(&content),
        formatted_size: format_bytes(content_length),
        content_length,
        ai_analysis,
        content,
        raw_content,
        images: media.map(|m| array_len(m.get("images"))).unwrap_or(0),
        videos: media.map(|m| array_len(m.get("videos"))).unwrap_or(0),
        links: single.links.as_ref().map(count_links).unwrap_or(0),
        pages_crawled,
        stealth_features: single.stealth_features.clone().filter(|v| !v.is_null()),
        metadata: single.metadata.clone().unwrap_or(Value::Null),
        database,
        batch: None,
    }
}

fn normalize_batch(batch: &BatchCrawl, requested_url: &str) -> NormalizedResult {
    let items = batch.items();
    let successful = batch.successful.unwrap_or_else(|| {
        items
            .iter()
            .filter(|item| item.get("status").and_then(Value::as_str) == Some("success"))
            .count() as u64
    });
    let total = batch.total_urls.unwrap_or(items.len() as u64);
    let failed = batch.failed.unwrap_or(total.saturating_sub(successful));

    let content = items
        .iter()
        .map(|item| {
            let url = item.get("url").and_then(Value::as_str).unwrap_or("?");
            match item.get("status").and_then(Value::as_str) {
                Some("success") => {
                    let size = item.get("content_size").and_then(Value::as_u64).unwrap_or(0);
                    format!("- {} ({})", url, format_bytes(size))
                }
                _ => {
                    let error = item.get("error").and_then(Value::as_str).unwrap_or("failed");
                    format!("- {} (error: {})", url, error)
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let content_length: u64 = items
        .iter()
        .filter_map(|item| item.get("content_size").and_then(Value::as_u64))
        .sum();

    NormalizedResult {
        status: "success".to_string(),
        url: batch.url.clone().unwrap_or_else(|| requested_url.to_string()),
        mode: "batch".to_string(),
        timestamp: batch.timestamp.clone(),
        word_count: word_count(&content),
        raw_content: content.clone(),
        content,
        content_length,
        formatted_size: format_bytes(content_length),
        pages_crawled: total,
        links: items
            .iter()
            .filter_map(|item| item.get("links_found").and_then(Value::as_u64))
            .sum::<u64>() as usize,
        images: items
            .iter()
            .filter_map(|item| item.get("media_found").and_then(Value::as_u64))
            .sum::<u64>() as usize,
        batch: Some(BatchCounts {
            total,
            successful,
            failed,
        }),
        ..NormalizedResult::default()
    }
}

/// Text form of a loosely typed field, `None` when empty
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(a) if a.is_empty() => None,
        Value::Object(o) if o.is_empty() => None,
        Value::Array(_) | Value::Object(_) => serde_json::to_string_pretty(value).ok(),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
    }
}

fn array_len(value: Option<&Value>) -> usize {
    value.and_then(Value::as_array).map(Vec::len).unwrap_or(0)
}

// Links come either as a flat list or grouped, e.g. {internal: [..], external: [..]}.
fn count_links(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(groups) => groups.values().filter_map(Value::as_array).map(Vec::len).sum(),
        _ => 0,
    }
}

/// Human readable byte size with one decimal
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / MB)
    }
}

/// Whitespace separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn single(value: Value) -> NormalizedResult {
        let response = CrawlResponse::from_value(value).unwrap();
        match normalize(&response, "https://requested.example") {
            CrawlOutcome::Success(result) => *result,
            CrawlOutcome::Failure(record) => panic!("unexpected failure: {:?}", record),
        }
    }

    #[test]
    fn test_ai_synthesis_wins_over_extracted_content() {
        let result = single(json!({
            "status": "success",
            "extracted_content": "legacy text",
            "ai_synthesis": "fresh synthesis",
            "content": "raw page"
        }));
        assert_eq!(result.ai_analysis.as_deref(), Some("fresh synthesis"));
        assert_eq!(result.content, "fresh synthesis");
        assert_eq!(result.raw_content, "raw page");
    }

    #[test]
    fn test_precedence_skips_empty_fields() {
        let result = single(json!({
            "status": "success",
            "ai_synthesis": "  ",
            "ai_analysis": null,
            "extracted_content": {"prices": [1, 2]}
        }));
        let analysis = result.ai_analysis.unwrap();
        assert!(analysis.contains("\"prices\""));
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let result = single(json!({"status": "success"}));
        assert_eq!(result.url, "https://requested.example");
        assert_eq!(result.content, "");
        assert_eq!(result.ai_analysis, None);
        assert_eq!(result.images, 0);
        assert_eq!(result.links, 0);
        assert_eq!(result.content_length, 0);
        assert_eq!(result.formatted_size, "0 B");
        assert_eq!(result.metadata, Value::Null);
        assert!(result.database.is_none());
    }

    #[test]
    fn test_counts_and_database_pointer() {
        let result = single(json!({
            "status": "success",
            "url": "https://example.com",
            "mode": "media",
            "content": "one two three",
            "media": {"images": [{}, {}], "videos": [{}]},
            "links": {"internal": [{}, {}, {}], "external": [{}]},
            "database": {"result_id": "abc", "content_length": 2048}
        }));
        assert_eq!(result.images, 2);
        assert_eq!(result.videos, 1);
        assert_eq!(result.links, 4);
        assert_eq!(result.word_count, 3);
        assert_eq!(result.content_length, 2048);
        assert_eq!(result.formatted_size, "2.0 KB");
        assert_eq!(
            result.database.unwrap().result_id.as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_error_response_becomes_record() {
        let response = CrawlResponse::from_value(json!({
            "status": "error",
            "error": "timeout"
        }))
        .unwrap();
        assert!(!response.is_success());
        match normalize(&response, "https://site2.com") {
            CrawlOutcome::Failure(record) => {
                assert_eq!(record.status, "error");
                assert_eq!(record.error, "timeout");
                assert_eq!(record.url.as_deref(), Some("https://site2.com"));
                assert!(record.suggestion.is_some());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let err = CrawlResponse::from_value(json!({"status": "pending"})).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        let err = CrawlResponse::from_value(json!({"content": "x"})).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_wrong_field_type_is_rejected() {
        let err = CrawlResponse::from_value(json!({"status": "success", "content": 12})).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_batch_response() {
        let response = CrawlResponse::from_value(json!({
            "status": "completed",
            "total_urls": 2,
            "results": [
                {"url": "https://a.com", "status": "success", "content_size": 10, "links_found": 3},
                {"url": "https://b.com", "status": "error", "error": "dns"}
            ]
        }))
        .unwrap();
        assert!(matches!(response, CrawlResponse::Batch(_)));
        let CrawlOutcome::Success(result) = normalize(&response, "https://a.com") else {
            panic!("expected success");
        };
        assert_eq!(
            result.batch,
            Some(BatchCounts {
                total: 2,
                successful: 1,
                failed: 1
            })
        );
        assert_eq!(result.links, 3);
        assert!(result.content.contains("error: dns"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_error_record_suggestions() {
        let err = Error::Api {
            status_code: 401,
            message: "nope".to_string(),
        };
        let record = ErrorRecord::from_error(&err, Some("https://a.com"));
        assert!(record.suggestion.unwrap().contains("key"));

        let record = ErrorRecord::from_error(&Error::Other("x".to_string()), None);
        assert_eq!(record.suggestion, None);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("suggestion").is_none());
        assert_eq!(json["status"], "error");
    }
}
