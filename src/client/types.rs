//! Wire types for the crawl API's read endpoints

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::history::Pagination;

/// `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: String,
    pub database: Option<String>,
    pub service: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<String>,
}

impl HealthStatus {
    /// The server reports its database as e.g. `"healthy"` or `"unhealthy: <reason>"`
    pub fn database_healthy(&self) -> bool {
        self.database.as_deref().is_some_and(|db| {
            let db = db.to_ascii_lowercase();
            db.contains("healthy") && !db.contains("unhealthy")
        })
    }

    pub fn service_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Aggregate counters from `GET /statistics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_crawls: u64,
    pub successful_crawls: u64,
    pub failed_crawls: u64,
    pub in_progress_crawls: u64,
    pub success_rate: f64,
    /// Anything else the server reports (per-mode counts, averages...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct StatisticsEnvelope {
    pub statistics: Statistics,
}

/// One persisted crawl as listed by `GET /results`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredResult {
    pub id: String,
    pub url: String,
    pub mode: Option<String>,
    pub status: Option<String>,
    pub title: Option<String>,
    pub domain: Option<String>,
    pub content_length: Option<u64>,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_message: Option<String>,
    pub content: Option<String>,
    pub ai_analysis: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredResult {
    pub fn is_failed(&self) -> bool {
        matches!(self.status.as_deref(), Some("failed") | Some("error"))
    }
}

/// `GET /results` body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsPage {
    pub results: Vec<StoredResult>,
    pub pagination: Pagination,
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResultEnvelope {
    pub result: StoredResult,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RecentEnvelope {
    pub results: Vec<StoredResult>,
}

/// Server description of one crawl mode
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeInfo {
    pub title: String,
    pub description: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ModesEnvelope {
    pub modes: BTreeMap<String, ModeInfo>,
}

/// `POST /discover-urls` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoverRequest {
    pub base_url: String,
    pub query: String,
    pub max_urls: u32,
}

/// URLs the server found under a base URL, most relevant first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveredUrls {
    pub base_url: String,
    pub query: String,
    pub discovered_count: u64,
    pub urls: Vec<String>,
    pub timestamp: Option<String>,
}

/// In-process counters of the crawler behind `GET /metrics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    pub cache_size: u64,
    pub total_crawls: u64,
    /// Seconds
    pub avg_duration: f64,
    /// Ratio in `0.0..=1.0`, unlike the percentage of `Statistics`
    pub success_rate: f64,
    pub features_available: BTreeMap<String, bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct MetricsEnvelope {
    pub metrics: Metrics,
}

/// `GET /analytics/overview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsOverview {
    pub period: String,
    pub overview: OverviewTotals,
    pub mode_distribution: Vec<ModeShare>,
    pub daily_activity: Vec<DailyActivity>,
    pub top_domains: Vec<DomainStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewTotals {
    pub total_crawls: u64,
    pub successful_crawls: u64,
    pub failed_crawls: u64,
    pub in_progress_crawls: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: Option<f64>,
    pub total_content_mb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeShare {
    pub mode: String,
    pub total: u64,
    pub successful: u64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyActivity {
    pub date: String,
    pub crawls: u64,
    pub successful: u64,
    pub success_rate: f64,
}

/// Per-domain counters, as listed by `GET /analytics/domains`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainStats {
    pub domain: String,
    #[serde(alias = "total_pages_crawled")]
    pub total_crawls: u64,
    pub successful_crawls: u64,
    pub avg_response_time_ms: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DomainsEnvelope {
    pub domains: Vec<DomainStats>,
}

/// `GET /analytics/domains?domain=...`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainDetail {
    pub domain: String,
    pub analytics: DomainStats,
    pub recent_crawls: Vec<StoredResult>,
}

/// `GET /analytics/performance`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceReport {
    pub period: String,
    pub response_time_trends: Vec<ResponseTimeTrend>,
    pub content_size_trends: Vec<ContentSizeTrend>,
    pub error_analysis: Vec<ErrorShare>,
}

impl PerformanceReport {
    /// Fill in each error type's share of all listed failures
    ///
    /// The server leaves `percentage` at zero for the client to compute.
    pub fn with_error_percentages(mut self) -> Self {
        let total: u64 = self.error_analysis.iter().map(|e| e.count).sum();
        if total > 0 {
            for error in &mut self.error_analysis {
                error.percentage = (error.count as f64 / total as f64 * 1000.0).round() / 10.0;
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseTimeTrend {
    pub date: String,
    pub avg_response_time_ms: Option<f64>,
    pub min_response_time_ms: Option<f64>,
    pub max_response_time_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSizeTrend {
    pub date: String,
    pub avg_content_length: Option<u64>,
    pub total_content_mb: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorShare {
    pub error_type: String,
    pub count: u64,
    pub percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_database_health() {
        let mut health = HealthStatus {
            status: "healthy".to_string(),
            database: Some("healthy".to_string()),
            ..HealthStatus::default()
        };
        assert!(health.database_healthy());
        assert!(health.service_healthy());

        health.database = Some("unhealthy: connection refused".to_string());
        assert!(!health.database_healthy());

        health.database = None;
        assert!(!health.database_healthy());
    }

    #[test]
    fn test_statistics_keep_extra_fields() {
        let stats: Statistics = serde_json::from_value(json!({
            "total_crawls": 10,
            "successful_crawls": 8,
            "failed_crawls": 2,
            "success_rate": 80.0,
            "mode_distribution": {"smart": 6}
        }))
        .unwrap();
        assert_eq!(stats.in_progress_crawls, 0);
        assert!(stats.extra.contains_key("mode_distribution"));
    }

    #[test]
    fn test_domain_stats_accept_both_count_names() {
        let listed: DomainStats = serde_json::from_value(json!({
            "domain": "example.com",
            "total_pages_crawled": 12,
            "successful_crawls": 10,
            "avg_response_time_ms": null,
            "last_crawled": "2024-05-01"
        }))
        .unwrap();
        assert_eq!(listed.total_crawls, 12);
        assert_eq!(listed.avg_response_time_ms, None);
        assert!(listed.extra.contains_key("last_crawled"));

        let top: DomainStats =
            serde_json::from_value(json!({"domain": "a.com", "total_crawls": 3})).unwrap();
        assert_eq!(top.total_crawls, 3);
    }

    #[test]
    fn test_error_percentages() {
        let report = PerformanceReport {
            error_analysis: vec![
                ErrorShare { error_type: "timeout".into(), count: 2, percentage: 0.0 },
                ErrorShare { error_type: "blocked".into(), count: 1, percentage: 0.0 },
            ],
            ..PerformanceReport::default()
        }
        .with_error_percentages();
        assert_eq!(report.error_analysis[0].percentage, 66.7);
        assert_eq!(report.error_analysis[1].percentage, 33.3);

        let empty = PerformanceReport::default().with_error_percentages();
        assert!(empty.error_analysis.is_empty());
    }
}
