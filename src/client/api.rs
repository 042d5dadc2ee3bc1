//! Client for the crawl API
//!
//! One method per endpoint. Crawls return the decoded `CrawlResponse` so the
//! caller decides how to present application failures; everything else returns
//! the typed body or an `Error`.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{info, instrument};

use crate::batch::CrawlBackend;
use crate::client::http::HttpClient;
use url::form_urlencoded;

use crate::client::types::{
    AnalyticsOverview, DiscoverRequest, DiscoveredUrls, DomainDetail, DomainStats,
    DomainsEnvelope, HealthStatus, Metrics, MetricsEnvelope, ModeInfo, ModesEnvelope,
    PerformanceReport, RecentEnvelope, ResultEnvelope, ResultsPage, Statistics,
    StatisticsEnvelope, StoredResult,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::history::ResultsQuery;
use crate::request::{CrawlRequest, normalize_url};
use crate::result::CrawlResponse;

/// Upper bound the server applies to `GET /recent`
pub const MAX_RECENT: u32 = 50;

/// Upper bound the server applies to `max_urls` of URL discovery
pub const MAX_DISCOVER_URLS: u32 = 25;

/// `max_urls` the server uses when none is sent
pub const DEFAULT_DISCOVER_URLS: u32 = 15;

/// Upper bound the server applies to the domain listing
pub const MAX_DOMAINS: u32 = 50;

/// Reporting window of the analytics endpoints, in days
pub const DEFAULT_ANALYTICS_DAYS: u32 = 7;

/// Client for the crawl API
#[derive(Clone, Debug)]
pub struct ApiClient {
    http_client: HttpClient,
}

#[cfg(test)]
impl ApiClient {
    pub fn set_base_url(&mut self, url: String) {
        self.http_client.set_base_url(url);
    }
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            http_client: HttpClient::new(config.base_url.clone(), config.timeout())?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.http_client.base_url()
    }

    /// Submit a crawl; `smart` goes to `/smart-crawl`, every other mode to `/crawl`
    #[instrument(skip(self, request), fields(url = %request.url, mode = %request.mode))]
    pub async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlResponse> {
        let value: Value = self
            .http_client
            .post_value(request.mode.endpoint(), request)
            .await?;
        let response = CrawlResponse::from_value(value)?;
        info!(success = response.is_success(), "crawl finished");
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        self.http_client.get("health", &[]).await
    }

    #[instrument(skip(self))]
    pub async fn results(&self, query: &ResultsQuery) -> Result<ResultsPage> {
        self.http_client
            .get("results", &query.to_query_pairs())
            .await
    }

    #[instrument(skip(self))]
    pub async fn result(&self, id: &str, include_content: bool) -> Result<StoredResult> {
        let id = id.trim();
        if id.is_empty() {
            return Err(Error::InvalidRequest("a result id is required".to_string()));
        }
        let path = format!("results/{}", path_segment(id));
        let envelope: ResultEnvelope = self
            .http_client
            .get(&path, &[("include_content", include_content.to_string())])
            .await?;
        Ok(envelope.result)
    }

    #[instrument(skip(self))]
    pub async fn statistics(&self) -> Result<Statistics> {
        let envelope: StatisticsEnvelope = self.http_client.get("statistics", &[]).await?;
        Ok(envelope.statistics)
    }

    #[instrument(skip(self))]
    pub async fn modes(&self) -> Result<BTreeMap<String, ModeInfo>> {
        let envelope: ModesEnvelope = self.http_client.get("modes", &[]).await?;
        Ok(envelope.modes)
    }

    #[instrument(skip(self))]
    pub async fn recent(&self, limit: u32, include_content: bool) -> Result<Vec<StoredResult>> {
        let mut query = vec![("limit", limit.clamp(1, MAX_RECENT).to_string())];
        if include_content {
            query.push(("include_content", "true".to_string()));
        }
        let envelope: RecentEnvelope = self.http_client.get("recent", &query).await?;
        Ok(envelope.results)
    }

    /// Ask the server for URLs under `base_url` relevant to `query`
    #[instrument(skip(self))]
    pub async fn discover_urls(
        &self,
        base_url: &str,
        query: &str,
        max_urls: u32,
    ) -> Result<DiscoveredUrls> {
        let body = DiscoverRequest {
            base_url: normalize_url(base_url)?,
            query: query.trim().to_string(),
            max_urls: max_urls.clamp(1, MAX_DISCOVER_URLS),
        };
        let discovered: DiscoveredUrls = self.http_client.post("discover-urls", &body).await?;
        info!(count = discovered.urls.len(), "discovered URLs");
        Ok(discovered)
    }

    #[instrument(skip(self))]
    pub async fn metrics(&self) -> Result<Metrics> {
        let envelope: MetricsEnvelope = self.http_client.get("metrics", &[]).await?;
        Ok(envelope.metrics)
    }

    #[instrument(skip(self))]
    pub async fn analytics_overview(&self, days: u32) -> Result<AnalyticsOverview> {
        self.http_client
            .get("analytics/overview", &[("days", days.max(1).to_string())])
            .await
    }

    /// Busiest domains, at most `MAX_DOMAINS`
    #[instrument(skip(self))]
    pub async fn analytics_domains(&self, limit: u32) -> Result<Vec<DomainStats>> {
        let envelope: DomainsEnvelope = self
            .http_client
            .get(
                "analytics/domains",
                &[("limit", limit.clamp(1, MAX_DOMAINS).to_string())],
            )
            .await?;
        Ok(envelope.domains)
    }

    /// Counters and recent crawls of one domain; unknown domains are a 404
    #[instrument(skip(self))]
    pub async fn analytics_domain(&self, domain: &str) -> Result<DomainDetail> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(Error::InvalidRequest("a domain is required".to_string()));
        }
        self.http_client
            .get("analytics/domains", &[("domain", domain.to_string())])
            .await
    }

    #[instrument(skip(self))]
    pub async fn analytics_performance(&self, days: u32) -> Result<PerformanceReport> {
        let report: PerformanceReport = self
            .http_client
            .get("analytics/performance", &[("days", days.max(1).to_string())])
            .await?;
        Ok(report.with_error_percentages())
    }
}

// Percent-encode one path segment; form encoding writes spaces as `+`.
fn path_segment(raw: &str) -> String {
    form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

impl CrawlBackend for ApiClient {
    async fn crawl(&self, request: &CrawlRequest) -> Result<CrawlResponse> {
        ApiClient::crawl(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchRunner;
    use crate::request::CrawlMode;
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::time::Duration;

    fn client(url: String) -> ApiClient {
        let mut client = ApiClient::new(&ClientConfig::default()).unwrap();
        client.set_base_url(url);
        client
    }

    #[tokio::test]
    async fn test_smart_crawl_routes_to_smart_endpoint() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/smart-crawl")
            .match_body(Matcher::PartialJson(json!({
                "url": "https://example.com",
                "mode": "smart",
                "strategy": "bfs"
            })))
            .with_status(200)
            .with_body(r#"{"status": "success", "ai_synthesis": "summary"}"#)
            .create_async()
            .await;

        let request = CrawlRequest::builder("example.com").build().unwrap();
        let response = client(server.url()).crawl(&request).await.unwrap();
        assert!(matches!(response, CrawlResponse::Single(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_modes_route_to_crawl() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/crawl")
            .match_body(Matcher::PartialJson(json!({"mode": "media"})))
            .with_status(200)
            .with_body(r#"{"status": "error", "error": "blocked"}"#)
            .create_async()
            .await;

        let request = CrawlRequest::builder("https://example.com")
            .mode(CrawlMode::Media)
            .build()
            .unwrap();
        let response = client(server.url()).crawl(&request).await.unwrap();
        assert!(matches!(response, CrawlResponse::Error(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unknown_status_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/smart-crawl")
            .with_status(200)
            .with_body(r#"{"status": "queued"}"#)
            .create_async()
            .await;

        let request = CrawlRequest::builder("https://example.com").build().unwrap();
        let err = client(server.url()).crawl(&request).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_unauthorized_maps_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/statistics")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let err = client(server.url()).statistics().await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status": "healthy", "database": "unhealthy: no route", "version": "2.0.0"}"#)
            .create_async()
            .await;

        let health = client(server.url()).health().await.unwrap();
        assert!(health.service_healthy());
        assert!(!health.database_healthy());
    }

    #[tokio::test]
    async fn test_results_sends_only_set_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/results")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "20".into()),
                Matcher::UrlEncoded("mode".into(), "smart".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "results": [{"id": "r1", "url": "https://a.com", "status": "completed"}],
                    "pagination": {"page": 2, "limit": 20, "total": 21, "pages": 2,
                                   "has_next": false, "has_prev": true}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let query = ResultsQuery::default().page(2).mode("smart").search("  ");
        let page = client(server.url()).results(&query).await.unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.pagination.total_pages, 2);
        assert!(query.prev_page(&page.pagination).is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_result_by_id() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/results/abc")
            .match_query(Matcher::UrlEncoded("include_content".into(), "true".into()))
            .with_status(200)
            .with_body(r#"{"status": "success", "result": {"id": "abc", "url": "https://a.com", "content": "hi"}}"#)
            .create_async()
            .await;

        let result = client(server.url()).result("abc", true).await.unwrap();
        assert_eq!(result.id, "abc");
        assert_eq!(result.content.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_result_id_is_one_path_segment() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/results/a%2Fb%3Fc%20d")
            .match_query(Matcher::UrlEncoded("include_content".into(), "false".into()))
            .with_status(200)
            .with_body(r#"{"status": "success", "result": {"id": "a/b?c d", "url": "https://a.com"}}"#)
            .create_async()
            .await;

        let client = client(server.url());
        let result = client.result(" a/b?c d ", false).await.unwrap();
        assert_eq!(result.id, "a/b?c d");
        mock.assert_async().await;

        let err = client.result("  ", false).await.unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[test]
    fn test_path_segment_escaping() {
        assert_eq!(path_segment("abc-123"), "abc-123");
        assert_eq!(path_segment("../stats"), "..%2Fstats");
        assert_eq!(path_segment("a+b #1"), "a%2Bb%20%231");
    }

    #[tokio::test]
    async fn test_results_domain_filter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/results")
            .match_query(Matcher::UrlEncoded("domain".into(), "example.com".into()))
            .with_status(200)
            .with_body(r#"{"status": "success", "results": [], "pagination": {"page": 1}}"#)
            .create_async()
            .await;

        let query = ResultsQuery::default().domain(" example.com ");
        let page = client(server.url()).results(&query).await.unwrap();
        assert!(page.results.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_discover_urls() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/discover-urls")
            .match_body(Matcher::Json(json!({
                "base_url": "https://docs.example.com",
                "query": "async runtime",
                "max_urls": MAX_DISCOVER_URLS
            })))
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "base_url": "https://docs.example.com",
                    "query": "async runtime",
                    "discovered_count": 2,
                    "urls": ["https://docs.example.com/tokio", "https://docs.example.com/spawn"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let discovered = client(server.url())
            .discover_urls("docs.example.com", " async runtime ", 100)
            .await
            .unwrap();
        assert_eq!(discovered.discovered_count, 2);
        assert_eq!(discovered.urls[1], "https://docs.example.com/spawn");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_discover_urls_rejects_bad_base_url() {
        let err = client("http://127.0.0.1:1".to_string())
            .discover_urls("", "docs", 5)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_discover_urls_validation_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/discover-urls")
            .with_status(400)
            .with_body(r#"{"status": "error", "error": "Query too long"}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .discover_urls("https://a.com", "q", 5)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.to_string(), "API error: 400 - Query too long");
    }

    #[tokio::test]
    async fn test_metrics() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/metrics")
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "metrics": {
                        "cache_size": 3,
                        "total_crawls": 8,
                        "avg_duration": 2.5,
                        "success_rate": 0.75,
                        "features_available": {"enterprise": true, "advanced_stealth": false}
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let metrics = client(server.url()).metrics().await.unwrap();
        assert_eq!(metrics.total_crawls, 8);
        assert_eq!(metrics.success_rate, 0.75);
        assert_eq!(metrics.features_available.get("enterprise"), Some(&true));
    }

    #[tokio::test]
    async fn test_analytics_overview() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/analytics/overview")
            .match_query(Matcher::UrlEncoded("days".into(), "30".into()))
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "period": "Last 30 days",
                    "overview": {"total_crawls": 4, "successful_crawls": 3, "failed_crawls": 1,
                                 "in_progress_crawls": 0, "success_rate": 75.0,
                                 "avg_response_time_ms": null, "total_content_mb": 0},
                    "mode_distribution": [{"mode": "smart", "total": 4, "successful": 3, "success_rate": 75.0}],
                    "daily_activity": [{"date": "2024-05-01", "crawls": 4, "successful": 3, "success_rate": 75.0}],
                    "top_domains": [{"domain": "a.com", "total_crawls": 4, "successful_crawls": 3,
                                     "avg_response_time_ms": 812.5}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let overview = client(server.url()).analytics_overview(30).await.unwrap();
        assert_eq!(overview.period, "Last 30 days");
        assert_eq!(overview.overview.failed_crawls, 1);
        assert_eq!(overview.overview.avg_response_time_ms, None);
        assert_eq!(overview.mode_distribution[0].mode, "smart");
        assert_eq!(overview.top_domains[0].avg_response_time_ms, Some(812.5));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_analytics_domains() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/analytics/domains")
            .match_query(Matcher::UrlEncoded("limit".into(), "50".into()))
            .with_status(200)
            .with_body(r#"{"status": "success", "domains": [{"domain": "a.com", "total_pages_crawled": 9}], "count": 1}"#)
            .create_async()
            .await;
        let missing = server
            .mock("GET", "/analytics/domains")
            .match_query(Matcher::UrlEncoded("domain".into(), "nowhere.org".into()))
            .with_status(404)
            .with_body(r#"{"status": "error", "error": "Domain not found"}"#)
            .create_async()
            .await;

        let client = client(server.url());
        let domains = client.analytics_domains(500).await.unwrap();
        assert_eq!(domains.len(), 1);
        assert_eq!(domains[0].total_crawls, 9);
        list.assert_async().await;

        let err = client.analytics_domain("nowhere.org").await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
        missing.assert_async().await;
    }

    #[tokio::test]
    async fn test_analytics_domain_detail() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/analytics/domains")
            .match_query(Matcher::UrlEncoded("domain".into(), "a.com".into()))
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "domain": "a.com",
                    "analytics": {"domain": "a.com", "total_pages_crawled": 2, "successful_crawls": 2},
                    "recent_crawls": [{"id": "r1", "url": "https://a.com/x", "status": "completed"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let detail = client(server.url()).analytics_domain("a.com").await.unwrap();
        assert_eq!(detail.analytics.successful_crawls, 2);
        assert_eq!(detail.recent_crawls[0].id, "r1");
    }

    #[tokio::test]
    async fn test_analytics_performance_fills_percentages() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/analytics/performance")
            .match_query(Matcher::UrlEncoded("days".into(), "7".into()))
            .with_status(200)
            .with_body(
                json!({
                    "status": "success",
                    "period": "Last 7 days",
                    "response_time_trends": [{"date": "2024-05-01", "avg_response_time_ms": 900.0,
                                              "min_response_time_ms": 100.0, "max_response_time_ms": 2000.0}],
                    "content_size_trends": [],
                    "error_analysis": [{"error_type": "timeout", "count": 3, "percentage": 0},
                                       {"error_type": "403", "count": 1, "percentage": 0}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let report = client(server.url())
            .analytics_performance(DEFAULT_ANALYTICS_DAYS)
            .await
            .unwrap();
        assert_eq!(report.response_time_trends[0].max_response_time_ms, Some(2000.0));
        assert_eq!(report.error_analysis[0].percentage, 75.0);
        assert_eq!(report.error_analysis[1].percentage, 25.0);
    }

    #[tokio::test]
    async fn test_modes_and_recent() {
        let mut server = Server::new_async().await;
        let _modes = server
            .mock("GET", "/modes")
            .with_status(200)
            .with_body(r#"{"status": "success", "modes": {"simple": {"title": "Simple Crawl", "description": "Basic", "fields": ["url"]}}}"#)
            .create_async()
            .await;
        let _recent = server
            .mock("GET", "/recent")
            .match_query(Matcher::UrlEncoded("limit".into(), "50".into()))
            .with_status(200)
            .with_body(r#"{"status": "success", "results": [], "count": 0}"#)
            .create_async()
            .await;

        let client = client(server.url());
        let modes = client.modes().await.unwrap();
        assert_eq!(modes["simple"].title, "Simple Crawl");
        assert!(client.recent(500, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_over_http() {
        let mut server = Server::new_async().await;
        let _ok = server
            .mock("POST", "/smart-crawl")
            .match_body(Matcher::PartialJson(json!({"url": "https://site1.com"})))
            .with_status(200)
            .with_body(r#"{"status": "success", "content": "ok"}"#)
            .create_async()
            .await;
        let _failed = server
            .mock("POST", "/smart-crawl")
            .match_body(Matcher::PartialJson(json!({"url": "https://site2.com"})))
            .with_status(200)
            .with_body(r#"{"status": "error", "error": "timeout"}"#)
            .create_async()
            .await;

        let template = CrawlRequest::builder("https://site1.com").build().unwrap();
        let runner = BatchRunner::new(client(server.url())).with_delay(Duration::ZERO);
        let report = runner
            .run(
                &["https://site1.com".to_string(), "https://site2.com".to_string()],
                &template,
                |_| {},
            )
            .await
            .unwrap();
        assert_eq!(report.summary.completed, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.success_rate_label(), "50.0");
    }
}
