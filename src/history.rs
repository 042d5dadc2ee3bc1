//! Query construction and pagination for stored crawl results

use serde::{Deserialize, Serialize};

/// Default page size of the history view
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Filters and paging for `GET /results`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsQuery {
    pub page: u32,
    pub limit: u32,
    pub query: String,
    pub mode: String,
    pub status: String,
    pub domain: String,
    pub include_content: bool,
}

impl Default for ResultsQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            query: String::new(),
            mode: String::new(),
            status: String::new(),
            domain: String::new(),
            include_content: false,
        }
    }
}

impl ResultsQuery {
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Only results whose host is `domain`
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn include_content(mut self, include: bool) -> Self {
        self.include_content = include;
        self
    }

    /// Query string pairs; blank filters are left out entirely
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.max(1).to_string()),
        ];
        for (key, value) in [
            ("query", &self.query),
            ("mode", &self.mode),
            ("status", &self.status),
            ("domain", &self.domain),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                pairs.push((key, value.to_string()));
            }
        }
        if self.include_content {
            pairs.push(("include_content", "true".to_string()));
        }
        pairs
    }

    /// Query for the following page, if the server reported one
    pub fn next_page(&self, pagination: &Pagination) -> Option<ResultsQuery> {
        pagination.has_next.then(|| self.clone().page(pagination.page + 1))
    }

    /// Query for the preceding page, if any
    pub fn prev_page(&self, pagination: &Pagination) -> Option<ResultsQuery> {
        (pagination.has_prev && pagination.page > 1)
            .then(|| self.clone().page(pagination.page - 1))
    }
}

/// Page metadata as reported by the server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(alias = "pages")]
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn label(&self) -> String {
        format!(
            "page {}/{} ({} results)",
            self.page,
            self.total_pages.max(1),
            self.total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(query: &ResultsQuery) -> Vec<&'static str> {
        query.to_query_pairs().into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn test_empty_filters_are_omitted() {
        let query = ResultsQuery::default().search("").mode("   ").status("").domain(" ");
        assert_eq!(keys(&query), vec!["page", "limit"]);
    }

    #[test]
    fn test_filters_are_trimmed() {
        let query = ResultsQuery::default()
            .search(" rust ")
            .mode("smart")
            .include_content(true);
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("query", "rust".to_string())));
        assert!(pairs.contains(&("mode", "smart".to_string())));
        assert!(pairs.contains(&("include_content", "true".to_string())));
        assert!(!keys(&query).contains(&"status"));
    }

    #[test]
    fn test_domain_filter() {
        let query = ResultsQuery::default().domain(" docs.rs ").status("failed");
        let pairs = query.to_query_pairs();
        assert!(pairs.contains(&("domain", "docs.rs".to_string())));
        assert_eq!(query.clone().page(4).domain, "docs.rs");
    }

    #[test]
    fn test_pagination_navigation() {
        let query = ResultsQuery::default().mode("batch");
        let middle = Pagination {
            page: 2,
            limit: 20,
            total: 60,
            total_pages: 3,
            has_next: true,
            has_prev: true,
        };
        assert_eq!(query.next_page(&middle).unwrap().page, 3);
        assert_eq!(query.prev_page(&middle).unwrap().page, 1);
        assert_eq!(query.next_page(&middle).unwrap().mode, "batch");

        let first = Pagination {
            page: 1,
            has_prev: false,
            has_next: false,
            ..middle
        };
        assert!(query.prev_page(&first).is_none());
        assert!(query.next_page(&first).is_none());
    }

    #[test]
    fn test_pagination_decodes_server_shape() {
        let pagination: Pagination = serde_json::from_value(serde_json::json!({
            "page": 1, "limit": 20, "total": 5, "pages": 1,
            "has_next": false, "has_prev": false
        }))
        .unwrap();
        assert_eq!(pagination.total_pages, 1);
        assert_eq!(pagination.label(), "page 1/1 (5 results)");
    }
}
