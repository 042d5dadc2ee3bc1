//! Crawl API client
//!
//! This module provides the HTTP client for the external crawl service.

mod api;
mod http;
pub mod types;

pub use api::{
    ApiClient, DEFAULT_ANALYTICS_DAYS, DEFAULT_DISCOVER_URLS, MAX_DISCOVER_URLS, MAX_DOMAINS,
    MAX_RECENT,
};
