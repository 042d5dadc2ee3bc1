//! # crawlterm - Terminal client for an AI-assisted crawl API
//!
//! This crate drives an external web crawling service over HTTP. The service
//! does the crawling and the LLM work; the client composes requests, runs
//! batches one URL at a time, and normalizes the loosely shaped responses for
//! display.
//!
//! ## Features
//!
//! - Regex-based intent detection that suggests crawl settings for a URL
//! - Request composition with the server's limits mirrored client-side
//! - Sequential batch crawling with progress snapshots
//! - Result normalization into a single display shape
//! - Paged browsing of stored results, statistics and health checks
//! - URL discovery, crawler metrics and analytics over stored results
//!
//! ## Example
//!
//! ```rust,no_run
//! use crawlterm::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ClientConfig::from_env();
//!     let client = ApiClient::new(&config)?;
//!
//!     let request = CrawlRequest::builder("https://example.com/blog/launch")
//!         .extraction_query("Summarize the announcement")
//!         .build()?;
//!
//!     let response = client.crawl(&request).await?;
//!     match normalize(&response, &request.url) {
//!         CrawlOutcome::Success(result) => println!("{}", result.content),
//!         CrawlOutcome::Failure(record) => eprintln!("{}", record.error),
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod client;
pub mod config;
mod error;
pub mod history;
pub mod intent;
pub mod log;
mod markdown;
pub mod request;
pub mod result;

pub use error::{Error, Result};
pub use markdown::{format_markdown, render_markdown};

/// Re-export of the commonly used types
pub mod prelude {
    pub use crate::batch::{BatchProgress, BatchReport, BatchRunner, BatchSummary, CrawlBackend};
    pub use crate::client::ApiClient;
    pub use crate::config::{ClientConfig, KeyStore};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::history::{Pagination, ResultsQuery};
    pub use crate::intent::{Intent, IntentMatch, detect_intent};
    pub use crate::log::{LogLevel, TerminalLog};
    pub use crate::request::{AiModel, CrawlMode, CrawlRequest, FormState, Strategy};
    pub use crate::result::{CrawlOutcome, CrawlResponse, ErrorRecord, NormalizedResult, normalize};
}
