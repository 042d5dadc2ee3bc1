//! # Sequential Batch Module
//!
//! Runs one crawl per URL, strictly in order, pausing between requests.
//!
//! A failed URL never aborts the run: transport errors and `status: "error"`
//! replies both become an `ErrorRecord` in the report, so the report always
//! holds one item per input URL. Progress snapshots are handed to a caller
//! supplied callback before each request and once more when the run ends.

use std::future::Future;
use std::time::Duration;

use serde::{Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::request::CrawlRequest;
use crate::result::{CrawlOutcome, CrawlResponse, ErrorRecord, normalize};

/// Default pause between two requests of a batch
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

/// Something that can perform a single crawl
pub trait CrawlBackend {
    fn crawl(&self, request: &CrawlRequest) -> impl Future<Output = Result<CrawlResponse>> + Send;
}

/// Transient counters for a running batch
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub current: Option<String>,
    /// Percentage in `0.0..=100.0`
    pub progress: f64,
}

/// Final counters of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    #[serde(serialize_with = "one_decimal")]
    pub success_rate: f64,
}

impl BatchSummary {
    pub fn new(total: usize, completed: usize, failed: usize) -> Self {
        let success_rate = if total == 0 {
            0.0
        } else {
            (completed as f64 / total as f64 * 1000.0).round() / 10.0
        };
        Self {
            total,
            completed,
            failed,
            success_rate,
        }
    }

    pub fn success_rate_label(&self) -> String {
        format!("{:.1}", self.success_rate)
    }
}

fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:.1}", value))
}

/// Outcome for one input URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItem {
    pub url: String,
    pub outcome: CrawlOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

/// Sequential batch driver
pub struct BatchRunner<B> {
    backend: B,
    delay: Duration,
}

impl<B: CrawlBackend> BatchRunner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Crawl `urls` one after another using `template` for every request
    ///
    /// `on_progress` sees a snapshot before each request and a final one with
    /// `progress == 100`.
    #[instrument(skip(self, template, on_progress), fields(total = urls.len()))]
    pub async fn run<F>(
        &self,
        urls: &[String],
        template: &CrawlRequest,
        mut on_progress: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(&BatchProgress),
    {
        if urls.is_empty() {
            return Err(Error::InvalidRequest("batch needs at least one URL".to_string()));
        }

        let total = urls.len();
        let mut progress = BatchProgress {
            total,
            ..BatchProgress::default()
        };
        let mut items = Vec::with_capacity(total);
        let mut succeeded = 0;

        for (i, url) in urls.iter().enumerate() {
            progress.current = Some(url.clone());
            progress.completed = i;
            progress.progress = i as f64 / total as f64 * 100.0;
            on_progress(&progress);

            let outcome = self.crawl_one(url, template).await;
            if outcome.is_success() {
                succeeded += 1;
                debug!(%url, "batch item succeeded");
            } else {
                progress.failed += 1;
                warn!(%url, "batch item failed");
            }
            items.push(BatchItem {
                url: url.clone(),
                outcome,
            });

            if i + 1 < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        progress.current = None;
        progress.completed = total;
        progress.progress = 100.0;
        on_progress(&progress);

        let summary = BatchSummary::new(total, succeeded, progress.failed);
        info!(
            completed = summary.completed,
            failed = summary.failed,
            "batch finished with {}% success",
            summary.success_rate_label()
        );
        Ok(BatchReport { items, summary })
    }

    async fn crawl_one(&self, url: &str, template: &CrawlRequest) -> CrawlOutcome {
        let request = match template.for_url(url) {
            Ok(request) => request,
            Err(e) => return CrawlOutcome::Failure(ErrorRecord::from_error(&e, Some(url))),
        };
        match self.backend.crawl(&request).await {
            Ok(response) => normalize(&response, &request.url),
            Err(e) => CrawlOutcome::Failure(ErrorRecord::from_error(&e, Some(url))),
        }
    }
}
