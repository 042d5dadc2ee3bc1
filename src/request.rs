//! # Crawl Request Module
//!
//! Types for the JSON payload posted to `/api/crawl` and `/api/smart-crawl`,
//! and the composer that turns the current form state into that payload.
//!
//! ## Key Components
//!
//! - `CrawlMode`: the crawl modes the API understands
//! - `CrawlRequest`: the immutable payload, built with `CrawlRequestBuilder`
//! - `FormState`: editable form fields, composed into a request on submit
//!
//! Server-side limits (page and depth caps, URL length, batch size) are
//! mirrored here so obviously bad requests never leave the client.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::intent::{Intent, IntentMatch, detect_intent, is_url_list};

/// Longest URL the API accepts
pub const MAX_URL_LENGTH: usize = 2048;

/// Largest batch the API accepts
pub const MAX_BATCH_URLS: usize = 10;

/// Upper bound for `max_pages`
pub const MAX_PAGES_LIMIT: u32 = 20;

/// Upper bound for `max_depth`
pub const MAX_DEPTH_LIMIT: u32 = 5;

/// Upper bound for `stealth_level`
pub const MAX_STEALTH_LEVEL: u8 = 8;

/// Stealth level used when the form does not set one
pub const DEFAULT_STEALTH_LEVEL: u8 = 4;

/// Crawl modes understood by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    Simple,
    Advanced,
    Extract,
    Batch,
    Media,
    Interactive,
    Ai,
    Stealth,
    Smart,
}

impl CrawlMode {
    pub const ALL: [CrawlMode; 9] = [
        CrawlMode::Smart,
        CrawlMode::Simple,
        CrawlMode::Advanced,
        CrawlMode::Extract,
        CrawlMode::Batch,
        CrawlMode::Media,
        CrawlMode::Interactive,
        CrawlMode::Ai,
        CrawlMode::Stealth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlMode::Simple => "simple",
            CrawlMode::Advanced => "advanced",
            CrawlMode::Extract => "extract",
            CrawlMode::Batch => "batch",
            CrawlMode::Media => "media",
            CrawlMode::Interactive => "interactive",
            CrawlMode::Ai => "ai",
            CrawlMode::Stealth => "stealth",
            CrawlMode::Smart => "smart",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CrawlMode::Simple => "Simple Crawl",
            CrawlMode::Advanced => "Advanced JS Crawl",
            CrawlMode::Extract => "Content Extract",
            CrawlMode::Batch => "Batch Crawl",
            CrawlMode::Media => "Media Extract",
            CrawlMode::Interactive => "Interactive Session",
            CrawlMode::Ai => "AI-Powered Extract",
            CrawlMode::Stealth => "Definitive Stealth",
            CrawlMode::Smart => "Smart AI Deep Crawl",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CrawlMode::Simple => "Basic scraping with markdown/HTML output",
            CrawlMode::Advanced => "JavaScript execution and dynamic content handling",
            CrawlMode::Extract => "Keyword-based content extraction and filtering",
            CrawlMode::Batch => "Multiple URLs crawled one after another",
            CrawlMode::Media => "Extract images, videos, and downloadable content",
            CrawlMode::Interactive => "Handle dynamic content with user interactions",
            CrawlMode::Ai => "Content extraction with AI analysis",
            CrawlMode::Stealth => "Anti-detection crawling",
            CrawlMode::Smart => "AI-enhanced multi-page deep crawl with synthesis",
        }
    }

    /// API path, relative to the base URL, this mode is posted to
    pub fn endpoint(&self) -> &'static str {
        match self {
            CrawlMode::Smart => "smart-crawl",
            _ => "crawl",
        }
    }

    /// Next mode in `ALL`, wrapping
    pub fn next(&self) -> CrawlMode {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrawlMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        // "intelligent" is an older alias for smart
        if s == "intelligent" {
            return Ok(CrawlMode::Smart);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown crawl mode: {}", s))
    }
}

/// Deep crawl traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Bfs,
    Dfs,
}

impl Strategy {
    pub fn toggle(&self) -> Strategy {
        match self {
            Strategy::Bfs => Strategy::Dfs,
            Strategy::Dfs => Strategy::Bfs,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Bfs => f.write_str("bfs"),
            Strategy::Dfs => f.write_str("dfs"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bfs" => Ok(Strategy::Bfs),
            "dfs" => Ok(Strategy::Dfs),
            other => Err(format!("unknown strategy: {}", other)),
        }
    }
}

/// LLM model names accepted in `ai_extraction.model`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiModel {
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "claude-3")]
    Claude3,
    #[serde(rename = "gemini-pro")]
    GeminiPro,
    #[default]
    #[serde(rename = "groq")]
    Groq,
}

impl AiModel {
    pub const ALL: [AiModel; 5] = [
        AiModel::Groq,
        AiModel::Ollama,
        AiModel::Gpt4,
        AiModel::Claude3,
        AiModel::GeminiPro,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::Ollama => "ollama",
            AiModel::Gpt4 => "gpt-4",
            AiModel::Claude3 => "claude-3",
            AiModel::GeminiPro => "gemini-pro",
            AiModel::Groq => "groq",
        }
    }

    /// Provider string the server resolves this model name to
    pub fn provider(&self) -> &'static str {
        match self {
            AiModel::Ollama => "ollama/llama3.2",
            AiModel::Gpt4 => "openai/gpt-4o",
            AiModel::Claude3 => "anthropic/claude-3-5-sonnet",
            AiModel::GeminiPro => "gemini/gemini-1.5-pro",
            AiModel::Groq => "groq/llama-3.3-70b-versatile",
        }
    }

    pub fn next(&self) -> AiModel {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for AiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiModel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown AI model: {}", s))
    }
}

/// AI extraction settings sent with every request
#[derive(Clone, PartialEq, Serialize)]
pub struct AiExtraction {
    pub model: AiModel,
    pub query: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for AiExtraction {
    fn default() -> Self {
        Self {
            model: AiModel::default(),
            query: String::new(),
            enabled: true,
            api_key: None,
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for AiExtraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiExtraction")
            .field("model", &self.model)
            .field("query", &self.query)
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Payload posted to the crawl endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRequest {
    pub url: String,
    pub mode: CrawlMode,
    pub intent: Intent,
    pub stealth: bool,
    pub stealth_level: u8,
    pub max_pages: u32,
    pub max_depth: u32,
    pub strategy: Strategy,
    pub ai_extraction: AiExtraction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub js: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<u32>,
    /// Newline separated, the way the batch mode reads it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_images: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_videos: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Set when the caller chose the intent instead of detection
    #[serde(skip)]
    intent_pinned: bool,
}

impl CrawlRequest {
    /// Create a new builder for `url`
    pub fn builder(url: impl Into<String>) -> CrawlRequestBuilder {
        CrawlRequestBuilder::new(url)
    }

    /// Same settings, different target
    ///
    /// Used by the batch runner to stamp a shared template onto each URL.
    /// A detected intent is detected again for the new URL; a pinned one is kept.
    pub fn for_url(&self, url: &str) -> Result<CrawlRequest> {
        let mut request = self.clone();
        request.url = normalize_url(url)?;
        if !request.intent_pinned {
            request.intent = detect_intent(&request.url).intent;
        }
        Ok(request)
    }
}

/// Builder for CrawlRequest
#[derive(Debug)]
pub struct CrawlRequestBuilder {
    url: String,
    mode: CrawlMode,
    intent: Option<Intent>,
    stealth: bool,
    stealth_level: u8,
    max_pages: u32,
    max_depth: u32,
    strategy: Strategy,
    ai_extraction: AiExtraction,
    extras: Extras,
}

#[derive(Debug, Default)]
struct Extras {
    extraction_query: Option<String>,
    query: Option<String>,
    format: Option<String>,
    js: Option<String>,
    wait: Option<u32>,
    urls: Option<Vec<String>>,
    concurrent: Option<u32>,
    download_images: Option<bool>,
    download_videos: Option<bool>,
    question: Option<String>,
    user_agent: Option<String>,
}

impl CrawlRequestBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: CrawlMode::Smart,
            intent: None,
            stealth: false,
            stealth_level: DEFAULT_STEALTH_LEVEL,
            max_pages: 5,
            max_depth: 2,
            strategy: Strategy::default(),
            ai_extraction: AiExtraction::default(),
            extras: Extras::default(),
        }
    }

    pub fn mode(mut self, mode: CrawlMode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the detected intent
    pub fn intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn stealth(mut self, stealth: bool) -> Self {
        self.stealth = stealth;
        self
    }

    /// Clamped to `0..=MAX_STEALTH_LEVEL`
    pub fn stealth_level(mut self, level: u8) -> Self {
        self.stealth_level = level.min(MAX_STEALTH_LEVEL);
        self
    }

    /// Clamped to `1..=MAX_PAGES_LIMIT`
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.clamp(1, MAX_PAGES_LIMIT);
        self
    }

    /// Clamped to `0..=MAX_DEPTH_LIMIT`
    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn ai_model(mut self, model: AiModel) -> Self {
        self.ai_extraction.model = model;
        self
    }

    pub fn ai_enabled(mut self, enabled: bool) -> Self {
        self.ai_extraction.enabled = enabled;
        self
    }

    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.ai_extraction.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Extraction instruction; empty strings are ignored
    pub fn extraction_query(mut self, query: impl Into<String>) -> Self {
        let query = query.into().trim().to_string();
        if !query.is_empty() {
            self.ai_extraction.query = query.clone();
            self.extras.extraction_query = Some(query);
        }
        self
    }

    pub fn keyword_query(mut self, query: impl Into<String>) -> Self {
        self.extras.query = Some(query.into());
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.extras.format = Some(format.into());
        self
    }

    pub fn js(mut self, js: impl Into<String>, wait_secs: u32) -> Self {
        self.extras.js = Some(js.into());
        self.extras.wait = Some(wait_secs);
        self
    }

    pub fn urls(mut self, urls: Vec<String>, concurrent: u32) -> Self {
        self.extras.urls = Some(urls);
        self.extras.concurrent = Some(concurrent);
        self
    }

    pub fn media(mut self, images: bool, videos: bool) -> Self {
        self.extras.download_images = Some(images);
        self.extras.download_videos = Some(videos);
        self
    }

    pub fn question(mut self, question: impl Into<String>) -> Self {
        self.extras.question = Some(question.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.extras.user_agent = Some(user_agent.into());
        self
    }

    /// Validate and build the request
    pub fn build(self) -> Result<CrawlRequest> {
        let url = normalize_url(&self.url)?;
        let intent_pinned = self.intent.is_some();
        let intent = self.intent.unwrap_or_else(|| detect_intent(&url).intent);

        let extras = self.extras;
        let urls = match extras.urls {
            Some(list) => Some(validate_url_list(&list)?.join("\n")),
            None => None,
        };

        match self.mode {
            CrawlMode::Extract if extras.query.as_deref().is_none_or(str::is_empty) => {
                return Err(Error::InvalidRequest(
                    "a keyword query is required for extract mode".to_string(),
                ));
            }
            CrawlMode::Ai if extras.extraction_query.is_none() => {
                return Err(Error::InvalidRequest(
                    "an instruction is required for AI mode".to_string(),
                ));
            }
            CrawlMode::Batch if urls.is_none() => {
                return Err(Error::InvalidRequest(
                    "URLs are required for batch mode".to_string(),
                ));
            }
            _ => {}
        }

        Ok(CrawlRequest {
            url,
            mode: self.mode,
            intent,
            stealth: self.stealth || self.mode == CrawlMode::Stealth,
            stealth_level: self.stealth_level,
            max_pages: self.max_pages,
            max_depth: self.max_depth,
            strategy: self.strategy,
            ai_extraction: self.ai_extraction,
            extraction_query: extras.extraction_query,
            query: extras.query,
            format: extras.format,
            js: extras.js,
            wait: extras.wait,
            urls,
            concurrent: extras.concurrent,
            download_images: extras.download_images,
            download_videos: extras.download_videos,
            question: extras.question,
            user_agent: extras.user_agent,
            intent_pinned,
        })
    }
}

/// Editable crawl form
///
/// Every submit composes a fresh `CrawlRequest` from this state.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub url: String,
    pub mode: CrawlMode,
    pub stealth: bool,
    pub stealth_level: u8,
    pub max_pages: u32,
    pub max_depth: u32,
    pub strategy: Strategy,
    pub ai_model: AiModel,
    pub ai_enabled: bool,
    pub query: String,
    /// Batch input, one URL per line
    pub batch_urls: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            url: String::new(),
            mode: CrawlMode::Smart,
            stealth: false,
            stealth_level: DEFAULT_STEALTH_LEVEL,
            max_pages: 5,
            max_depth: 2,
            strategy: Strategy::Bfs,
            ai_model: AiModel::Groq,
            ai_enabled: true,
            query: String::new(),
            batch_urls: String::new(),
        }
    }
}

impl FormState {
    /// Apply the defaults of a detected intent
    ///
    /// The query is only filled in when the user has not typed one. Batch
    /// defaults need a list in the URL field; a single URL (a sitemap, say)
    /// gets the general defaults instead.
    pub fn apply_intent(&mut self, detected: IntentMatch) {
        let intent = match detected.intent {
            Intent::Batch if !is_url_list(&self.url) => Intent::General,
            intent => intent,
        };
        let defaults = intent.defaults();
        self.mode = defaults.mode;
        self.max_pages = defaults.max_pages;
        self.max_depth = defaults.max_depth;
        if self.query.trim().is_empty() {
            if let Some(prompt) = defaults.prompts.first() {
                self.query = (*prompt).to_string();
            }
        }
    }

    /// Parsed batch URLs, in input order
    pub fn batch_url_list(&self) -> Vec<String> {
        split_url_list(&self.batch_urls)
    }

    /// URLs a batch crawl of this form covers
    ///
    /// The batch field wins. Otherwise the URL field is used, split only when
    /// it holds a list.
    pub fn batch_targets(&self) -> Vec<String> {
        let listed = self.batch_url_list();
        if !listed.is_empty() {
            return listed;
        }
        if is_url_list(&self.url) {
            return split_url_list(&self.url);
        }
        let url = self.url.trim();
        if url.is_empty() {
            Vec::new()
        } else {
            vec![url.to_string()]
        }
    }

    /// Compose the request payload for the current form
    ///
    /// When the URL field holds a list, its first entry is the primary URL.
    pub fn compose(&self, api_key: Option<&str>) -> Result<CrawlRequest> {
        if is_url_list(&self.url) {
            let first = split_url_list(&self.url).into_iter().next().unwrap_or_default();
            return self.compose_for(&first, api_key);
        }
        self.compose_for(&self.url, api_key)
    }

    /// Compose a request for `url` using every other field of the form
    pub fn compose_for(&self, url: &str, api_key: Option<&str>) -> Result<CrawlRequest> {
        let mut builder = CrawlRequest::builder(url)
            .mode(self.mode)
            .stealth(self.stealth)
            .stealth_level(self.stealth_level)
            .max_pages(self.max_pages)
            .max_depth(self.max_depth)
            .strategy(self.strategy)
            .ai_model(self.ai_model)
            .ai_enabled(self.ai_enabled)
            .api_key(api_key.map(str::to_string))
            .extraction_query(self.query.clone());

        builder = match self.mode {
            CrawlMode::Simple => builder.format("markdown"),
            CrawlMode::Advanced => builder.js("", 2),
            CrawlMode::Extract => builder.keyword_query(self.query.trim()),
            CrawlMode::Batch => builder.urls(self.batch_targets(), 2),
            CrawlMode::Media => builder.media(true, false),
            CrawlMode::Interactive => {
                let question = if self.query.trim().is_empty() {
                    "Extract main content"
                } else {
                    self.query.trim()
                };
                builder.question(question)
            }
            CrawlMode::Ai | CrawlMode::Stealth | CrawlMode::Smart => builder,
        };

        builder.build()
    }
}

/// Add a scheme when missing and validate the URL
pub fn normalize_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidRequest("URL is required".to_string()));
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(Error::InvalidRequest(format!(
            "URL too long (max {} characters)",
            MAX_URL_LENGTH
        )));
    }

    let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let parsed = Url::parse(&candidate)
        .map_err(|e| Error::InvalidRequest(format!("Invalid URL {}: {}", raw, e)))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidRequest(format!("Invalid URL {}: missing host", raw)));
    }
    Ok(candidate)
}

/// Split free-form input into URLs (newline, comma or whitespace separated)
pub fn split_url_list(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize every URL in a batch, enforcing the size cap
pub fn validate_url_list(urls: &[String]) -> Result<Vec<String>> {
    if urls.is_empty() {
        return Err(Error::InvalidRequest("At least one URL is required".to_string()));
    }
    if urls.len() > MAX_BATCH_URLS {
        return Err(Error::InvalidRequest(format!(
            "Maximum {} URLs allowed",
            MAX_BATCH_URLS
        )));
    }
    urls.iter()
        .enumerate()
        .map(|(i, url)| {
            normalize_url(url).map_err(|e| Error::InvalidRequest(format!("URL {}: {}", i + 1, e)))
        })
        .collect()
}
