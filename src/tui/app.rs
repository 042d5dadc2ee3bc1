use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::text::Text;
use tracing::{debug, warn};

use crawlterm::batch::{BatchProgress, BatchReport};
use crawlterm::client::types::{HealthStatus, ResultsPage, Statistics, StoredResult};
use crawlterm::config::{ClientConfig, KeyStore, mask_key};
use crawlterm::history::ResultsQuery;
use crawlterm::intent::{IntentMatch, MATCH_CONFIDENCE, detect_intent};
use crawlterm::log::TerminalLog;
use crawlterm::request::{
    CrawlMode, CrawlRequest, FormState, MAX_DEPTH_LIMIT, MAX_PAGES_LIMIT, MAX_STEALTH_LEVEL,
    validate_url_list,
};
use crawlterm::result::{CrawlOutcome, ErrorRecord, value_text};

use crate::tui::event::{AppEvent, Event};
use crate::tui::markdown::markdown_to_ratatui_text;

/// Raw content shown under an AI analysis is cut to this many characters
const RAW_PREVIEW_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Crawl,
    Batch,
    History,
    Stats,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Crawl, Tab::Batch, Tab::History, Tab::Stats];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Crawl => "Crawl",
            Tab::Batch => "Batch",
            Tab::History => "History",
            Tab::Stats => "Stats",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Focused text field on the crawl tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Url,
    Query,
}

/// Work the controller hands to the runtime
#[derive(Debug)]
pub enum Action {
    Crawl(CrawlRequest),
    Batch {
        urls: Vec<String>,
        template: CrawlRequest,
    },
    LoadHistory(ResultsQuery),
    LoadResult(String),
    LoadStats,
}

/// Application state
///
/// All state lives here and only changes through `handle_event`; background
/// work is requested by returning an `Action`.
pub struct App {
    pub tab: Tab,
    pub form: FormState,
    pub focus: Field,
    pub intent: IntentMatch,
    pub log: TerminalLog,
    pub should_quit: bool,
    /// A crawl or batch is in flight
    pub is_loading: bool,
    pub spinner_frame: usize,
    pub api_url: String,
    api_key: Option<String>,
    key_store: KeyStore,
    /// Input buffer of the API key popup, `Some` while it is open
    pub key_prompt: Option<String>,
    pub result_text: Text<'static>,
    pub scroll_position: usize,
    pub batch_progress: Option<BatchProgress>,
    pub batch_report: Option<BatchReport>,
    pub history_query: ResultsQuery,
    pub history_search: String,
    pub history: Option<ResultsPage>,
    pub history_selected: usize,
    pub statistics: Option<Statistics>,
    pub health: Option<HealthStatus>,
}

impl App {
    pub fn new(config: &ClientConfig, api_key: Option<String>) -> Self {
        let mut log = TerminalLog::with_capacity(config.log_capacity);
        log.info(format!("Using crawl API at {}", config.base_url));

        let key_prompt = if api_key.is_none() {
            log.warning("No API key stored; enter one or press Esc to skip");
            Some(String::new())
        } else {
            None
        };

        let form = FormState::default();
        let intent = detect_intent(&form.url);

        Self {
            tab: Tab::Crawl,
            form,
            focus: Field::Url,
            intent,
            log,
            should_quit: false,
            is_loading: false,
            spinner_frame: 0,
            api_url: config.base_url.clone(),
            api_key,
            key_store: config.key_store(),
            key_prompt,
            result_text: markdown_to_ratatui_text(WELCOME),
            scroll_position: 0,
            batch_progress: None,
            batch_report: None,
            history_query: ResultsQuery::default(),
            history_search: String::new(),
            history: None,
            history_selected: 0,
            statistics: None,
            health: None,
        }
    }

    /// Work to start as soon as the UI is up
    pub fn startup_actions(&self) -> Vec<Action> {
        vec![Action::LoadStats]
    }

    pub fn api_key_label(&self) -> String {
        self.api_key
            .as_deref()
            .map(mask_key)
            .unwrap_or_else(|| "not set".to_string())
    }

    pub fn handle_event(&mut self, event: Event) -> Option<Action> {
        match event {
            Event::Terminal(crossterm::event::Event::Key(key)) => self.handle_key_event(key),
            Event::Terminal(crossterm::event::Event::Mouse(mouse)) => {
                match mouse.kind {
                    MouseEventKind::ScrollUp => self.scroll_by(-3),
                    MouseEventKind::ScrollDown => self.scroll_by(3),
                    _ => {}
                }
                None
            }
            Event::Terminal(crossterm::event::Event::Paste(text)) => {
                self.paste(&text);
                None
            }
            Event::Terminal(_) => None,
            Event::Tick => {
                self.tick_spinner();
                None
            }
            Event::App(app_event) => self.handle_app_event(app_event),
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }
        if self.key_prompt.is_some() {
            self.handle_prompt_key(key);
            return None;
        }

        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Tab => return self.switch_tab(self.tab.next()),
            KeyCode::BackTab => return self.switch_tab(self.tab.prev()),
            KeyCode::PageUp => {
                self.scroll_by(-10);
                return None;
            }
            KeyCode::PageDown => {
                self.scroll_by(10);
                return None;
            }
            KeyCode::Char('k') if ctrl => {
                self.key_prompt = Some(String::new());
                return None;
            }
            _ => {}
        }

        match self.tab {
            Tab::Crawl => self.handle_crawl_key(key, ctrl),
            Tab::Batch => self.handle_batch_key(key, ctrl),
            Tab::History => self.handle_history_key(key, ctrl),
            Tab::Stats => match key.code {
                KeyCode::Enter => Some(Action::LoadStats),
                KeyCode::Char('r') if ctrl => Some(Action::LoadStats),
                _ => None,
            },
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        let Some(buffer) = self.key_prompt.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Enter => {
                let key = buffer.trim().to_string();
                self.key_prompt = None;
                if key.is_empty() {
                    self.log.warning("Empty API key ignored");
                    return;
                }
                match self.key_store.save(&key) {
                    Ok(()) => {
                        self.log.success(format!(
                            "API key saved to {}",
                            self.key_store.path().display()
                        ));
                    }
                    Err(e) => {
                        warn!("failed to persist API key: {}", e);
                        self.log
                            .error(format!("Could not save API key ({}); using it for this session", e));
                    }
                }
                self.api_key = Some(key);
            }
            KeyCode::Esc => {
                self.key_prompt = None;
                if self.api_key.is_none() {
                    self.log
                        .warning("Continuing without an API key; AI extraction may be rejected");
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            _ => {}
        }
    }

    fn handle_crawl_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<Action> {
        match key.code {
            KeyCode::Enter => return self.submit_crawl(),
            KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Field::Url => Field::Query,
                    Field::Query => Field::Url,
                };
            }
            KeyCode::Char(c) if ctrl => self.toggle_setting(c),
            KeyCode::Char(c) => {
                match self.focus {
                    Field::Url => self.form.url.push(c),
                    Field::Query => self.form.query.push(c),
                }
                self.update_intent();
            }
            KeyCode::Backspace => {
                match self.focus {
                    Field::Url => self.form.url.pop(),
                    Field::Query => self.form.query.pop(),
                };
                self.update_intent();
            }
            _ => {}
        }
        None
    }

    fn toggle_setting(&mut self, c: char) {
        let form = &mut self.form;
        match c {
            'o' => form.mode = form.mode.next(),
            'a' => form.ai_model = form.ai_model.next(),
            'e' => form.ai_enabled = !form.ai_enabled,
            's' => form.stealth = !form.stealth,
            'l' => form.stealth_level = form.stealth_level % MAX_STEALTH_LEVEL + 1,
            'p' => form.max_pages = form.max_pages % MAX_PAGES_LIMIT + 1,
            'd' => form.max_depth = (form.max_depth + 1) % (MAX_DEPTH_LIMIT + 1),
            't' => form.strategy = form.strategy.toggle(),
            'g' => {
                let detected = detect_intent(&form.url);
                form.apply_intent(detected);
                self.intent = detected;
                self.log.info(format!(
                    "Applied {} defaults: {} mode",
                    detected.intent,
                    self.form.mode.title()
                ));
            }
            _ => {}
        }
    }

    /// Re-run detection after a URL edit; defaults follow a newly matched category
    fn update_intent(&mut self) {
        let detected = detect_intent(&self.form.url);
        if detected.intent == self.intent.intent {
            return;
        }
        self.intent = detected;
        if detected.confidence >= MATCH_CONFIDENCE {
            self.form.apply_intent(detected);
            self.log.info(format!(
                "Looks like a {} page; suggesting {} mode",
                detected.intent,
                self.form.mode.title()
            ));
        }
    }

    fn handle_batch_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<Action> {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.form.batch_urls.push('\n');
            }
            KeyCode::Enter => return self.submit_batch(),
            KeyCode::Char('x') if ctrl => self.form.batch_urls.clear(),
            KeyCode::Char(c) if !ctrl => self.form.batch_urls.push(c),
            KeyCode::Backspace => {
                self.form.batch_urls.pop();
            }
            _ => {}
        }
        None
    }

    fn handle_history_key(&mut self, key: KeyEvent, ctrl: bool) -> Option<Action> {
        match key.code {
            KeyCode::Enter => {
                self.history_query = self
                    .history_query
                    .clone()
                    .search(self.history_search.clone())
                    .page(1);
                return Some(Action::LoadHistory(self.history_query.clone()));
            }
            KeyCode::Up => self.history_selected = self.history_selected.saturating_sub(1),
            KeyCode::Down => {
                let len = self.history.as_ref().map_or(0, |h| h.results.len());
                if self.history_selected + 1 < len {
                    self.history_selected += 1;
                }
            }
            KeyCode::Right => return self.change_page(true),
            KeyCode::Left => return self.change_page(false),
            KeyCode::Char('o') if ctrl => {
                return self.selected_result().map(|r| Action::LoadResult(r.id.clone()));
            }
            KeyCode::Char('f') if ctrl => {
                self.history_query.mode = next_mode_filter(&self.history_query.mode);
                self.history_query.page = 1;
                return Some(Action::LoadHistory(self.history_query.clone()));
            }
            KeyCode::Char(c) if !ctrl => self.history_search.push(c),
            KeyCode::Backspace => {
                self.history_search.pop();
            }
            _ => {}
        }
        None
    }

    fn change_page(&mut self, forward: bool) -> Option<Action> {
        let pagination = self.history.as_ref()?.pagination;
        let query = if forward {
            self.history_query.next_page(&pagination)
        } else {
            self.history_query.prev_page(&pagination)
        }?;
        self.history_query = query.clone();
        Some(Action::LoadHistory(query))
    }

    pub fn selected_result(&self) -> Option<&StoredResult> {
        self.history
            .as_ref()
            .and_then(|h| h.results.get(self.history_selected))
    }

    fn switch_tab(&mut self, tab: Tab) -> Option<Action> {
        self.tab = tab;
        match tab {
            Tab::History if self.history.is_none() => {
                Some(Action::LoadHistory(self.history_query.clone()))
            }
            Tab::Stats if self.statistics.is_none() => Some(Action::LoadStats),
            _ => None,
        }
    }

    fn submit_crawl(&mut self) -> Option<Action> {
        if self.is_loading {
            self.log.warning("A crawl is already running");
            return None;
        }
        match self.form.compose(self.api_key.as_deref()) {
            Ok(request) => {
                self.log.info(format!(
                    "Starting {} crawl of {}",
                    request.mode.title(),
                    request.url
                ));
                self.is_loading = true;
                Some(Action::Crawl(request))
            }
            Err(e) => {
                self.log.error(e.to_string());
                None
            }
        }
    }

    fn submit_batch(&mut self) -> Option<Action> {
        if self.is_loading {
            self.log.warning("A crawl is already running");
            return None;
        }
        let urls = match validate_url_list(&self.form.batch_targets()) {
            Ok(urls) => urls,
            Err(e) => {
                self.log.error(e.to_string());
                return None;
            }
        };

        // Each URL is crawled on its own, so the template uses a single-page mode.
        let mut form = self.form.clone();
        if form.mode == CrawlMode::Batch {
            form.mode = CrawlMode::Smart;
        }
        let template = match form.compose_for(&urls[0], self.api_key.as_deref()) {
            Ok(template) => template,
            Err(e) => {
                self.log.error(e.to_string());
                return None;
            }
        };

        self.log
            .info(format!("Starting batch of {} URLs", urls.len()));
        self.is_loading = true;
        self.batch_report = None;
        self.batch_progress = Some(BatchProgress {
            total: urls.len(),
            ..BatchProgress::default()
        });
        Some(Action::Batch { urls, template })
    }

    fn handle_app_event(&mut self, event: AppEvent) -> Option<Action> {
        match event {
            AppEvent::CrawlFinished(outcome) => {
                self.is_loading = false;
                match &outcome {
                    CrawlOutcome::Success(result) => self.log.success(format!(
                        "Crawled {} ({}, {} words)",
                        result.url, result.formatted_size, result.word_count
                    )),
                    CrawlOutcome::Failure(record) => self.log_record(record),
                }
                self.set_result(&outcome_markdown(&outcome));
            }
            AppEvent::BatchProgress(progress) => {
                if let Some(url) = &progress.current {
                    self.log.info(format!(
                        "[{}/{}] Crawling {}",
                        progress.completed + 1,
                        progress.total,
                        url
                    ));
                }
                self.batch_progress = Some(progress);
            }
            AppEvent::BatchFinished(Ok(report)) => {
                self.is_loading = false;
                for item in &report.items {
                    if let CrawlOutcome::Failure(record) = &item.outcome {
                        self.log.error(format!("{}: {}", item.url, record.error));
                    }
                }
                let summary = &report.summary;
                let message = format!(
                    "Batch finished: {}/{} succeeded ({}%)",
                    summary.completed,
                    summary.total,
                    summary.success_rate_label()
                );
                if summary.failed == 0 {
                    self.log.success(message);
                } else {
                    self.log.warning(message);
                }
                self.set_result(&batch_markdown(&report));
                self.batch_report = Some(report);
            }
            AppEvent::BatchFinished(Err(record)) => {
                self.is_loading = false;
                self.log_record(&record);
            }
            AppEvent::HistoryLoaded(Ok(page)) => {
                self.log.info(format!("Loaded history {}", page.pagination.label()));
                self.history_selected = 0;
                self.history = Some(page);
            }
            AppEvent::ResultLoaded(Ok(result)) => {
                self.set_result(&stored_markdown(&result));
            }
            AppEvent::HistoryLoaded(Err(record)) | AppEvent::ResultLoaded(Err(record)) => {
                self.log_record(&record);
            }
            AppEvent::StatsLoaded { statistics, health } => {
                match statistics {
                    Ok(stats) => self.statistics = Some(stats),
                    Err(record) => self.log_record(&record),
                }
                match health {
                    Ok(health) => {
                        let database = health.database.clone().unwrap_or_else(|| "unknown".into());
                        if health.database_healthy() {
                            self.log.success(format!("API reachable, database {}", database));
                        } else {
                            self.log.warning(format!("API reachable, database {}", database));
                        }
                        self.health = Some(health);
                    }
                    Err(record) => self.log_record(&record),
                }
            }
        }
        None
    }

    fn log_record(&mut self, record: &ErrorRecord) {
        match &record.url {
            Some(url) => self.log.error(format!("{}: {}", url, record.error)),
            None => self.log.error(record.error.clone()),
        }
        if let Some(suggestion) = &record.suggestion {
            self.log.warning(suggestion.clone());
        }
    }

    fn set_result(&mut self, markdown: &str) {
        self.result_text = markdown_to_ratatui_text(markdown);
        self.scroll_position = 0;
    }

    fn paste(&mut self, text: &str) {
        if let Some(buffer) = self.key_prompt.as_mut() {
            buffer.push_str(text.trim());
            return;
        }
        match (self.tab, self.focus) {
            (Tab::Crawl, Field::Url) => {
                self.form.url.push_str(text.trim());
                self.update_intent();
            }
            (Tab::Crawl, Field::Query) => self.form.query.push_str(text),
            (Tab::Batch, _) => self.form.batch_urls.push_str(text),
            (Tab::History, _) => self.history_search.push_str(text.trim()),
            (Tab::Stats, _) => {}
        }
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let max_pos = self.result_text.height().saturating_sub(1);
        self.scroll_position = if delta < 0 {
            self.scroll_position.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.scroll_position.saturating_add(delta as usize).min(max_pos)
        };
    }

    pub fn tick_spinner(&mut self) {
        if self.is_loading {
            self.spinner_frame = (self.spinner_frame + 1) % 8;
        }
    }
}

const WELCOME: &str = "# crawlterm\n\n\
* Type a URL and press **Enter** to crawl it.\n\
* **Up/Down** switches between the URL and the AI query.\n\
* **Tab** cycles through Crawl, Batch, History and Stats.\n\
* **Ctrl+K** sets the API key, **Esc** quits.\n";

fn next_mode_filter(current: &str) -> String {
    if current.is_empty() {
        return CrawlMode::ALL[0].as_str().to_string();
    }
    let position = CrawlMode::ALL.iter().position(|m| m.as_str() == current);
    match position {
        Some(i) if i + 1 < CrawlMode::ALL.len() => CrawlMode::ALL[i + 1].as_str().to_string(),
        _ => String::new(),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}\n\n*... truncated*", &text[..idx]),
        None => text.to_string(),
    }
}

/// Markdown shown in the result panel for a single crawl
pub fn outcome_markdown(outcome: &CrawlOutcome) -> String {
    let result = match outcome {
        CrawlOutcome::Success(result) => result,
        CrawlOutcome::Failure(record) => {
            let mut text = String::from("# Crawl failed\n\n");
            if let Some(url) = &record.url {
                text.push_str(&format!("**URL:** {}\n\n", url));
            }
            text.push_str(&format!("**Error:** {}\n", record.error));
            if let Some(suggestion) = &record.suggestion {
                text.push_str(&format!("\n> {}\n", suggestion));
            }
            return text;
        }
    };

    let mut text = format!(
        "# {}\n\n**Mode:** {} | **Size:** {} | **Words:** {} | **Pages:** {}\n\n\
         **Images:** {} | **Videos:** {} | **Links:** {}\n",
        result.url,
        result.mode,
        result.formatted_size,
        result.word_count,
        result.pages_crawled,
        result.images,
        result.videos,
        result.links,
    );
    if let Some(id) = result.database.as_ref().and_then(|db| db.result_id.as_deref()) {
        text.push_str(&format!("\n**Stored as:** `{}`\n", id));
    }
    if let Some(features) = result.stealth_features.as_ref().and_then(value_text) {
        text.push_str(&format!("\n**Stealth:**\n\n```json\n{}\n```\n", features));
    }
    match &result.ai_analysis {
        Some(analysis) => {
            text.push_str(&format!("\n## AI Analysis\n\n{}\n", analysis));
            if !result.raw_content.trim().is_empty() {
                text.push_str(&format!(
                    "\n## Raw Content\n\n{}\n",
                    truncate_chars(&result.raw_content, RAW_PREVIEW_CHARS)
                ));
            }
        }
        None if result.content.trim().is_empty() => text.push_str("\n*No content returned.*\n"),
        None => text.push_str(&format!("\n## Content\n\n{}\n", result.content)),
    }
    text
}

/// Markdown summary of a finished batch
pub fn batch_markdown(report: &BatchReport) -> String {
    let summary = &report.summary;
    let mut text = format!(
        "# Batch results\n\n**Total:** {} | **Succeeded:** {} | **Failed:** {} | **Success rate:** {}%\n\n",
        summary.total,
        summary.completed,
        summary.failed,
        summary.success_rate_label()
    );
    for (i, item) in report.items.iter().enumerate() {
        match &item.outcome {
            CrawlOutcome::Success(result) => text.push_str(&format!(
                "{}. **{}** ({}, {} words)\n",
                i + 1,
                item.url,
                result.formatted_size,
                result.word_count
            )),
            CrawlOutcome::Failure(record) => {
                text.push_str(&format!("{}. **{}** failed: {}\n", i + 1, item.url, record.error))
            }
        }
    }
    text
}

/// Markdown view of a stored result
pub fn stored_markdown(result: &StoredResult) -> String {
    let mut text = format!("# {}\n\n", result.title.as_deref().unwrap_or(&result.url));
    text.push_str(&format!("**URL:** {}\n\n**ID:** `{}`\n", result.url, result.id));
    for (label, value) in [
        ("Mode", result.mode.as_deref()),
        ("Status", result.status.as_deref()),
        ("Created", result.created_at.as_deref()),
    ] {
        if let Some(value) = value {
            text.push_str(&format!("\n**{}:** {}\n", label, value));
        }
    }
    if let Some(error) = &result.error_message {
        text.push_str(&format!("\n> {}\n", error));
    }
    if let Some(analysis) = result.ai_analysis.as_ref().and_then(value_text) {
        text.push_str(&format!("\n## AI Analysis\n\n{}\n", analysis));
    }
    if let Some(content) = result.content.as_deref().filter(|c| !c.trim().is_empty()) {
        text.push_str(&format!(
            "\n## Content\n\n{}\n",
            truncate_chars(content, RAW_PREVIEW_CHARS)
        ));
    }
    debug!("rendered stored result {}", result.id);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawlterm::batch::BatchSummary;
    use crawlterm::intent::Intent;
    use crawlterm::result::{CrawlResponse, normalize};
    use crossterm::event::{KeyEventState, KeyModifiers};
    use serde_json::json;

    fn app(dir: &tempfile::TempDir, key: Option<&str>) -> App {
        let config = ClientConfig::builder().data_dir(dir.path()).build();
        App::new(&config, key.map(str::to_string))
    }

    fn key(code: KeyCode) -> Event {
        key_with(code, KeyModifiers::NONE)
    }

    fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Terminal(crossterm::event::Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_key_prompt_on_first_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, None);
        assert!(app.key_prompt.is_some());

        type_text(&mut app, "gsk_abcdefgh1234");
        app.handle_event(key(KeyCode::Enter));
        assert!(app.key_prompt.is_none());
        assert_eq!(app.api_key_label(), "gsk_...1234");
        assert_eq!(
            app.key_store.load().unwrap().as_deref(),
            Some("gsk_abcdefgh1234")
        );
    }

    #[test]
    fn test_no_prompt_with_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir, Some("secret-key-123"));
        assert!(app.key_prompt.is_none());
    }

    #[test]
    fn test_url_edit_applies_intent() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        type_text(&mut app, "https://twitter.com/rust");
        assert_eq!(app.intent.intent, Intent::Social);
        assert_eq!(app.form.mode, CrawlMode::Stealth);
    }

    #[test]
    fn test_sitemap_url_submits_single_crawl() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        type_text(&mut app, "https://example.com/sitemap.xml");
        assert_eq!(app.intent.intent, Intent::Batch);
        assert_eq!(app.form.mode, CrawlMode::Smart);

        let action = app.handle_event(key(KeyCode::Enter));
        let Some(Action::Crawl(request)) = action else {
            panic!("expected crawl action");
        };
        assert_eq!(request.url, "https://example.com/sitemap.xml");
    }

    #[test]
    fn test_submit_crawl_sets_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        type_text(&mut app, "example.com");
        let action = app.handle_event(key(KeyCode::Enter));
        match action {
            Some(Action::Crawl(request)) => {
                assert_eq!(request.url, "https://example.com");
                assert_eq!(request.ai_extraction.api_key.as_deref(), Some("k"));
            }
            other => panic!("expected crawl action, got {:?}", other),
        }
        assert!(app.is_loading);
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
    }

    #[test]
    fn test_invalid_url_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        let before = app.log.len();
        assert!(app.handle_event(key(KeyCode::Enter)).is_none());
        assert!(!app.is_loading);
        assert_eq!(app.log.len(), before + 1);
    }

    #[test]
    fn test_batch_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        app.handle_event(key(KeyCode::Tab));
        assert_eq!(app.tab, Tab::Batch);

        type_text(&mut app, "site1.com");
        app.handle_event(key_with(KeyCode::Enter, KeyModifiers::ALT));
        type_text(&mut app, "site2.com");
        let action = app.handle_event(key(KeyCode::Enter));
        let Some(Action::Batch { urls, template }) = action else {
            panic!("expected batch action");
        };
        assert_eq!(urls, vec!["https://site1.com", "https://site2.com"]);
        assert_ne!(template.mode, CrawlMode::Batch);
        assert_eq!(app.batch_progress.as_ref().unwrap().total, 2);

        let ok = normalize(
            &CrawlResponse::from_value(json!({"status": "success", "content": "x"})).unwrap(),
            "https://site1.com",
        );
        let report = BatchReport {
            items: vec![crawlterm::batch::BatchItem {
                url: "https://site1.com".into(),
                outcome: ok,
            }],
            summary: BatchSummary::new(1, 1, 0),
        };
        app.handle_event(Event::App(AppEvent::BatchFinished(Ok(report))));
        assert!(!app.is_loading);
        assert!(app.batch_report.is_some());
    }

    #[test]
    fn test_failure_logs_suggestion() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        app.log.clear();
        let record = ErrorRecord::new(Some("https://a.com"), "timeout", Some("try less".into()));
        app.handle_event(Event::App(AppEvent::CrawlFinished(CrawlOutcome::Failure(record))));
        let levels: Vec<_> = app.log.entries().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![crawlterm::log::LogLevel::Error, crawlterm::log::LogLevel::Warning]
        );
    }

    #[test]
    fn test_history_tab_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(&dir, Some("k"));
        app.handle_event(key(KeyCode::Tab));
        let action = app.handle_event(key(KeyCode::Tab));
        assert!(matches!(action, Some(Action::LoadHistory(_))));

        app.handle_event(Event::App(AppEvent::HistoryLoaded(Ok(ResultsPage::default()))));
        app.handle_event(key(KeyCode::Tab));
        app.handle_event(key(KeyCode::BackTab));
        assert_eq!(app.tab, Tab::History);
        assert!(app.handle_event(key(KeyCode::Right)).is_none());
    }

    #[test]
    fn test_mode_filter_cycle() {
        assert_eq!(next_mode_filter(""), "smart");
        assert_eq!(next_mode_filter("stealth"), "");
    }

    #[test]
    fn test_outcome_markdown_prefers_analysis() {
        let outcome = normalize(
            &CrawlResponse::from_value(json!({
                "status": "success",
                "url": "https://a.com",
                "ai_synthesis": "the synthesis",
                "content": "raw page text"
            }))
            .unwrap(),
            "https://a.com",
        );
        let text = outcome_markdown(&outcome);
        assert!(text.contains("## AI Analysis\n\nthe synthesis"));
        assert!(text.contains("## Raw Content\n\nraw page text"));
    }
}
