//! # Terminal User Interface Module
//!
//! Interactive front end for the crawl API.
//!
//! ## Key Components
//!
//! - `app`: Application state and the message handlers that change it
//! - `event`: Terminal, tick and background-task events
//! - `logging`: File-based tracing so log lines do not corrupt the screen
//! - `markdown`: Markdown rendering for the result panel
//! - `ui`: Layout and widgets
//!
//! The loop in `run` owns the `App`. Handlers return an `Action` for any
//! network work; the loop spawns it and the task reports back through the
//! event channel.

pub mod app;
pub mod event;
pub mod logging;
pub mod markdown;
pub mod ui;

use std::io;

use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crawlterm::batch::BatchRunner;
use crawlterm::client::ApiClient;
use crawlterm::config::ClientConfig;
use crawlterm::result::{CrawlOutcome, ErrorRecord, normalize};

use crate::tui::app::{Action, App};
use crate::tui::event::{AppEvent, Event, EventHandler};
use crate::tui::ui::draw;

/// Run the TUI application
pub async fn run(config: ClientConfig, api_key: Option<String>) -> anyhow::Result<()> {
    let client = ApiClient::new(&config)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&config, api_key);
    let mut events = EventHandler::new();
    let sender = events.sender();

    for action in app.startup_actions() {
        dispatch(action, &client, &config, &sender);
    }

    terminal.clear()?;
    let result = async {
        while !app.should_quit {
            terminal.draw(|f| draw(f, &app))?;

            let Some(event) = events.next().await else {
                break;
            };
            if let Some(action) = app.handle_event(event) {
                dispatch(action, &client, &config, &sender);
            }
        }
        anyhow::Ok(())
    }
    .await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    result
}

/// Spawn the network task behind an action
fn dispatch(action: Action, client: &ApiClient, config: &ClientConfig, sender: &UnboundedSender<Event>) {
    let client = client.clone();
    let sender = sender.clone();
    let send = move |event: AppEvent| {
        let _ = sender.send(Event::App(event));
    };

    match action {
        Action::Crawl(request) => {
            tokio::spawn(async move {
                let outcome = match client.crawl(&request).await {
                    Ok(response) => normalize(&response, &request.url),
                    Err(e) => {
                        CrawlOutcome::Failure(ErrorRecord::from_error(&e, Some(request.url.as_str())))
                    }
                };
                send(AppEvent::CrawlFinished(outcome));
            });
        }
        Action::Batch { urls, template } => {
            let runner = BatchRunner::new(client).with_delay(config.batch_delay());
            tokio::spawn(async move {
                info!(count = urls.len(), "starting batch");
                let report = runner
                    .run(&urls, &template, |progress| {
                        send(AppEvent::BatchProgress(progress.clone()))
                    })
                    .await
                    .map_err(|e| ErrorRecord::from_error(&e, None));
                send(AppEvent::BatchFinished(report));
            });
        }
        Action::LoadHistory(query) => {
            tokio::spawn(async move {
                debug!(page = query.page, "loading history");
                let page = client
                    .results(&query)
                    .await
                    .map_err(|e| ErrorRecord::from_error(&e, None));
                send(AppEvent::HistoryLoaded(page));
            });
        }
        Action::LoadResult(id) => {
            tokio::spawn(async move {
                let result = client
                    .result(&id, true)
                    .await
                    .map_err(|e| ErrorRecord::from_error(&e, None));
                send(AppEvent::ResultLoaded(result));
            });
        }
        Action::LoadStats => {
            tokio::spawn(async move {
                let (statistics, health) = tokio::join!(client.statistics(), client.health());
                send(AppEvent::StatsLoaded {
                    statistics: statistics.map_err(|e| ErrorRecord::from_error(&e, None)),
                    health: health.map_err(|e| ErrorRecord::from_error(&e, None)),
                });
            });
        }
    }
}
