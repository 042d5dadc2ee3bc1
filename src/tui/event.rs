use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::warn;

use crawlterm::batch::{BatchProgress, BatchReport};
use crawlterm::client::types::{HealthStatus, ResultsPage, Statistics, StoredResult};
use crawlterm::result::{CrawlOutcome, ErrorRecord};

/// The frequency at which tick events are emitted
const TICK_FPS: f64 = 15.0;

/// Events that can occur in the application
#[derive(Debug)]
pub enum Event {
    /// Terminal events (key presses, mouse events, etc.)
    Terminal(CrosstermEvent),
    /// Regular tick for animations
    Tick,
    /// Results of background work
    App(AppEvent),
}

/// Messages sent back by network tasks
#[derive(Debug)]
pub enum AppEvent {
    CrawlFinished(CrawlOutcome),
    BatchProgress(BatchProgress),
    BatchFinished(Result<BatchReport, ErrorRecord>),
    HistoryLoaded(Result<ResultsPage, ErrorRecord>),
    ResultLoaded(Result<StoredResult, ErrorRecord>),
    StatsLoaded {
        statistics: Result<Statistics, ErrorRecord>,
        health: Result<HealthStatus, ErrorRecord>,
    },
}

/// Event handler that merges terminal input, ticks and task messages
pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(pump_terminal(sender.clone()));
        Self { sender, receiver }
    }

    /// Handle for background tasks to report back on
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }
}

/// Forward terminal input and ticks until the receiver goes away
async fn pump_terminal(sender: mpsc::UnboundedSender<Event>) {
    let mut reader = crossterm::event::EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_secs_f64(1.0 / TICK_FPS));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let terminal_event = reader.next().fuse();
        let event = tokio::select! {
            _ = sender.closed() => break,
            _ = tick.tick() => Event::Tick,
            next = terminal_event => match next {
                Some(Ok(evt)) => Event::Terminal(evt),
                Some(Err(e)) => {
                    warn!("terminal read failed: {}", e);
                    continue;
                }
                None => break,
            },
        };
        if sender.send(event).is_err() {
            break;
        }
    }
}
