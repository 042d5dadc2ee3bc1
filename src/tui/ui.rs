use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Scrollbar,
        ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
    },
};
use unicode_width::UnicodeWidthStr;

use crawlterm::log::LogLevel;
use crawlterm::result::format_bytes;

use crate::tui::app::{App, Field, Tab};

const SPINNER_FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Draw the UI
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(9),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);
    match app.tab {
        Tab::Crawl => render_crawl_tab(f, app, chunks[1]),
        Tab::Batch => render_batch_tab(f, app, chunks[1]),
        Tab::History => render_history_tab(f, app, chunks[1]),
        Tab::Stats => render_stats_tab(f, app, chunks[1]),
    }
    render_log(f, app, chunks[2]);
    render_help(f, app, chunks[3]);

    if let Some(buffer) = &app.key_prompt {
        render_key_prompt(f, buffer);
    }
}

fn title(text: &str) -> Span<'_> {
    Span::styled(
        text,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles = Tab::ALL.iter().map(|t| t.title()).collect::<Vec<_>>();
    let status = format!(" {} | key: {} ", app.api_url, app.api_key_label());
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title("crawlterm"))
                .title_bottom(Line::from(status).right_aligned()),
        )
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn split_columns(area: Rect) -> (Rect, Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);
    (columns[0], columns[1])
}

fn render_crawl_tab(f: &mut Frame, app: &App, area: Rect) {
    let (left, right) = split_columns(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(left);

    render_input(f, "URL", &app.form.url, rows[0], app.focus == Field::Url);
    render_input(f, "AI query", &app.form.query, rows[1], app.focus == Field::Query);

    let form = &app.form;
    let on_off = |b: bool| if b { "on" } else { "off" };
    let setting = |key: &'static str, label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<7}", key), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{:<10}", label), Style::default().fg(Color::Cyan)),
            Span::raw(value),
        ])
    };
    let lines = vec![
        setting(
            "",
            "Intent",
            format!("{} ({:.0}%)", app.intent.intent, app.intent.confidence * 100.0),
        ),
        setting("^O", "Mode", form.mode.title().to_string()),
        Line::from(Span::styled(
            format!("                 {}", form.mode.description()),
            Style::default().fg(Color::DarkGray),
        )),
        setting(
            "^A ^E",
            "AI",
            format!("{} [{}]", form.ai_model, on_off(form.ai_enabled)),
        ),
        setting(
            "^S ^L",
            "Stealth",
            format!("{} (level {})", on_off(form.stealth), form.stealth_level),
        ),
        setting("^P", "Pages", form.max_pages.to_string()),
        setting("^D", "Depth", form.max_depth.to_string()),
        setting("^T", "Strategy", form.strategy.to_string()),
        setting("^G", "", "apply suggested defaults".to_string()),
    ];
    let settings = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title("Settings")));
    f.render_widget(settings, rows[2]);

    render_result(f, app, right, "Result");
}

fn render_batch_tab(f: &mut Frame, app: &App, area: Rect) {
    let (left, right) = split_columns(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(left);

    let input = Paragraph::new(app.form.batch_urls.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title("URLs (one per line, Alt+Enter)")),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(input, rows[0]);

    let (ratio, label) = match &app.batch_progress {
        Some(p) => (
            (p.progress / 100.0).clamp(0.0, 1.0),
            format!(
                "{}/{} done, {} failed{}",
                p.completed,
                p.total,
                p.failed,
                p.current
                    .as_deref()
                    .map(|u| format!(", now {}", u))
                    .unwrap_or_default()
            ),
        ),
        None => (0.0, "idle".to_string()),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(title("Progress")))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(label);
    f.render_widget(gauge, rows[1]);

    render_result(f, app, right, "Batch report");
}

fn render_history_tab(f: &mut Frame, app: &App, area: Rect) {
    let (left, right) = split_columns(area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(left);

    let search_title = if app.history_query.mode.is_empty() {
        "Search".to_string()
    } else {
        format!("Search (mode: {})", app.history_query.mode)
    };
    render_input(f, &search_title, &app.history_search, rows[0], true);

    let (items, label) = match &app.history {
        Some(page) => (
            page.results
                .iter()
                .map(|r| {
                    let status_style = if r.is_failed() {
                        Style::default().fg(Color::Red)
                    } else {
                        Style::default().fg(Color::Green)
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("{:<10}", r.status.as_deref().unwrap_or("-")),
                            status_style,
                        ),
                        Span::styled(
                            format!("{:<12}", r.mode.as_deref().unwrap_or("-")),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw(r.url.clone()),
                        Span::styled(
                            r.content_length
                                .map(|n| format!("  {}", format_bytes(n)))
                                .unwrap_or_default(),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect::<Vec<_>>(),
            page.pagination.label(),
        ),
        None => (Vec::new(), "loading...".to_string()),
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title("Stored results"))
                .title_bottom(Line::from(label).right_aligned()),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.history_selected));
    f.render_stateful_widget(list, rows[1], &mut state);

    render_result(f, app, right, "Details");
}

fn render_stats_tab(f: &mut Frame, app: &App, area: Rect) {
    let label = |name: &str| Span::styled(format!("{:<22}", name), Style::default().fg(Color::Cyan));
    let mut lines = Vec::new();

    match &app.health {
        Some(health) => {
            let db_style = if health.database_healthy() {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            lines.push(Line::from(vec![label("Service"), Span::raw(health.status.clone())]));
            lines.push(Line::from(vec![
                label("Database"),
                Span::styled(health.database.clone().unwrap_or_else(|| "unknown".into()), db_style),
            ]));
            if let Some(version) = &health.version {
                lines.push(Line::from(vec![label("Version"), Span::raw(version.clone())]));
            }
        }
        None => lines.push(Line::from("Health: not checked yet")),
    }
    lines.push(Line::default());

    match &app.statistics {
        Some(stats) => {
            for (name, value) in [
                ("Total crawls", stats.total_crawls.to_string()),
                ("Successful", stats.successful_crawls.to_string()),
                ("Failed", stats.failed_crawls.to_string()),
                ("In progress", stats.in_progress_crawls.to_string()),
                ("Success rate", format!("{:.1}%", stats.success_rate)),
            ] {
                lines.push(Line::from(vec![label(name), Span::raw(value)]));
            }
            for (name, value) in &stats.extra {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                lines.push(Line::from(vec![label(name.as_str()), Span::raw(value)]));
            }
        }
        None => lines.push(Line::from("Statistics: not loaded yet")),
    }

    let stats = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title("Server statistics")))
        .wrap(Wrap { trim: false });
    f.render_widget(stats, area);
}

/// Scrollable markdown result panel
fn render_result(f: &mut Frame, app: &App, area: Rect, name: &str) {
    let mut block_title = vec![title(name)];
    if app.is_loading {
        block_title.push(Span::styled(
            format!(" {} working...", SPINNER_FRAMES[app.spinner_frame]),
            Style::default().fg(Color::Blue),
        ));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(block_title));

    let result = Paragraph::new(app.result_text.clone())
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_position.min(u16::MAX as usize) as u16, 0));
    f.render_widget(result, area);

    let mut scrollbar_state = ScrollbarState::default()
        .content_length(app.result_text.height())
        .position(app.scroll_position);
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    f.render_stateful_widget(
        scrollbar,
        area.inner(Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut scrollbar_state,
    );
}

fn render_input(f: &mut Frame, name: &str, value: &str, area: Rect, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title(name));
    let inner = block.inner(area);

    // Keep the tail visible when the value is wider than the box.
    let width = inner.width as usize;
    let visible = if value.width() >= width && width > 0 {
        let mut start = 0;
        while value[start..].width() >= width {
            start += value[start..].chars().next().map_or(1, char::len_utf8);
        }
        &value[start..]
    } else {
        value
    };

    f.render_widget(Paragraph::new(visible).block(block), area);
    if focused {
        f.set_cursor_position((inner.x + visible.width() as u16, inner.y));
    }
}

fn render_log(f: &mut Frame, app: &App, area: Rect) {
    let height = area.height.saturating_sub(2) as usize;
    let skip = app.log.len().saturating_sub(height);
    let lines = app
        .log
        .entries()
        .skip(skip)
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Info => Color::Gray,
                LogLevel::Success => Color::Green,
                LogLevel::Warning => Color::Yellow,
                LogLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", entry.time_label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ])
        })
        .collect::<Vec<_>>();

    let log = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title("Log")),
    );
    f.render_widget(log, area);
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let help = match app.tab {
        Tab::Crawl => "Enter crawl | Up/Down field | ^O mode | PgUp/PgDn scroll | Tab next tab | ^K key | Esc quit",
        Tab::Batch => "Enter run batch | Alt+Enter new line | ^X clear | Tab next tab | Esc quit",
        Tab::History => "Enter search | Up/Down select | ^O open | Left/Right page | ^F mode filter | Esc quit",
        Tab::Stats => "Enter refresh | Tab next tab | Esc quit",
    };
    f.render_widget(
        Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Render a popup with the given title and text
pub fn render_popup(f: &mut Frame, title: &str, text: &str) -> Rect {
    let size = f.area();
    let width = size.width.min(60);
    let height = size.height.min(7);
    let x = (size.width - width) / 2;
    let y = (size.height - height) / 2;
    let popup_area = Rect::new(x, y, width, height);

    f.render_widget(Clear, popup_area);
    let popup_block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(Color::Black))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    let inner_area = popup_block.inner(popup_area);
    f.render_widget(popup_block, popup_area);

    let text = Paragraph::new(text)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    f.render_widget(text, inner_area);
    inner_area
}

fn render_key_prompt(f: &mut Frame, buffer: &str) {
    let inner = render_popup(
        f,
        "API key",
        "Paste the API key for AI extraction and press Enter. Esc skips.",
    );
    if inner.height < 3 {
        return;
    }
    let input_area = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
    let masked = "*".repeat(buffer.chars().count().min(inner.width as usize));
    f.render_widget(
        Paragraph::new(masked.clone()).style(Style::default().fg(Color::Yellow)),
        input_area,
    );
    f.set_cursor_position((input_area.x + masked.len() as u16, input_area.y));
}
