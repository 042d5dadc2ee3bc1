//! # crawlterm CLI
//!
//! Command-line front end for the crawl API. `tui` starts the interactive
//! client; the other subcommands are one-shot versions of the same
//! operations and print markdown or JSON.
//!
//! ## Subcommands
//!
//! - `tui`: Interactive terminal client
//! - `crawl`: Crawl one URL
//! - `batch`: Crawl several URLs one after another
//! - `detect`: Show the intent detected for a URL
//! - `history`, `show`, `recent`: Browse stored results
//! - `stats`, `health`, `modes`: Server information
//! - `discover`: Find URLs under a site worth crawling
//! - `metrics`, `analytics`: Crawler counters and stored-result analytics
//! - `key`: Manage the stored API key

mod telemetry;
mod tui;

use std::io::Read as _;
use std::path::PathBuf;

use anyhow::{anyhow, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, instrument};

use crawlterm::batch::BatchRunner;
use crawlterm::client::{ApiClient, DEFAULT_ANALYTICS_DAYS, DEFAULT_DISCOVER_URLS};
use crawlterm::config::{ClientConfig, mask_key};
use crawlterm::format_markdown;
use crawlterm::history::{DEFAULT_PAGE_SIZE, ResultsQuery};
use crawlterm::intent::detect_intent;
use crawlterm::request::{
    AiModel, CrawlMode, FormState, Strategy, split_url_list, validate_url_list,
};
use crawlterm::result::{CrawlOutcome, ErrorRecord, normalize};

use crate::tui::app::{batch_markdown, outcome_markdown, stored_markdown};

#[derive(Parser)]
#[command(author, version, about = "Terminal client for an AI-assisted web crawling API", long_about = None)]
struct Cli {
    /// Base URL of the crawl API (overrides CRAWLTERM_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the API key and the TUI log
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the interactive terminal client
    Tui,

    /// Crawl a single URL
    Crawl(CrawlArgs),

    /// Crawl several URLs one after another
    Batch(BatchArgs),

    /// Show the intent and suggested settings for a URL
    Detect(DetectArgs),

    /// List stored crawl results
    History(HistoryArgs),

    /// Show one stored result
    Show(ShowArgs),

    /// Show crawl statistics
    Stats(OutputArgs),

    /// Check API and database health
    Health(OutputArgs),

    /// List the crawl modes
    Modes(ModesArgs),

    /// Show the most recent results
    Recent(RecentArgs),

    /// Find URLs under a site that match a query
    Discover(DiscoverArgs),

    /// Show the crawler's in-process metrics
    Metrics(OutputArgs),

    /// Analytics over stored results
    #[command(subcommand)]
    Analytics(AnalyticsCommand),

    /// Manage the stored API key
    #[command(subcommand)]
    Key(KeyCommand),
}

/// Settings shared by `crawl` and `batch`
#[derive(Args, Debug, Clone)]
struct CrawlOptions {
    /// Crawl mode (defaults to the detected intent's mode)
    #[arg(short, long)]
    mode: Option<CrawlMode>,

    /// What the AI should extract
    #[arg(short, long)]
    query: Option<String>,

    /// AI model
    #[arg(long)]
    model: Option<AiModel>,

    /// Skip AI extraction
    #[arg(long)]
    no_ai: bool,

    /// Enable stealth crawling
    #[arg(long)]
    stealth: bool,

    /// Stealth level (1-8)
    #[arg(long)]
    stealth_level: Option<u8>,

    /// Maximum number of pages (1-20)
    #[arg(short = 'p', long)]
    max_pages: Option<u32>,

    /// Maximum crawl depth (0-5)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Link traversal strategy (bfs|dfs)
    #[arg(long)]
    strategy: Option<Strategy>,

    /// API key for this request only
    #[arg(long)]
    api_key: Option<String>,

    /// Print JSON instead of markdown
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// URL to crawl
    #[arg(required = true)]
    url: String,

    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// URLs to crawl
    urls: Vec<String>,

    /// Read URLs from a file (newline, comma or space separated)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Delay between requests in milliseconds
    #[arg(long)]
    delay: Option<u64>,

    #[command(flatten)]
    options: CrawlOptions,
}

#[derive(Args, Debug)]
struct DetectArgs {
    /// URL to inspect
    #[arg(required = true)]
    url: String,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// Page number
    #[arg(long, default_value = "1")]
    page: u32,

    /// Results per page
    #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
    limit: u32,

    /// Search text
    #[arg(short, long)]
    query: Option<String>,

    /// Filter by crawl mode
    #[arg(short, long)]
    mode: Option<String>,

    /// Filter by status
    #[arg(short, long)]
    status: Option<String>,

    /// Filter by domain
    #[arg(long)]
    domain: Option<String>,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ShowArgs {
    /// Result id
    #[arg(required = true)]
    id: String,

    /// Skip the stored content
    #[arg(long)]
    no_content: bool,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ModesArgs {
    /// Use the built-in catalogue instead of asking the server
    #[arg(long)]
    local: bool,
}

#[derive(Args, Debug)]
struct RecentArgs {
    /// Number of results (1-50)
    #[arg(short, long, default_value = "10")]
    limit: u32,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct DiscoverArgs {
    /// Site to search
    #[arg(required = true)]
    url: String,

    /// What the pages should be about
    #[arg(short, long, default_value = "")]
    query: String,

    /// Maximum number of URLs (1-25)
    #[arg(short = 'n', long, default_value_t = DEFAULT_DISCOVER_URLS)]
    max_urls: u32,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct PeriodArgs {
    /// Reporting window in days
    #[arg(long, default_value_t = DEFAULT_ANALYTICS_DAYS)]
    days: u32,

    /// Print JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum AnalyticsCommand {
    /// Totals, mode distribution, daily activity and top domains
    Overview(PeriodArgs),
    /// Per-domain counters, or the details of one domain
    Domains {
        /// Show a single domain
        #[arg(long)]
        domain: Option<String>,

        /// Number of domains (1-50)
        #[arg(short, long, default_value = "20")]
        limit: u32,

        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Response time and content size trends, most common errors
    Performance(PeriodArgs),
}

#[derive(Subcommand, Debug)]
enum KeyCommand {
    /// Store an API key (read from stdin when omitted)
    Set { key: Option<String> },
    /// Remove the stored key
    Clear,
    /// Show the stored key, masked
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Some(Commands::Tui)) {
        telemetry::init_tracing_subscriber(cli.verbose);
    }

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = secs;
    }

    match cli.command {
        Some(Commands::Tui) => {
            // Log to a file so tracing output does not corrupt the screen
            tui::logging::setup_logging(&config.tui_log_path())?;
            let api_key = config.key_store().load()?;
            tui::run(config, api_key).await?;
        }
        Some(Commands::Crawl(args)) => crawl_command(&config, args).await?,
        Some(Commands::Batch(args)) => batch_command(&config, args).await?,
        Some(Commands::Detect(args)) => detect_command(args)?,
        Some(Commands::History(args)) => history_command(&config, args).await?,
        Some(Commands::Show(args)) => show_command(&config, args).await?,
        Some(Commands::Stats(args)) => stats_command(&config, args).await?,
        Some(Commands::Health(args)) => health_command(&config, args).await?,
        Some(Commands::Modes(args)) => modes_command(&config, args).await?,
        Some(Commands::Recent(args)) => recent_command(&config, args).await?,
        Some(Commands::Discover(args)) => discover_command(&config, args).await?,
        Some(Commands::Metrics(args)) => metrics_command(&config, args).await?,
        Some(Commands::Analytics(command)) => analytics_command(&config, command).await?,
        Some(Commands::Key(command)) => key_command(&config, command)?,
        None => {
            // If no command is provided, show help
            let _ = Cli::parse_from(["crawlterm", "--help"]);
        }
    }

    Ok(())
}

/// Build the form for `url`: intent defaults first, then explicit flags
fn build_form(url: &str, options: &CrawlOptions) -> FormState {
    let mut form = FormState {
        url: url.to_string(),
        ..FormState::default()
    };
    if let Some(query) = &options.query {
        form.query = query.clone();
    }
    form.apply_intent(detect_intent(url));

    if let Some(mode) = options.mode {
        form.mode = mode;
    }
    if let Some(model) = options.model {
        form.ai_model = model;
    }
    if options.no_ai {
        form.ai_enabled = false;
    }
    if options.stealth {
        form.stealth = true;
    }
    if let Some(level) = options.stealth_level {
        form.stealth_level = level;
    }
    if let Some(pages) = options.max_pages {
        form.max_pages = pages;
    }
    if let Some(depth) = options.max_depth {
        form.max_depth = depth;
    }
    if let Some(strategy) = options.strategy {
        form.strategy = strategy;
    }
    form
}

fn resolve_api_key(config: &ClientConfig, options: &CrawlOptions) -> anyhow::Result<Option<String>> {
    match &options.api_key {
        Some(key) => Ok(Some(key.clone())),
        None => Ok(config.key_store().load()?),
    }
}

fn print_failure(record: &ErrorRecord) {
    eprintln!("Error: {}", record.error);
    if let Some(suggestion) = &record.suggestion {
        eprintln!("Hint: {}", suggestion);
    }
}

#[instrument(skip_all, fields(url = %args.url))]
async fn crawl_command(config: &ClientConfig, args: CrawlArgs) -> anyhow::Result<()> {
    let api_key = resolve_api_key(config, &args.options)?;
    let form = build_form(&args.url, &args.options);
    let request = form.compose(api_key.as_deref())?;
    let client = ApiClient::new(config)?;

    if !args.options.json {
        println!("Crawling {} ({} mode)...", request.url, request.mode);
    }
    info!(mode = %request.mode, "sending crawl request");

    let outcome = match client.crawl(&request).await {
        Ok(response) => normalize(&response, &request.url),
        Err(e) => CrawlOutcome::Failure(ErrorRecord::from_error(&e, Some(request.url.as_str()))),
    };

    if args.options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    match &outcome {
        CrawlOutcome::Success(_) => {
            if !args.options.json {
                format_markdown(&outcome_markdown(&outcome))?;
            }
            Ok(())
        }
        CrawlOutcome::Failure(record) => {
            if !args.options.json {
                print_failure(record);
            }
            Err(anyhow!("crawl of {} failed", request.url))
        }
    }
}

#[instrument(skip_all)]
async fn batch_command(config: &ClientConfig, args: BatchArgs) -> anyhow::Result<()> {
    let mut raw = args.urls.clone();
    if let Some(path) = &args.file {
        let content = tokio::fs::read_to_string(path).await?;
        raw.extend(split_url_list(&content));
    }
    let urls = validate_url_list(&raw)?;

    // Each URL is crawled on its own, so batch mode falls back to smart.
    let api_key = resolve_api_key(config, &args.options)?;
    let mut form = build_form(&urls[0], &args.options);
    if form.mode == CrawlMode::Batch {
        form.mode = CrawlMode::Smart;
    }
    let template = form.compose_for(&urls[0], api_key.as_deref())?;

    let client = ApiClient::new(config)?;
    let delay = args
        .delay
        .map(std::time::Duration::from_millis)
        .unwrap_or_else(|| config.batch_delay());
    let runner = BatchRunner::new(client).with_delay(delay);

    let progress_bar = ProgressBar::new(urls.len() as u64);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    if args.options.json {
        progress_bar.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let report = runner
        .run(&urls, &template, |progress| {
            progress_bar.set_position(progress.completed as u64);
            match &progress.current {
                Some(url) => progress_bar.set_message(format!("{} ({} failed)", url, progress.failed)),
                None => progress_bar.set_message(format!("{} failed", progress.failed)),
            }
        })
        .await?;
    progress_bar.finish_and_clear();

    if args.options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        format_markdown(&batch_markdown(&report))?;
        for item in &report.items {
            if let CrawlOutcome::Failure(record) = &item.outcome {
                if let Some(suggestion) = &record.suggestion {
                    eprintln!("{}: {}", item.url, suggestion);
                }
            }
        }
    }

    if report.summary.completed == 0 {
        bail!("all {} URLs failed", report.summary.total);
    }
    Ok(())
}

fn detect_command(args: DetectArgs) -> anyhow::Result<()> {
    let detected = detect_intent(&args.url);
    let defaults = detected.intent.defaults();

    if args.json {
        let json = serde_json::json!({
            "url": args.url,
            "intent": detected.intent,
            "confidence": detected.confidence,
            "defaults": {
                "mode": defaults.mode,
                "max_pages": defaults.max_pages,
                "max_depth": defaults.max_depth,
                "prompts": defaults.prompts,
            }
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    println!("Intent: {} ({:.0}% confidence)", detected.intent, detected.confidence * 100.0);
    println!(
        "Suggested: {} mode, {} pages, depth {}",
        defaults.mode.title(),
        defaults.max_pages,
        defaults.max_depth
    );
    if !defaults.prompts.is_empty() {
        println!("Prompts:");
        for prompt in defaults.prompts {
            println!("  - {}", prompt);
        }
    }
    Ok(())
}

#[instrument(skip_all)]
async fn history_command(config: &ClientConfig, args: HistoryArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let query = ResultsQuery::default()
        .page(args.page)
        .limit(args.limit)
        .search(args.query.unwrap_or_default())
        .mode(args.mode.unwrap_or_default())
        .status(args.status.unwrap_or_default())
        .domain(args.domain.unwrap_or_default());

    let page = client.results(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    println!("Results: {}", page.pagination.label());
    for result in &page.results {
        let status = result.status.as_deref().unwrap_or("unknown");
        let mode = result.mode.as_deref().unwrap_or("-");
        let created = result.created_at.as_deref().unwrap_or("");
        println!("{}  [{}] {} ({}) {}", result.id, status, result.url, mode, created);
        if let Some(error) = &result.error_message {
            println!("    {}", error);
        }
    }
    Ok(())
}

#[instrument(skip_all, fields(id = %args.id))]
async fn show_command(config: &ClientConfig, args: ShowArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let result = client.result(&args.id, !args.no_content).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        format_markdown(&stored_markdown(&result))?;
    }
    Ok(())
}

#[instrument(skip_all)]
async fn stats_command(config: &ClientConfig, args: OutputArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let stats = client.statistics().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Total crawls:  {}", stats.total_crawls);
    println!("Successful:    {}", stats.successful_crawls);
    println!("Failed:        {}", stats.failed_crawls);
    println!("In progress:   {}", stats.in_progress_crawls);
    println!("Success rate:  {:.1}%", stats.success_rate);
    for (name, value) in &stats.extra {
        println!("{}: {}", name, value);
    }
    Ok(())
}

#[instrument(skip_all)]
async fn health_command(config: &ClientConfig, args: OutputArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let health = match client.health().await {
        Ok(health) => health,
        Err(e) => {
            print_failure(&ErrorRecord::from_error(&e, None));
            bail!("API at {} is not reachable", client.base_url());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&health)?);
    } else {
        println!("API:      {}", health.status);
        println!(
            "Database: {}",
            health.database.as_deref().unwrap_or("unknown")
        );
        if let Some(version) = &health.version {
            println!("Version:  {}", version);
        }
    }

    if !health.service_healthy() || !health.database_healthy() {
        bail!("service is not healthy");
    }
    Ok(())
}

#[instrument(skip_all)]
async fn modes_command(config: &ClientConfig, args: ModesArgs) -> anyhow::Result<()> {
    if args.local {
        for mode in CrawlMode::ALL {
            println!("{:<12} {:<22} {}", mode.as_str(), mode.title(), mode.description());
        }
        return Ok(());
    }

    let client = ApiClient::new(config)?;
    let modes = client.modes().await?;
    for (name, info) in &modes {
        println!("{:<12} {:<22} {}", name, info.title, info.description);
        if !info.fields.is_empty() {
            println!("{:<12} fields: {}", "", info.fields.join(", "));
        }
    }
    Ok(())
}

#[instrument(skip_all)]
async fn recent_command(config: &ClientConfig, args: RecentArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let results = client.recent(args.limit, false).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No results yet");
    }
    for result in &results {
        let status = result.status.as_deref().unwrap_or("unknown");
        println!("{}  [{}] {}", result.id, status, result.url);
    }
    Ok(())
}

#[instrument(skip_all, fields(url = %args.url))]
async fn discover_command(config: &ClientConfig, args: DiscoverArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let discovered = client
        .discover_urls(&args.url, &args.query, args.max_urls)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&discovered)?);
        return Ok(());
    }

    println!(
        "Found {} URLs under {}",
        discovered.urls.len(),
        discovered.base_url
    );
    for url in &discovered.urls {
        println!("{}", url);
    }
    Ok(())
}

#[instrument(skip_all)]
async fn metrics_command(config: &ClientConfig, args: OutputArgs) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    let metrics = client.metrics().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
        return Ok(());
    }

    println!("Crawls:        {}", metrics.total_crawls);
    println!("Success rate:  {:.1}%", metrics.success_rate * 100.0);
    println!("Avg duration:  {:.2}s", metrics.avg_duration);
    println!("Cached pages:  {}", metrics.cache_size);
    for (feature, available) in &metrics.features_available {
        println!("{:<14} {}", format!("{}:", feature), if *available { "yes" } else { "no" });
    }
    Ok(())
}

fn format_ms(ms: Option<f64>) -> String {
    ms.map(|ms| format!("{:.0} ms", ms))
        .unwrap_or_else(|| "-".to_string())
}

#[instrument(skip_all)]
async fn analytics_command(config: &ClientConfig, command: AnalyticsCommand) -> anyhow::Result<()> {
    let client = ApiClient::new(config)?;
    match command {
        AnalyticsCommand::Overview(args) => {
            let report = client.analytics_overview(args.days).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            let totals = &report.overview;
            println!("{}", report.period);
            println!(
                "Crawls: {} ({} ok, {} failed, {} running), {:.1}% success",
                totals.total_crawls,
                totals.successful_crawls,
                totals.failed_crawls,
                totals.in_progress_crawls,
                totals.success_rate
            );
            println!(
                "Avg response: {}, content: {:.2} MB",
                format_ms(totals.avg_response_time_ms),
                totals.total_content_mb
            );
            if !report.mode_distribution.is_empty() {
                println!("\nModes:");
                for share in &report.mode_distribution {
                    println!(
                        "  {:<12} {:>5} crawls  {:>5.1}%",
                        share.mode, share.total, share.success_rate
                    );
                }
            }
            if !report.daily_activity.is_empty() {
                println!("\nDaily:");
                for day in &report.daily_activity {
                    println!("  {}  {:>5} crawls  {:>5.1}%", day.date, day.crawls, day.success_rate);
                }
            }
            if !report.top_domains.is_empty() {
                println!("\nTop domains:");
                for domain in &report.top_domains {
                    println!(
                        "  {:<30} {:>5} crawls  {}",
                        domain.domain,
                        domain.total_crawls,
                        format_ms(domain.avg_response_time_ms)
                    );
                }
            }
        }
        AnalyticsCommand::Domains {
            domain: Some(domain),
            json,
            ..
        } => {
            let detail = client.analytics_domain(&domain).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&detail)?);
                return Ok(());
            }
            let stats = &detail.analytics;
            println!(
                "{}: {} crawls, {} successful, avg {}",
                detail.domain,
                stats.total_crawls,
                stats.successful_crawls,
                format_ms(stats.avg_response_time_ms)
            );
            for result in &detail.recent_crawls {
                let status = result.status.as_deref().unwrap_or("unknown");
                println!("  {}  [{}] {}", result.id, status, result.url);
            }
        }
        AnalyticsCommand::Domains {
            domain: None,
            limit,
            json,
        } => {
            let domains = client.analytics_domains(limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&domains)?);
                return Ok(());
            }
            if domains.is_empty() {
                println!("No domains crawled yet");
            }
            for domain in &domains {
                println!(
                    "{:<30} {:>5} crawls  {:>5} ok  {}",
                    domain.domain,
                    domain.total_crawls,
                    domain.successful_crawls,
                    format_ms(domain.avg_response_time_ms)
                );
            }
        }
        AnalyticsCommand::Performance(args) => {
            let report = client.analytics_performance(args.days).await?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            println!("{}", report.period);
            if !report.response_time_trends.is_empty() {
                println!("\nResponse time (avg / min / max):");
                for trend in &report.response_time_trends {
                    println!(
                        "  {}  {} / {} / {}",
                        trend.date,
                        format_ms(trend.avg_response_time_ms),
                        format_ms(trend.min_response_time_ms),
                        format_ms(trend.max_response_time_ms)
                    );
                }
            }
            if !report.error_analysis.is_empty() {
                println!("\nErrors:");
                for error in &report.error_analysis {
                    println!("  {:>4} ({:>5.1}%)  {}", error.count, error.percentage, error.error_type);
                }
            }
        }
    }
    Ok(())
}

fn key_command(config: &ClientConfig, command: KeyCommand) -> anyhow::Result<()> {
    let store = config.key_store();
    match command {
        KeyCommand::Set { key } => {
            let key = match key {
                Some(key) => key,
                None => {
                    let mut input = String::new();
                    std::io::stdin().read_to_string(&mut input)?;
                    input
                }
            };
            let key = key.trim();
            if key.is_empty() {
                bail!("API key is empty");
            }
            store.save(key)?;
            println!("Saved {} to {}", mask_key(key), store.path().display());
        }
        KeyCommand::Clear => {
            store.clear()?;
            println!("Removed {}", store.path().display());
        }
        KeyCommand::Show => match store.load()? {
            Some(key) => println!("{}", mask_key(&key)),
            None => println!("No API key stored"),
        },
    }
    Ok(())
}
