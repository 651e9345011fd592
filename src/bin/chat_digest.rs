use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chat_digest::ai::GeminiClient;
use chat_digest::cache::{JsonFileStore, SummaryCache};
use chat_digest::core::config::AppConfig;
use chat_digest::core::{FilterKind, FilterSelection, SummaryRequest, SystemClock};
use chat_digest::source::{JsonFileSource, UNSUPPORTED_PAGE_MESSAGE, is_supported_page};
use chat_digest::timestamp::{DateOrder, TimestampParser};
use chat_digest::utils::parse_custom_bound;
use chat_digest::worker::SummaryPipeline;
use clap::Parser;
use tracing::error;

/// Summarize a saved chat page reply.
#[derive(Debug, Parser)]
#[command(name = "chat-digest", version)]
struct Cli {
    /// JSON reply from the page script: `{"chatName": ..., "messages": [...]}`.
    #[arg(long)]
    input: PathBuf,

    /// Time window to summarize.
    #[arg(long, default_value = "hour")]
    filter: FilterKind,

    /// Start of a custom window, `YYYY-MM-DDTHH:MM`.
    #[arg(long)]
    start: Option<String>,

    /// End of a custom window, `YYYY-MM-DDTHH:MM`.
    #[arg(long)]
    end: Option<String>,

    /// Ignore any cached summary.
    #[arg(long)]
    refresh: bool,

    /// URL of the page the reply came from; rejected unless it is a supported chat page.
    #[arg(long)]
    page_url: Option<String>,

    /// Overrides `CHAT_DIGEST_DATE_ORDER`.
    #[arg(long)]
    date_order: Option<DateOrder>,
}

impl Cli {
    fn selection(&self) -> Result<FilterSelection> {
        Ok(match self.filter {
            FilterKind::Hour => FilterSelection::Hour,
            FilterKind::Day => FilterSelection::Day,
            FilterKind::Custom => FilterSelection::Custom {
                start: parse_custom_bound(self.start.as_deref().unwrap_or(""))?,
                end: parse_custom_bound(self.end.as_deref().unwrap_or(""))?,
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    chat_digest::setup_logging();
    let cli = Cli::parse();

    if let Some(url) = &cli.page_url
        && !is_supported_page(url)
    {
        println!("{UNSUPPORTED_PAGE_MESSAGE}");
        return Ok(ExitCode::FAILURE);
    }

    let mut config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading configuration")?;
    if let Some(order) = cli.date_order {
        config.date_order = order;
    }

    let request = SummaryRequest {
        selection: cli.selection()?,
        refresh: cli.refresh,
    };

    let clock = Arc::new(SystemClock);
    let cache = SummaryCache::new(Arc::new(JsonFileStore::new(&config.cache_path)), clock.clone());
    let pipeline = SummaryPipeline::new(
        Arc::new(JsonFileSource::new(&cli.input)),
        Arc::new(GeminiClient::from_config(&config)),
        cache,
        TimestampParser::with_order(config.date_order),
        clock,
    );

    let outcome = pipeline.run(&request).await;
    if let Some(title) = outcome.title() {
        println!("{title}");
    }
    println!("{}", outcome.status_text());

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Summary request did not produce a summary");
        Ok(ExitCode::FAILURE)
    }
}
