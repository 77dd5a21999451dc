use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use searchsync_cli::{load_documents, load_preferences};
use searchsync_core::config::Config;
use searchsync_core::types::{EntityId, SearchQuery};
use searchsync_index::{EngineHandle, IndexSyncClient};
use searchsync_paging::{HitListView, HitPaginationController, LoadOutcome, PaginationConfig, Phase};

#[derive(Parser)]
#[command(name = "searchsync", about = "Push documents to a search index and page through hits")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit documents from a JSON array file or a directory of *.json files
    Sync {
        #[arg(long)]
        index: String,
        input: PathBuf,
        /// Documents per batch (defaults to search.batch_size)
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Page through an index, printing visible hits as JSON lines
    Search {
        #[arg(long)]
        index: String,
        #[arg(long, default_value = "")]
        query: String,
        /// Sort rule such as `metrics.rating:desc`; repeat for tie-breakers
        #[arg(long)]
        sort: Vec<String>,
        /// Keep loading until this id shows up
        #[arg(long)]
        target: Option<EntityId>,
        /// Id of the viewing user; their own hits are never hidden
        #[arg(long)]
        user: Option<EntityId>,
        /// JSON file with hidden models/images/tags/users
        #[arg(long)]
        hidden: Option<PathBuf>,
        /// Pages to load at most
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;

    match cli.command {
        Command::Sync { index, input, batch_size } => {
            let documents = load_documents(&input)?;
            let client = IndexSyncClient::from_settings(&settings.search)?;
            if !client.is_enabled() {
                println!("Search engine not configured; {} documents not synced", documents.len());
                return Ok(());
            }
            let batch_size = batch_size.unwrap_or(settings.search.batch_size);

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
            spinner.enable_steady_tick(Duration::from_millis(120));
            spinner.set_message(format!("submitting {} documents to '{}'", documents.len(), index));
            let result = client.submit(&index, &documents, batch_size).await;
            spinner.finish_and_clear();

            let tasks = result?;
            for task in &tasks {
                println!("task {} {:?}", task.task_uid, task.status);
            }
            println!("✅ Submitted {} documents in {} batches", documents.len(), tasks.len());
        }
        Command::Search { index, query, sort, target, user, hidden, pages } => {
            let preferences = load_preferences(hidden.as_deref())?;
            let Some(engine) = EngineHandle::from_settings(&settings.search)? else {
                bail!("no search engine configured: set search.host and search.api_key, or search.local_index_dir");
            };

            let query = SearchQuery::new(index, query, settings.pagination.page_size).with_sort(sort);
            let mut paging = HitPaginationController::new(
                engine.page_source(),
                query,
                PaginationConfig::from_settings(&settings.pagination),
            );
            if let Some(id) = target {
                paging.set_target(id);
            }

            for _ in 0..pages.max(1) {
                if let LoadOutcome::NoOp { .. } = paging.load_more().await {
                    break;
                }
            }
            if paging.phase() == Phase::Stalled {
                if let Some(err) = paging.last_error() {
                    eprintln!("Search stalled: {}", err);
                }
            }
            if let Some(deadline) = paging.no_results_deadline() {
                tokio::time::sleep_until(deadline).await;
            }

            match paging.view(&preferences, user, tokio::time::Instant::now()) {
                HitListView::Results { visible, hidden_count, has_more, .. } => {
                    for hit in &visible {
                        println!("{}", serde_json::to_string(hit).context("encoding hit")?);
                    }
                    if hidden_count > 0 {
                        eprintln!("{} hits have been hidden due to your settings.", hidden_count);
                    }
                    if has_more {
                        eprintln!("More results available; raise --pages to load them.");
                    }
                }
                HitListView::NoResults { hidden_count } => {
                    if hidden_count > 0 {
                        eprintln!("{} hits have been hidden due to your settings.", hidden_count);
                    }
                    println!("No results found");
                }
                HitListView::Stalled => bail!("search stalled before the first page loaded"),
                HitListView::Loading => println!("Still loading"),
            }
            if let Some(id) = target {
                let found = paging.hits().iter().any(|h| h.id == id);
                eprintln!("Target {} {}", id, if found { "found" } else { "not found" });
            }
        }
    }
    Ok(())
}
