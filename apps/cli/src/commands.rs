//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use partscatalog_classifier::Classifier;
use partscatalog_core::announce::completion_line;
use partscatalog_core::classify::{default_since, load_dump, run_classify, since_date};
use partscatalog_core::{
    FetchOutcome, FetchProgress, FetchRequest, FetchSummary, PreformattedRenderer, Slice,
    run_fetch, run_index,
};
use partscatalog_fetcher::{Fetcher, FetcherConfig};
use partscatalog_shared::{
    AppConfig, Category, forge_credentials, init_config, load_config, load_config_from,
};
use partscatalog_storage::{CatalogStore, audit};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// partscatalog: classify, enrich and index a catalog of UI components.
#[derive(Parser)]
#[command(
    name = "partscatalog",
    version,
    about = "Build a catalog of web and native components from a package registry dump.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.partscatalog/partscatalog.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Catalog directory (overrides `paths.catalog_dir`).
    #[arg(long, global = true)]
    pub catalog_dir: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Classify a registry dump and append new components to the catalog.
    Classify {
        /// Only consider packages modified on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<NaiveDate>,

        /// Registry dump to read (overrides `paths.registry_dump`).
        #[arg(long)]
        dump: Option<PathBuf>,
    },

    /// Fetch metadata for the components of one category.
    Fetch {
        /// Category: web or native.
        category: Category,

        /// Only process this window of the component list (starting at 1).
        #[arg(long)]
        slice: Option<usize>,

        /// Window length (overrides `fetch.slice_size`).
        #[arg(long)]
        slice_size: Option<usize>,
    },

    /// Write search-index batches from the enriched catalogs.
    Index {
        /// Output directory for the batch files.
        #[arg(long)]
        out: PathBuf,

        /// Records per batch (overrides `index.chunk_size`).
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Check the component lists against the catalog invariants.
    Check,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "partscatalog=info",
        1 => "partscatalog=debug",
        _ => "partscatalog=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()),
        };
    }

    let config = resolve_config(cli.config.as_deref())?;
    let store = CatalogStore::open(
        cli.catalog_dir
            .clone()
            .unwrap_or_else(|| config.paths.catalog_dir.clone()),
    );

    match cli.command {
        Command::Classify { since, dump } => cmd_classify(&config, &store, since, dump),
        Command::Fetch {
            category,
            slice,
            slice_size,
        } => cmd_fetch(&config, &store, category, slice, slice_size).await,
        Command::Index { out, chunk_size } => cmd_index(&config, &store, &out, chunk_size),
        Command::Check => cmd_check(&store),
        Command::Config { .. } => Ok(()),
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn cmd_classify(
    config: &AppConfig,
    store: &CatalogStore,
    since: Option<NaiveDate>,
    dump: Option<PathBuf>,
) -> Result<()> {
    let since = since
        .or(config.classify.since)
        .map(since_date)
        .unwrap_or_else(default_since);
    let dump_path = dump.unwrap_or_else(|| config.paths.registry_dump.clone());

    let classifier = Classifier::with_overrides(
        config.classify.web_keywords.clone(),
        config.classify.native_keywords.clone(),
    );

    info!(dump = %dump_path.display(), catalog = %store.root().display(), "classifying registry dump");

    let dump = load_dump(&dump_path)?;
    let outcome = run_classify(store, &dump, &classifier, since)?;

    for line in outcome.announcements() {
        println!("{line}");
    }
    println!();
    println!("{}", completion_line(outcome.web.len(), outcome.native.len()));

    Ok(())
}

async fn cmd_fetch(
    config: &AppConfig,
    store: &CatalogStore,
    category: Category,
    slice: Option<usize>,
    slice_size: Option<usize>,
) -> Result<()> {
    let size = slice_size.unwrap_or(config.fetch.slice_size);
    let slice = slice.map(|index| Slice::new(index, size)).transpose()?;

    let fetcher = Fetcher::new(FetcherConfig::from_app_config(
        config,
        forge_credentials(config),
    ))?;
    let request = FetchRequest { category, slice };

    info!(%category, catalog = %store.root().display(), "fetching metadata");

    let progress = CliFetchProgress::new();
    let summary = run_fetch(store, &fetcher, &request, &PreformattedRenderer, &progress).await?;

    println!();
    println!("  Category:  {}", summary.category);
    println!("  Processed: {} of {}", summary.processed, summary.total);
    println!("  Enriched:  {}", summary.enriched);
    println!("  Failed:    {}", summary.fallbacks.len());
    println!("  Catalog:   {} entries", summary.catalog_size);
    println!();
    println!("Success!");

    Ok(())
}

fn cmd_index(
    config: &AppConfig,
    store: &CatalogStore,
    out: &Path,
    chunk_size: Option<usize>,
) -> Result<()> {
    let chunk_size = chunk_size.unwrap_or(config.index.chunk_size);
    let summary = run_index(store, out, chunk_size)?;

    println!(
        "Wrote {} records in {} batches to {}",
        summary.records,
        summary.batches.len(),
        out.display()
    );
    Ok(())
}

fn cmd_check(store: &CatalogStore) -> Result<()> {
    let web = store.load_components(Category::Web)?;
    let native = store.load_components(Category::Native)?;
    let rejected = store.load_rejected()?;

    let violations = audit(&web, &native, &rejected);
    if violations.is_empty() {
        println!(
            "Catalog OK: {} web, {} native, {} rejected",
            web.len(),
            native.len(),
            rejected.len()
        );
        return Ok(());
    }

    for violation in &violations {
        println!("  {violation}");
    }
    Err(eyre!("{} catalog invariant violations", violations.len()))
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Fetch progress shown as an indicatif bar; failures are printed above it.
struct CliFetchProgress {
    bar: ProgressBar,
}

impl CliFetchProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl FetchProgress for CliFetchProgress {
    fn started(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar
            .enable_steady_tick(std::time::Duration::from_millis(80));
    }

    fn item_done(&self, outcome: &FetchOutcome) {
        if let FetchOutcome::Fallback(component) = outcome {
            self.bar
                .println(format!("  Problems with data for: {}", component.name));
        }
        self.bar.set_message(outcome.name().to_string());
        self.bar.inc(1);
    }

    fn finished(&self, _summary: &FetchSummary) {
        self.bar.finish_and_clear();
    }
}
