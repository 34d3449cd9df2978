//! Turnip CLI - Build and inspect an incremental knowledge graph

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;
mod render;

use commands::{apply, completions, export, replay, resolve, show};
use config::{Config, StorageKind};
use output::OutputFormat;
use turnip_merge::MergeEngine;
use turnip_resolve::EntityResolver;
use turnip_storage::{GraphStore, JsonFilePersistence, SnapshotPersistence};

#[derive(Parser)]
#[command(name = "turnip")]
#[command(author, version, about = "Incremental knowledge graph built from conversation turns")]
pub struct Cli {
    /// Graph namespace (default from config)
    #[arg(short, long, global = true)]
    pub graph: Option<String>,

    /// Data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    /// Output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the data directory path
    pub fn data_dir(&self, config: &Config) -> PathBuf {
        self.data_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| config.data_dir.clone())
    }

    pub fn graph(&self, config: &Config) -> String {
        self.graph
            .clone()
            .unwrap_or_else(|| config.default_graph.clone())
    }

    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from(self.format.as_str())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Merge a batch of proposed operations
    Apply(apply::ApplyArgs),
    /// Replay a recording of turns, one batch per turn
    Replay(replay::ReplayArgs),
    /// Show the current graph
    Show(show::ShowArgs),
    /// Explain how a mention resolves
    Resolve(resolve::ResolveArgs),
    /// Export the graph as JSON or DOT
    Export(export::ExportArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with the loaded graph
pub struct AppContext {
    pub config: Config,
    pub graph: String,
    pub persistence: Box<dyn SnapshotPersistence>,
    pub store: Arc<GraphStore>,
    pub resolver: Arc<EntityResolver>,
    pub engine: Arc<MergeEngine>,
}

impl AppContext {
    pub async fn new(cli: &Cli) -> anyhow::Result<Self> {
        let config = Config::load();
        let graph = cli.graph(&config);
        if graph.trim().is_empty() || graph.contains(['/', '\\']) {
            anyhow::bail!("Invalid graph name: '{}'", graph);
        }

        let data_dir = cli.data_dir(&config);
        std::fs::create_dir_all(&data_dir)?;
        let persistence = open_persistence(config.storage, &data_dir, &graph)?;

        let store = Arc::new(GraphStore::load(persistence.as_ref()).await?);
        let resolver = Arc::new(EntityResolver::new(config.resolver.clone()));
        let engine = Arc::new(MergeEngine::new(store.clone(), resolver.clone()));

        tracing::debug!(
            "Graph '{}' at version {} ({} storage in {:?})",
            graph,
            store.version(),
            config.storage,
            data_dir
        );

        Ok(Self {
            config,
            graph,
            persistence,
            store,
            resolver,
            engine,
        })
    }

    /// Persist the current snapshot
    pub async fn save(&self) -> anyhow::Result<()> {
        self.store.save(self.persistence.as_ref()).await?;
        Ok(())
    }
}

fn open_persistence(
    storage: StorageKind,
    data_dir: &std::path::Path,
    graph: &str,
) -> anyhow::Result<Box<dyn SnapshotPersistence>> {
    match storage {
        StorageKind::Json => Ok(Box::new(JsonFilePersistence::new(
            data_dir.join(format!("{}.json", graph)),
        ))),
        #[cfg(feature = "redb")]
        StorageKind::Redb => {
            let db_path = data_dir.join("turnip.redb");
            tracing::debug!("Using database at: {:?}", db_path);
            Ok(Box::new(turnip_storage::RedbPersistence::open(db_path, graph)?))
        }
        #[cfg(not(feature = "redb"))]
        StorageKind::Redb => {
            anyhow::bail!("redb storage not enabled. Rebuild with --features redb or set storage = \"json\"")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    tracing::debug!("Starting turnip CLI");

    // Commands that never touch a graph
    match &cli.command {
        Commands::Config(args) => return commands::config::run(args, cli.output_format()).await,
        Commands::Completions(args) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::new(&cli).await?;

    match &cli.command {
        Commands::Apply(args) => apply::run(args, &cli, &ctx).await?,
        Commands::Replay(args) => replay::run(args, &cli, &ctx).await?,
        Commands::Show(args) => show::run(args, &cli, &ctx).await?,
        Commands::Resolve(args) => resolve::run(args, &cli, &ctx).await?,
        Commands::Export(args) => export::run(args, &cli, &ctx).await?,
        Commands::Config(_) | Commands::Completions(_) => {}
    }

    Ok(())
}
