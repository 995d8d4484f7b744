//! `manifest` command-line tool
//!
//! Searches the game index by name (or takes an AppID directly), lets the user
//! pick a hit and resolves its manifests and keys into `[<AppID>]/`.

mod prompt;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};

use steam_manifest::search::pick;
use steam_manifest::{
    AppId, Fetcher, GameSearch, HttpClient, ManifestResolver, ProgressCallback, ProgressEvent, ResolverConfig,
};

use prompt::{TableSelector, ask_query};

#[derive(Parser, Debug)]
#[command(name = "manifest", version, about = "Steam manifest downloader")]
struct Args {
    /// Game name or AppID to search for; prompted when omitted
    query: Option<String>,

    /// Resolve this AppID directly without searching
    #[arg(long, conflicts_with = "query")]
    app_id: Option<u32>,

    /// Log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    log: LogLevel,

    /// Directory that receives the `[<AppID>]` folder
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

fn progress_printer() -> ProgressCallback {
    Arc::new(|event| match event {
        ProgressEvent::RepositoryStarted { repository } => println!("🔎 Trying {}", repository),
        ProgressEvent::RepositoryFailed { repository, error } => eprintln!("❌ {}: {}", repository, error),
        ProgressEvent::EntrySkipped { path } => println!("⏭  {} already downloaded", path),
        ProgressEvent::EntrySaved { path, size } => println!("✅ {} ({} bytes)", path, size),
        ProgressEvent::KeysLoaded { depots } => println!("🔑 {} depot keys", depots),
        ProgressEvent::DescriptorWritten { path } => println!("📝 {}", path.display()),
    })
}

async fn choose_app(query: Option<String>, config: &ResolverConfig) -> Result<AppId> {
    let query = match query {
        Some(query) => query,
        None => ask_query()?,
    };
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::from_config(config)?);
    let games = GameSearch::from_config(fetcher, config).search(&query).await?;
    let game = pick(&TableSelector, &games)?;
    info!("Selected {} ({})", game.name, game.app_id);
    Ok(game.app_id)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_max_level(Level::from(args.log)).init();

    let mut config = ResolverConfig::from_env()?;
    if let Some(output) = args.output {
        config = config.with_output_root(output);
    }

    let app_id = match args.app_id {
        Some(id) => AppId::from(id),
        None => choose_app(args.query, &config).await?,
    };

    let resolver = ManifestResolver::new(config)?.with_progress(progress_printer());
    match resolver.resolve(app_id).await {
        Ok(result) => {
            println!("dir {}", result.directory.display());
            Ok(())
        }
        Err(e) => {
            if let Some(suggestion) = e.suggestion() {
                eprintln!("💡 {}", suggestion);
            }
            Err(e.into())
        }
    }
}
