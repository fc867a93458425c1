//! Command line entry point for pool-dl

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pool_dl::utils::parse_collection_ids;
use pool_dl::{CollectionId, CollectionOutcome, Config, Downloader, run_with_shutdown};

/// Download e621 pools into per-pool directories, skipping what is already on disk
#[derive(Debug, Parser)]
#[command(name = "pool-dl", version, about)]
struct Cli {
    /// Pool IDs or pool URLs
    #[arg(value_name = "IDS")]
    ids: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base directory for pool directories (overrides the config file)
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Ledger database path (overrides the config file)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Re-download every item, even if already recorded
    #[arg(short, long)]
    force: bool,

    /// Only report which pools have new items
    #[arg(long, conflicts_with_all = ["update_all", "list"])]
    check_updates: bool,

    /// Download new items of every pool in the ledger
    #[arg(long, conflicts_with = "list")]
    update_all: bool,

    /// List pools recorded in the ledger
    #[arg(long)]
    list: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "pool_dl=info")]
    log_level: String,
}

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing(default_filter: &str) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(cli: &Cli) -> pool_dl::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.download_dir {
        config.download.download_dir = dir.clone();
    }
    if let Some(database) = &cli.database {
        config.persistence.database_path = database.clone();
    }
    if cli.force {
        config.download.skip_existing = false;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let ids = parse_collection_ids(&cli.ids);
    let needs_ids = !(cli.list || cli.update_all || cli.check_updates);
    if ids.is_empty() && (needs_ids || !cli.ids.is_empty()) {
        tracing::error!("No valid pool IDs provided");
        std::process::exit(1);
    }

    let downloader = match load_config(&cli) {
        Ok(config) => match Downloader::new(config).await {
            Ok(downloader) => downloader,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start downloader");
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    tokio::spawn(run_with_shutdown(downloader.clone()));

    let result = if cli.list {
        list(&downloader).await
    } else if cli.check_updates {
        check_updates(&downloader, &ids).await
    } else if cli.update_all {
        downloader.update_all().await.map(|results| report(&results))
    } else {
        let results = downloader.download_collections(&ids).await;
        report(&results);
        Ok(())
    };

    downloader.db.close().await;

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
    }
}

async fn list(downloader: &Downloader) -> pool_dl::Result<()> {
    let collections = downloader.db.list_all_collections().await?;
    if collections.is_empty() {
        println!("No pools in the ledger");
    }
    for record in collections {
        let downloaded = downloader.db.get_downloaded_item_ids(record.id).await?.len();
        println!(
            "{:>8}  {} by {}  ({}/{} items)  {}",
            record.id,
            record.name,
            record.artist.as_deref().unwrap_or("?"),
            downloaded,
            record.item_count,
            record.folder_path.display()
        );
    }
    Ok(())
}

async fn check_updates(downloader: &Downloader, ids: &[CollectionId]) -> pool_dl::Result<()> {
    let checks = if ids.is_empty() {
        downloader.check_all_for_updates().await?
    } else {
        let mut checks = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(check) = downloader.check_for_updates(id).await? {
                checks.push(check);
            }
        }
        checks
    };

    for check in checks.iter().filter(|c| c.has_updates) {
        println!(
            "{:>8}  {} -> {} items, {} new",
            check.collection_id, check.old_count, check.new_count, check.new_item_count
        );
    }
    if !checks.iter().any(|c| c.has_updates) {
        println!("All pools are up to date");
    }
    Ok(())
}

fn report(results: &[(CollectionId, CollectionOutcome)]) {
    for (id, outcome) in results {
        match outcome {
            CollectionOutcome::Completed(summary) => tracing::info!(
                collection_id = id.0,
                name = %summary.name,
                downloaded = summary.downloaded.len(),
                failed = summary.failed.len(),
                directory = %summary.directory.display(),
                "Pool done"
            ),
            CollectionOutcome::Skipped(reason) => {
                tracing::warn!(collection_id = id.0, %reason, "Pool skipped")
            }
            CollectionOutcome::Failed(reason) => {
                tracing::error!(collection_id = id.0, %reason, "Pool failed")
            }
        }
    }
}
