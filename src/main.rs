use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use feedrelay::config::Config;
use feedrelay::pipeline::{Pipeline, RunMode};
use feedrelay::storage::{Database, DatabaseError, SeenSet};

/// Get the config directory path (~/.config/feedrelay/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("feedrelay"))
}

#[derive(Parser, Debug)]
#[command(name = "feedrelay", about = "Relay new feed entries to webhooks")]
struct Args {
    /// Config file (default: ~/.config/feedrelay/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Seen-ID database (default: database_path from config, else ~/.config/feedrelay/seen.db)
    #[arg(long, value_name = "FILE", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch feeds, translate and deliver new entries
    Run,
    /// Fetch feeds and record new entries without translating or delivering
    DryRun,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("feedrelay=info")),
        )
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let mut client = reqwest::Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(secs) = config.request_timeout_secs {
        client = client.timeout(Duration::from_secs(secs));
    }
    let client = client.build().context("Failed to build HTTP client")?;

    // Validates the abort policy before any feed is touched.
    let pipeline = Pipeline::from_config(&config, client).context("Invalid configuration")?;

    let db_path = match args.db.or_else(|| config.database_path.clone()) {
        Some(path) => path,
        None => {
            let config_dir = get_config_dir()?;
            ensure_private_dir(&config_dir)?;
            config_dir.join("seen.db")
        }
    };
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!("Error: Another feedrelay run appears to be in progress.");
            std::process::exit(1);
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to open database: {}", e)),
    };
    let mut seen = SeenSet::load(db).await.context("Failed to load seen IDs")?;

    let mode = match args.command {
        Command::Run => RunMode::Normal,
        Command::DryRun => RunMode::DryRun,
    };

    let summary = pipeline.run(&mut seen, mode).await?;
    println!(
        "Checked {} feeds: {} new, {} recorded, {} deliveries, {} errors",
        summary.feeds_checked,
        summary.entries_new,
        summary.entries_committed,
        summary.deliveries,
        summary.errors.len()
    );
    Ok(())
}

/// Creates the config directory if needed, with user-only access on Unix.
fn ensure_private_dir(dir: &std::path::Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).context("Failed to create config directory")?;
    }

    // SEC-007: Set directory permissions on Unix (user-only access)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700)) {
            tracing::warn!(
                path = %dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }
    Ok(())
}
