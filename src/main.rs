use anyhow::{Context, Result};
use hierbenches::{run, Error, GeneratorConfig, MemoryStore, PgStore, RunSummary};
use std::{env, fs, str::FromStr};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = GeneratorConfig::load().map_err(Error::from)?;

    let outcome = if config.dry_run {
        info!("Dry run, generating into memory...");
        let mut store = MemoryStore::new();
        run(&config, &mut store).await
    } else {
        let database_url = config.database_url().map_err(Error::from)?;
        info!("Connecting to database...");
        let mut store = PgStore::connect(database_url)
            .await
            .context("failed to connect to database")?;
        run(&config, &mut store).await
    };

    let summary = outcome?;

    if let Some(path) = &config.summary_path {
        write_summary(&summary, path)?;
    }

    Ok(())
}

fn init_tracing() {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| Level::from_str(&level).ok())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn write_summary(summary: &RunSummary, path: &std::path::Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write run summary to {}", path.display()))?;
    info!("Run summary written to {}", path.display());
    Ok(())
}
