#![allow(missing_docs)]

use std::path::PathBuf;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use program_crawler_lib::application::CrawlUseCase;
use program_crawler_lib::infrastructure::config::{AppConfig, ConfigManager};
use program_crawler_lib::infrastructure::logging::{init_logging_with_config, log_system_info};

/// Config from the first argument if given, otherwise the per-user config file.
async fn load_config() -> Result<AppConfig> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::from_file(&path),
        None => ConfigManager::new()?.load_or_initialize().await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config().await?;
    init_logging_with_config(config.logging.clone())?;
    log_system_info();

    let use_case = CrawlUseCase::new(config);
    let browser = use_case.snapshot_browser()?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Ctrl-C received, finishing the current item");
            ctrl_c.cancel();
        }
    });

    let summary = use_case.run(browser, cancel).await?;
    info!(
        "✅ Run {} ended with {:?}: {} rows written to {}",
        summary.run_id,
        summary.termination,
        summary.rows_written,
        summary.output_path.display()
    );
    Ok(())
}
