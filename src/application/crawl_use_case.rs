//! Run boundary: validate, traverse, export.
//!
//! Whatever way the traversal ends, the rows it gathered are written out.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use super::traversal::{Termination, TraversalController, TraversalStats};
use super::validated_config::ValidatedTraversalConfig;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::dom::{DomAccessor, SnapshotBrowser};
use crate::infrastructure::table_export::write_table;

#[derive(Debug, Clone, Serialize)]
pub struct CrawlSummary {
    pub run_id: Uuid,
    pub termination: Termination,
    pub stats: TraversalStats,
    pub rows_written: usize,
    pub output_path: PathBuf,
}

pub struct CrawlUseCase {
    config: AppConfig,
}

impl CrawlUseCase {
    pub const fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Offline accessor over the configured snapshot directory.
    pub fn snapshot_browser(&self) -> Result<SnapshotBrowser> {
        let dir = self
            .config
            .site
            .snapshot_dir
            .as_deref()
            .ok_or_else(|| anyhow!("site.snapshot_dir is not configured"))?;
        SnapshotBrowser::from_dir(dir, &self.config.site.start_page)
    }

    /// Traverse with `accessor` and write the table.
    ///
    /// Configuration problems fail before any navigation; everything after
    /// that ends in an export of the rows collected.
    pub async fn run<A: DomAccessor>(
        &self,
        accessor: A,
        cancel: CancellationToken,
    ) -> Result<CrawlSummary> {
        let validated = ValidatedTraversalConfig::from_config(&self.config)
            .context("Invalid traversal configuration")?;
        let controller = TraversalController::new(accessor, validated)
            .context("Selector catalog rejected by the document accessor")?;

        info!("🚀 Starting crawl of '{}'", self.config.site.name);
        let report = controller.run(cancel).await;

        let output = &self.config.output;
        write_table(&report.table, &output.path, output.format)?;

        Ok(CrawlSummary {
            run_id: report.run_id,
            termination: report.termination,
            stats: report.stats,
            rows_written: report.table.len(),
            output_path: output.path.clone(),
        })
    }
}
