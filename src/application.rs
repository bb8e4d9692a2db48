//! Application layer: validated configuration, traversal and the crawl run.

pub mod crawl_use_case;
pub mod traversal;
pub mod validated_config;

pub use crawl_use_case::{CrawlSummary, CrawlUseCase};
pub use traversal::{
    Termination, TraversalController, TraversalReport, TraversalState, TraversalStats,
};
pub use validated_config::{ConfigError, ValidatedTraversalConfig};
