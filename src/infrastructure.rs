//! Infrastructure layer: document access, extraction, retries, configuration,
//! logging and table export.

pub mod config;
pub mod dom;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod retry_manager;
pub mod table_export;

pub use config::{AppConfig, ConfigManager, LoggingConfig, OutputFormat};
pub use dom::{DomAccessor, NodeHandle, SnapshotBrowser};
pub use parsing::{ExtractionContext, SelectorCatalog, selector_keys};
pub use parsing_error::{ErrorKind, ExtractionError, ExtractionOutcome};
pub use retry_manager::{ClickRetrier, RetryAttempt, RetryReport};
pub use table_export::write_table;
