//! Program Crawler - structured extraction of conference program pages
//!
//! Walks a session list, opens every session, extracts session and nested
//! presentation fields, and writes one flat table (one row per session plus
//! one per presentation).

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::{CrawlSummary, CrawlUseCase, TraversalController, TraversalReport};
pub use domain::{ExtractionResult, ProgramTable, TimeSpan};
pub use infrastructure::{AppConfig, DomAccessor, ExtractionError, SnapshotBrowser};
