//! Error taxonomy for document access and field extraction.
//!
//! Every failure the traversal can meet is one of these kinds. The kind
//! decides whether the current item is skipped or the whole run stops.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No element matches selector '{selector}'")]
    NotFound { selector: String },

    #[error("Timed out after {waited:?} waiting for '{selector}'")]
    Timeout { selector: String, waited: Duration },

    #[error("Stale node handle (generation {handle_generation}, document generation {current_generation})")]
    Stale {
        handle_generation: u64,
        current_generation: u64,
    },

    #[error("Could not parse '{text}': {reason}")]
    ParseFailure { text: String, reason: String },

    #[error("Interaction failed: {reason}")]
    Interaction { reason: String },

    #[error("Navigation failed: {reason}")]
    Navigation { reason: String },

    #[error("Unexpected failure: {message}")]
    Unknown { message: String },
}

/// Coarse classification used for logging and retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    Timeout,
    Stale,
    ParseFailure,
    Interaction,
    Navigation,
    Unknown,
}

impl ErrorKind {
    /// Kinds that end the whole run rather than one item.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::Navigation | Self::Unknown)
    }
}

impl ExtractionError {
    pub fn not_found(selector: &str) -> Self {
        Self::NotFound {
            selector: selector.to_string(),
        }
    }

    pub fn timeout(selector: &str, waited: Duration) -> Self {
        Self::Timeout {
            selector: selector.to_string(),
            waited,
        }
    }

    pub fn parse_failure(text: &str, reason: impl Into<String>) -> Self {
        Self::ParseFailure {
            text: text.to_string(),
            reason: reason.into(),
        }
    }

    pub fn interaction(reason: impl Into<String>) -> Self {
        Self::Interaction {
            reason: reason.into(),
        }
    }

    pub fn navigation(reason: impl Into<String>) -> Self {
        Self::Navigation {
            reason: reason.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Stale { .. } => ErrorKind::Stale,
            Self::ParseFailure { .. } => ErrorKind::ParseFailure,
            Self::Interaction { .. } => ErrorKind::Interaction,
            Self::Navigation { .. } => ErrorKind::Navigation,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Errors that cost at most the current item.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Navigation { .. } | Self::Unknown { .. })
    }

    /// Errors a click retry can outlast (overlays, slow rendering).
    pub const fn is_retryable_click(&self) -> bool {
        matches!(self, Self::Interaction { .. } | Self::Timeout { .. })
    }
}

pub type ExtractionOutcome<T> = Result<T, ExtractionError>;
