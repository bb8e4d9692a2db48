//! Uniform, non-raising result envelope returned by every extraction step.

use std::error::Error;

use serde::{Deserialize, Serialize};

/// Outcome of one extraction step.
///
/// `data` is always populated: on failure it holds the neutral value the
/// caller should write (an empty list, an empty string or a placeholder), so
/// a failed field never leaves a hole in the output row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult<T> {
    pub status: bool,
    pub message: String,
    pub data: T,
}

impl<T> ExtractionResult<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: true,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>, data: T) -> Self {
        Self {
            status: false,
            message: message.into(),
            data,
        }
    }

    /// Failure carrying the error's description and the given neutral data.
    pub fn from_error<E: Error + ?Sized>(error: &E, data: T) -> Self {
        Self::failure(error.to_string(), data)
    }

    pub const fn is_success(&self) -> bool {
        self.status
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ExtractionResult<U> {
        ExtractionResult {
            status: self.status,
            message: self.message,
            data: f(self.data),
        }
    }
}

impl<T: Default> ExtractionResult<T> {
    /// Failure with the type's default value as neutral data.
    pub fn empty_failure(message: impl Into<String>) -> Self {
        Self::failure(message, T::default())
    }
}
