//! Validation errors

use thiserror::Error;

/// Errors raised while building a translation request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Text was empty after trimming
    #[error("empty_text")]
    EmptyText,
}

impl Error {
    /// Machine-readable error code returned to HTTP clients
    pub fn code(&self) -> &'static str {
        match self {
            Error::EmptyText => "empty_text",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
