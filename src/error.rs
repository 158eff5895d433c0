//! Error types returned by the public functions of this library.
//!
//! Internally we use `anyhow` (see `Res`) and attach context as errors bubble up. At module
//! boundaries the `anyhow::Error` is tagged with an `ErrorType` using `IntoResult::pub_result` so
//! that callers can tell a missing transaction apart from an unreachable spreadsheet.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies an `Error`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration is missing or invalid.
    Config,
    /// The backing spreadsheet could not be reached, authentication failed, or the configured
    /// tab does not exist or cannot be parsed.
    StoreUnavailable,
    /// The transaction targeted by an update does not exist.
    NotFound,
    /// An input value could not be interpreted, e.g. a malformed date.
    Validation,
    /// The MCP server failed to start or stopped unexpectedly.
    Service,
    /// Something that should not happen.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. It wraps an `anyhow::Error` along with an `ErrorType`.
pub struct Error {
    error_type: ErrorType,
    source: anyhow::Error,
}

impl Error {
    pub(crate) fn new(error_type: ErrorType, source: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            source: source.into(),
        }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        Self::new(
            ErrorType::NotFound,
            anyhow::anyhow!("Transaction '{id}' not found"),
        )
    }

    pub(crate) fn validation(message: impl Display) -> Self {
        Self::new(ErrorType::Validation, anyhow::anyhow!("{message}"))
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is_not_found(&self) -> bool {
        self.error_type == ErrorType::NotFound
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The alternate form prints the whole context chain on one line.
        write!(f, "{:#}", self.source)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:?}", self.error_type, self.source)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Converts internal results into public results by tagging the error with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_tags_error() {
        let res: Res<()> = Err(anyhow::anyhow!("connection refused")).context("Failed to fetch");
        let err = res.pub_result(ErrorType::StoreUnavailable).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::StoreUnavailable);
        assert_eq!(err.to_string(), "Failed to fetch: connection refused");
    }

    #[test]
    fn test_not_found() {
        let err = Error::not_found("abc");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::StoreUnavailable.to_string(), "store_unavailable");
        assert_eq!(ErrorType::NotFound.to_string(), "not_found");
    }
}
