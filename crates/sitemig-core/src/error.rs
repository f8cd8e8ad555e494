//! Error types and handling for sitemig-core operations.
//!
//! The exporter distinguishes three kinds of failure:
//!
//! - **Skip-and-log**: empty or already visited links, off-domain redirects,
//!   missing translations, broken images. These never surface as [`Error`];
//!   the component logs and returns `None`.
//! - **Silent-continue**: HTTP error statuses and connection failures while
//!   crawling. Also `None`, logged at warning level.
//! - **Fatal**: everything represented here. A fatal error aborts the run
//!   and is reported by the CLI with a non-zero exit status.
//!
//! ```rust
//! use sitemig_core::Error;
//!
//! let err = Error::NotFound("staging directory 'legacy' does not exist".into());
//! assert_eq!(err.category(), "not_found");
//! assert!(!err.is_recoverable());
//! ```

use thiserror::Error;

/// The main error type for sitemig-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers the export directory, JSON artifacts and the staging
    /// directory walk.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed.
    ///
    /// Only raised where a network failure is fatal (building the client,
    /// downloading an image for staging). Crawl fetches swallow these.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Parsing operation failed.
    ///
    /// Malformed sitemap XML, unparsable dates in staged metadata.
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTML rewriting failed.
    #[error("HTML rewrite error: {0}")]
    Html(String),

    /// Configuration is invalid or inaccessible.
    ///
    /// ## Common Causes
    ///
    /// - Invalid TOML syntax in the site configuration
    /// - A base URL that is not an absolute http(s) URL
    /// - A structural selector that is not valid CSS
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource was not found.
    ///
    /// The staging directory is missing, or the site's home page / sitemap
    /// cannot be fetched, so there is nothing to crawl.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<lol_html::errors::RewritingError> for Error {
    fn from(err: lol_html::errors::RewritingError) -> Self {
        Self::Html(err.to_string())
    }
}

impl Error {
    /// Check if the error might go away if the operation is retried.
    ///
    /// The exporter itself never retries; this is exposed so callers driving
    /// several runs can decide whether to try again.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier, for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::Parse(_) => "parse",
            Self::Html(_) => "html",
            Self::Config(_) => "config",
            Self::NotFound(_) => "not_found",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::disallowed_macros)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display_formatting() {
        let cases = [
            (Error::Parse("bad xml".into()), "Parse error: bad xml"),
            (Error::Config("no base".into()), "Configuration error: no base"),
            (Error::NotFound("dir".into()), "Not found: dir"),
            (Error::Html("eof".into()), "HTML rewrite error: eof"),
        ];
        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_io_error() {
        let err: Error = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        match err {
            Error::Io(inner) => assert_eq!(inner.kind(), io::ErrorKind::NotFound),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn test_error_from_json_error() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn test_toml_errors_are_config_errors() {
        let err: Error = toml::from_str::<toml::Table>("base_url = ").unwrap_err().into();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_error_recoverability() {
        assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_recoverable());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).is_recoverable());
        assert!(!Error::NotFound("dir".into()).is_recoverable());
        assert!(!Error::Parse("x".into()).is_recoverable());
    }
}
