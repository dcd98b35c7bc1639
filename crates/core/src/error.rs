//! Error types for pail-core
//!
//! Remote failures are classified into explicit kinds so callers can decide
//! between retry, abort, and report without string matching.

use thiserror::Error;

/// Result type alias for pail-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pail-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Bucket or object does not exist (fatal to the current operation)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bucket/object exists but the request was denied
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Throttling, connection reset, 5xx (retryable with backoff)
    #[error("Transient error: {0}")]
    Transient(String),

    /// The session lost connectivity entirely; operations refuse to start
    /// until it is re-verified
    #[error("Network unreachable: {0}")]
    NetworkUnavailable(String),

    /// A cleanup pass left items undeleted
    #[error("Partial failure: {succeeded} of {attempted} deleted, {failed} failed")]
    PartialFailure {
        attempted: u64,
        succeeded: u64,
        failed: u64,
    },

    /// Operation cancelled by the user
    #[error("Operation cancelled")]
    Cancelled,

    /// Another workflow already owns the bucket in this session
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Whether this error warrants a retry with backoff.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }

    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) | Error::Config(_) => 2, // UsageError
            Error::Transient(_) | Error::NetworkUnavailable(_) => 3, // NetworkError
            Error::AccessDenied(_) => 4,                   // AuthError
            Error::NotFound(_) | Error::ProfileNotFound(_) => 5, // NotFound
            Error::Conflict(_) => 6,                       // Conflict
            Error::PartialFailure { .. } => 8,             // PartialFailure
            Error::Cancelled => 130,                       // Interrupted
            _ => 1,                                        // GeneralError
        }
    }
}

/// Per-item error codes from the bulk delete API that warrant a retry.
///
/// Everything else ("AccessDenied", "NoSuchVersion", ...) is permanent and
/// recorded as a failure without further attempts.
pub fn is_transient_code(code: &str) -> bool {
    matches!(
        code,
        "SlowDown"
            | "Throttling"
            | "ThrottlingException"
            | "RequestTimeout"
            | "RequestTimeoutException"
            | "InternalError"
            | "ServiceUnavailable"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Transient("test".into()).exit_code(), 3);
        assert_eq!(Error::NetworkUnavailable("test".into()).exit_code(), 3);
        assert_eq!(Error::AccessDenied("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::ProfileNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::Conflict("test".into()).exit_code(), 6);
        assert_eq!(
            Error::PartialFailure {
                attempted: 10,
                succeeded: 8,
                failed: 2
            }
            .exit_code(),
            8
        );
        assert_eq!(Error::Cancelled.exit_code(), 130);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Transient("throttled".into()).is_transient());
        assert!(!Error::NotFound("gone".into()).is_transient());
        assert!(!Error::NetworkUnavailable("down".into()).is_transient());
        assert!(!Error::AccessDenied("denied".into()).is_transient());
    }

    #[test]
    fn test_transient_codes() {
        assert!(is_transient_code("SlowDown"));
        assert!(is_transient_code("Throttling"));
        assert!(is_transient_code("InternalError"));
        assert!(is_transient_code("ServiceUnavailable"));
        assert!(!is_transient_code("AccessDenied"));
        assert!(!is_transient_code("NoSuchKey"));
        assert!(!is_transient_code("NoSuchVersion"));
    }

    #[test]
    fn test_error_display() {
        let err = Error::ProfileNotFound("prod".into());
        assert_eq!(err.to_string(), "Profile not found: prod");

        let err = Error::PartialFailure {
            attempted: 100,
            succeeded: 95,
            failed: 5,
        };
        assert_eq!(
            err.to_string(),
            "Partial failure: 95 of 100 deleted, 5 failed"
        );
    }
}
