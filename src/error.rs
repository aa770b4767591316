//! Error types for azurefleet.
//!
//! The taxonomy follows the lifecycle of a fleet: input that cannot be
//! expanded, identifiers that do not parse, API responses that report the
//! fleet missing or already present, and everything else the API returns.
//! Errors carry a short operation prefix (`creating <id>: ...`) so the host
//! runtime can surface them unchanged.

use std::fmt;
use thiserror::Error;

/// Result type alias for azurefleet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Lifecycle operation an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Retrieving,
    Creating,
    Updating,
    Deleting,
    Polling,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Retrieving => write!(f, "retrieving"),
            Operation::Creating => write!(f, "creating"),
            Operation::Updating => write!(f, "updating"),
            Operation::Deleting => write!(f, "deleting"),
            Operation::Polling => write!(f, "polling"),
        }
    }
}

/// The main error type for azurefleet.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Input Errors
    // ========================================================================
    /// A JSON string will not parse, base64 will not decode, or a cross-field
    /// constraint is violated.
    #[error("MalformedInput: {0}")]
    MalformedInput(String),

    /// A resource ID does not match its expected shape.
    #[error("InvalidIdentifier: parsing {kind} ID {value:?}: {message}")]
    InvalidIdentifier {
        /// Kind of identifier that was expected
        kind: &'static str,
        /// The offending value
        value: String,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The API reports the fleet is gone.
    #[error("NotFound: {0} was not found")]
    NotFound(String),

    /// Create observed a fleet with the same ID.
    #[error(
        "AlreadyExists: a resource with the ID {0:?} already exists - to be managed via this tool it needs to be imported into the state"
    )]
    AlreadyExists(String),

    /// A lifecycle call failed; renders as `creating <id>: ...`.
    #[error("{op} {id}: {source}")]
    Operation {
        /// Operation that failed
        op: Operation,
        /// Fleet ID
        id: String,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// A polled operation did not reach a terminal state in time.
    #[error("Timeout: operation did not complete within {timeout_secs} seconds")]
    Timeout {
        /// Budget in seconds
        timeout_secs: u64,
    },

    // ========================================================================
    // Transformation Errors
    // ========================================================================
    /// An expander failed.
    #[error("expanding {field}: {source}")]
    Expand {
        /// Configuration field being expanded
        field: &'static str,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// A flattener failed.
    #[error("flattening {field}: {source}")]
    Flatten {
        /// Configuration field being flattened
        field: &'static str,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },

    /// Decoding the configuration tree failed.
    #[error("unmarshaling {field}: {source}")]
    Unmarshal {
        /// Field or document being decoded
        field: &'static str,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    // ========================================================================
    // API Errors
    // ========================================================================
    /// Any other API error, surfaced verbatim.
    #[error("Fatal: unexpected status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the response body
        message: String,
    },

    /// The long-running operation ended in a non-success state.
    #[error("Fatal: long-running operation finished with status {status}: {message}")]
    OperationFailed {
        /// Terminal status reported by the API
        status: String,
        /// Error message
        message: String,
    },

    /// Transport failure talking to the API.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// JSON serialisation error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a new malformed input error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    /// Creates a new invalid identifier error.
    pub fn invalid_id(
        kind: &'static str,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidIdentifier {
            kind,
            value: value.into(),
            message: message.into(),
        }
    }

    /// Wraps an error with the lifecycle operation and fleet ID.
    pub fn operation(op: Operation, id: impl fmt::Display, source: Error) -> Self {
        Self::Operation {
            op,
            id: id.to_string(),
            source: Box::new(source),
        }
    }

    /// Wraps an expander failure.
    pub fn expand(field: &'static str, source: Error) -> Self {
        Self::Expand {
            field,
            source: Box::new(source),
        }
    }

    /// Wraps a flattener failure.
    pub fn flatten(field: &'static str, source: Error) -> Self {
        Self::Flatten {
            field,
            source: Box::new(source),
        }
    }

    /// Returns true if this error, or the error it wraps, is `NotFound`.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Api { status, .. } => *status == 404,
            Error::Operation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MalformedInput(_) | Error::Expand { .. } | Error::Unmarshal { .. } => 2,
            Error::InvalidIdentifier { .. } => 3,
            Error::NotFound(_) => 4,
            Error::AlreadyExists(_) => 5,
            Error::Operation { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}

/// Extension trait for adding operation context to errors.
pub trait ErrorContext<T> {
    /// Prefixes an error with the operation and fleet ID.
    fn during(self, op: Operation, id: impl fmt::Display) -> Result<T>;

    /// Marks an error as coming from the expander for `field`.
    fn expanding(self, field: &'static str) -> Result<T>;

    /// Marks an error as coming from the flattener for `field`.
    fn flattening(self, field: &'static str) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn during(self, op: Operation, id: impl fmt::Display) -> Result<T> {
        self.map_err(|e| Error::operation(op, id, e))
    }

    fn expanding(self, field: &'static str) -> Result<T> {
        self.map_err(|e| Error::expand(field, e))
    }

    fn flattening(self, field: &'static str) -> Result<T> {
        self.map_err(|e| Error::flatten(field, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_prefix() {
        let err = Error::operation(
            Operation::Creating,
            "/subscriptions/xxx/resourceGroups/rg/providers/Microsoft.AzureFleet/fleets/f1",
            Error::Api {
                status: 400,
                message: "bad request".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.starts_with("creating /subscriptions/xxx/"));
        assert!(msg.contains("bad request"));
    }

    #[test]
    fn test_expand_prefix() {
        let result: Result<()> = Err(Error::malformed("invalid character 'x'"));
        let err = result.expanding("settings_json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "expanding settings_json: MalformedInput: invalid character 'x'"
        );
    }

    #[test]
    fn test_already_exists_mentions_import() {
        let err = Error::AlreadyExists("/subscriptions/a/fleets/b".to_string());
        assert!(err.to_string().contains("imported"));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_is_not_found_through_operation() {
        let err = Error::operation(
            Operation::Retrieving,
            "id",
            Error::Api {
                status: 404,
                message: "ResourceNotFound".to_string(),
            },
        );
        assert!(err.is_not_found());
        assert!(!Error::malformed("x").is_not_found());
    }
}
