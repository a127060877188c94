//! Error types for observation and comparison.
//!
//! Every failure of the up-to-date check is a value of [`Error`]. Errors are
//! categorized so the outer control loop can branch on the kind of failure
//! instead of matching message text. Transport failures are not part of this
//! enum: they travel inside [`crate::ObserveResult`] as a
//! [`crate::TransportError`].

use crate::http::Method;
use std::fmt;

/// Result type alias for reconcile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which side of a comparison failed JSON classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonSubject {
    /// The body returned by the remote service.
    ResponseBody,
    /// The body a PUT request would send.
    PutMappingResult,
}

impl fmt::Display for JsonSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResponseBody => write!(f, "response body"),
            Self::PutMappingResult => write!(f, "PUT mapping result"),
        }
    }
}

/// Categories of errors, for the caller's retry and recovery decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// No usable prior observation, or the remote reports the object gone.
    NotFound,
    /// The resource's mappings can't produce the request that was needed.
    Configuration,
    /// One side of the comparison has an unexpected shape.
    Format,
}

impl ErrorCategory {
    /// Whether retrying the same check could change the outcome.
    ///
    /// None of the core categories are: the inputs are already fetched, so a
    /// retry only helps once the outer loop has changed something.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::NotFound => "Object not found",
            Self::Configuration => "Invalid mapping configuration",
            Self::Format => "Unexpected body format",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while deciding whether a resource is up to date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No prior observation to compare against, or the remote returned 404.
    #[error("object wasn't found")]
    ObjectNotFound,

    /// The resource has no mapping for the requested method.
    #[error("{method} mapping doesn't exist in request, skipping operation")]
    MappingNotFound {
        /// Method that was looked up.
        method: Method,
    },

    /// One side of the comparison is JSON and the other isn't.
    #[error("{subject} is not a valid JSON string: {value}")]
    NotValidJson {
        /// Which body was rejected.
        subject: JsonSubject,
        /// The offending body.
        value: String,
    },

    /// A field needed by a comparison strategy is missing or mistyped.
    #[error("invalid field type: {field} should be {expected}, found {found}")]
    InvalidFieldType {
        /// Field name.
        field: String,
        /// Expected JSON type.
        expected: &'static str,
        /// JSON type actually present, or "missing".
        found: &'static str,
    },

    /// Rendering a mapping into request details failed.
    #[error("failed to render request: {0}")]
    Render(String),
}

impl Error {
    /// Create a JSON classification error.
    pub fn not_valid_json(subject: JsonSubject, value: impl Into<String>) -> Self {
        Self::NotValidJson {
            subject,
            value: value.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ObjectNotFound => ErrorCategory::NotFound,
            Error::MappingNotFound { .. } => ErrorCategory::Configuration,
            Error::Render(_) => ErrorCategory::Configuration,
            Error::NotValidJson { .. } => ErrorCategory::Format,
            Error::InvalidFieldType { .. } => ErrorCategory::Format,
        }
    }

    /// Whether this error means the remote object should be (re)created.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}
