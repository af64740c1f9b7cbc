// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for PRU-ICSS arbitration

use pruss_chip::OutOfRange;
use thiserror::Error;

/// Result type alias for PRU-ICSS operations
pub type Result<T> = std::result::Result<T, PrussError>;

/// Errors that can occur during PRU-ICSS operations
#[derive(Debug, Error)]
pub enum PrussError {
    /// Malformed request: out-of-range slot or kind, foreign or stale token
    #[error("Invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong with the request
        reason: String,
    },

    /// A named dependency does not exist and never will
    #[error("Not found: {what}")]
    NotFound {
        /// The missing dependency
        what: String,
    },

    /// A dependency exists but has not finished registering yet
    #[error("Not ready: {what}")]
    NotReady {
        /// The dependency still being set up
        what: String,
    },

    /// The core or memory bank is held by another client
    #[error("Busy: {resource}")]
    Busy {
        /// The contended resource
        resource: String,
    },

    /// I/O error while opening a memory source
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// A memory resource could not be mapped
    #[error("Failed to map memory resource: {reason}")]
    MapFailed {
        /// Reason for failure
        reason: String,
    },
}

impl PrussError {
    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a not ready error
    pub fn not_ready(what: impl Into<String>) -> Self {
        Self::NotReady { what: what.into() }
    }

    /// Create a busy error
    pub fn busy(resource: impl Into<String>) -> Self {
        Self::Busy {
            resource: resource.into(),
        }
    }

    /// Create a map failed error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::MapFailed {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request later may succeed.
    ///
    /// `Busy` and `NotReady` are transient; everything else is permanent.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Busy { .. } | Self::NotReady { .. })
    }
}

impl From<OutOfRange> for PrussError {
    fn from(err: OutOfRange) -> Self {
        Self::invalid_argument(err.to_string())
    }
}
