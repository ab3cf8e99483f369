//! Error types for Greenlight Core
//!
//! This module defines all error types used throughout the governance core.
//! We use `thiserror` for ergonomic error definitions with automatic Display/Error implementations.
//!
//! The four governance kinds (`PermissionDenied`, `ExecutionBlocked`, `AutoBlocked`,
//! `ValidationFailed`) each carry a message plus a structured details map so callers
//! can branch on [`ErrorKind`], never on message text.

use std::collections::BTreeMap;

use thiserror::Error;

/// Result type alias for Greenlight operations
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Structured key/value context attached to governance errors.
pub type ErrorDetails = BTreeMap<String, String>;

/// Main error type for Greenlight operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    /// A capability was missing, invalid, or already consumed
    #[error("permission denied: {message}")]
    PermissionDenied {
        message: String,
        details: ErrorDetails,
    },

    /// Batch Guard or Freeze Control vetoed the call
    #[error("execution blocked: {message}")]
    ExecutionBlocked {
        message: String,
        details: ErrorDetails,
    },

    /// An automated safety interceptor vetoed the call independent of the token
    #[error("auto-blocked: {message}")]
    AutoBlocked {
        message: String,
        details: ErrorDetails,
    },

    /// The gate did not approve, or the gate itself was misconfigured
    #[error("validation failed: {message}")]
    ValidationFailed {
        message: String,
        details: ErrorDetails,
    },

    /// Evidence store errors
    #[error("evidence error: {0}")]
    Evidence(#[from] EvidenceError),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        source: Box<GovernanceError>,
    },
}

/// Errors raised by the Evidence Store
#[derive(Error, Debug)]
pub enum EvidenceError {
    /// A record of this type already exists for the unit of work; records are write-once
    #[error("{record} already recorded for work unit {work_id}")]
    AlreadyRecorded { work_id: String, record: String },

    /// A record file exists but cannot be parsed into a well-formed document
    #[error("{record} for work unit {work_id} is corrupt: {reason}")]
    Corrupt {
        work_id: String,
        record: String,
        reason: String,
    },
}

/// Closed set of error kinds for branching without string matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    ExecutionBlocked,
    AutoBlocked,
    ValidationFailed,
    Evidence,
    Serialization,
    Io,
}

impl GovernanceError {
    /// Build a `PermissionDenied` error with an empty details map
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
            details: ErrorDetails::new(),
        }
    }

    /// Build an `ExecutionBlocked` error with an empty details map
    pub fn execution_blocked(message: impl Into<String>) -> Self {
        Self::ExecutionBlocked {
            message: message.into(),
            details: ErrorDetails::new(),
        }
    }

    /// Build an `AutoBlocked` error with an empty details map
    pub fn auto_blocked(message: impl Into<String>) -> Self {
        Self::AutoBlocked {
            message: message.into(),
            details: ErrorDetails::new(),
        }
    }

    /// Build a `ValidationFailed` error with an empty details map
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
            details: ErrorDetails::new(),
        }
    }

    /// Attach a structured detail to a governance error.
    ///
    /// No-op for infrastructure variants, which carry their own payloads.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self {
            Self::PermissionDenied { details, .. }
            | Self::ExecutionBlocked { details, .. }
            | Self::AutoBlocked { details, .. }
            | Self::ValidationFailed { details, .. } => {
                details.insert(key.into(), value.into());
            }
            _ => {}
        }
        self
    }

    /// The kind of this error, for branching without inspecting text.
    ///
    /// Contextual wrappers report the kind of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::ExecutionBlocked { .. } => ErrorKind::ExecutionBlocked,
            Self::AutoBlocked { .. } => ErrorKind::AutoBlocked,
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::Evidence(_) => ErrorKind::Evidence,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::Io(_) => ErrorKind::Io,
            Self::WithContext { source, .. } => source.kind(),
        }
    }

    /// Structured details, present on the four governance kinds
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::PermissionDenied { details, .. }
            | Self::ExecutionBlocked { details, .. }
            | Self::AutoBlocked { details, .. }
            | Self::ValidationFailed { details, .. } => Some(details),
            Self::WithContext { source, .. } => source.details(),
            _ => None,
        }
    }

    /// Add context to an error
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add lazy context to a Result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.context(f()))
    }
}
