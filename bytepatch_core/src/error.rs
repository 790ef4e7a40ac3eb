use crate::pattern::TextEncoding;
use crate::resource::CommitError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a request is rejected before anything is applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The search text encodes to zero bytes.
    #[error("Search text is empty; nothing to find")]
    EmptyPattern,

    /// The replacement is longer than the text it replaces and overflow is disallowed.
    #[error(
        "Replacement of {replacement_len} bytes is longer than the {pattern_len}-byte match and overflow is not allowed"
    )]
    Overflow {
        pattern_len: usize,
        replacement_len: usize,
    },

    /// No occurrence was found and the zero-match policy asks for it to be reported.
    #[error("Search text was not found in the resource")]
    NotFound,

    /// The text cannot be represented in the configured encoding.
    #[error("Cannot encode text as {encoding}: {reason}")]
    Encoding {
        encoding: TextEncoding,
        reason: String,
    },
}

/// Failures while applying an approved plan or committing its result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("Refusing to apply plan: {0}")]
    IllegalPlan(String),

    #[error("Failed to commit new contents: {0}")]
    CommitFailed(String),
}

impl From<CommitError> for MutationError {
    fn from(err: CommitError) -> Self {
        MutationError::CommitFailed(err.to_string())
    }
}

/// Every way a find-and-replace request can fail. Nothing is ever partially applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FindReplaceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}

/// Machine-readable error kind carried in [`ErrorResponse`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyPattern,
    Overflow,
    NotFound,
    Encoding,
    IllegalPlan,
    CommitFailed,
}

impl FindReplaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FindReplaceError::Validation(err) => match err {
                ValidationError::EmptyPattern => ErrorKind::EmptyPattern,
                ValidationError::Overflow { .. } => ErrorKind::Overflow,
                ValidationError::NotFound => ErrorKind::NotFound,
                ValidationError::Encoding { .. } => ErrorKind::Encoding,
            },
            FindReplaceError::Mutation(err) => match err {
                MutationError::IllegalPlan(_) => ErrorKind::IllegalPlan,
                MutationError::CommitFailed(_) => ErrorKind::CommitFailed,
            },
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// The single error shape handed to callers. `message` is always displayable on its own.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorResponse {
    /// Serializes to JSON, degrading to the bare message if serialization fails.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}
