use serde::Serialize;
use thiserror::Error;

/// Stable error codes surfaced on the callable HTTP interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCode {
    Unauthenticated,
    InvalidArgument,
    PermissionDenied,
    NotFound,
    Internal,
}

#[derive(Error, Debug)]
pub enum TagbookError {
    /// Caller is not authenticated
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Required input is missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Caller may only act on their own records
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Group with given ID not found. Fatal for aggregation: a group must
    /// exist before any expense or settlement can reference it.
    #[error("Group {0} not found")]
    GroupNotFound(String),

    /// User with given ID not found
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Draft expense with given ID not found
    #[error("Draft expense {0} not found")]
    DraftNotFound(String),

    /// Receipt extraction failed or is not configured
    #[error("Receipt extraction failed: {0}")]
    Extraction(String),

    /// Document store operation failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Catch-all for unexpected failures
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TagbookError {
    /// Wire code for the callable surface.
    pub fn code(&self) -> ErrorCode {
        match self {
            TagbookError::Unauthenticated(_) => ErrorCode::Unauthenticated,
            TagbookError::InvalidArgument(_) => ErrorCode::InvalidArgument,
            TagbookError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            TagbookError::GroupNotFound(_)
            | TagbookError::UserNotFound(_)
            | TagbookError::DraftNotFound(_) => ErrorCode::NotFound,
            TagbookError::Extraction(_)
            | TagbookError::StorageError(_)
            | TagbookError::Internal(_) => ErrorCode::Internal,
        }
    }
}
