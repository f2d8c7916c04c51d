//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Forbidden,
    Conflict,
    BadRequest,
    Internal,
}

/// Domain-level error.
///
/// Every failure of a course or enrollment operation is reported through this
/// type. Only `StorageConflict` is eligible for automatic retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced document does not exist (`"course"`, `"user"`, `"lesson"`).
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("already enrolled in this course")]
    AlreadyEnrolled,

    #[error("not enrolled in this course")]
    NotEnrolled,

    #[error("lesson already completed")]
    LessonAlreadyCompleted,

    #[error("course is not published yet")]
    CourseNotPublished,

    /// Ownership or role violation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Malformed input; carries one entry per offending field.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A profile already exists for the identity.
    #[error("user profile already exists")]
    AlreadyRegistered,

    /// A concurrent write won the race (stale version).
    #[error("storage conflict: {0}")]
    StorageConflict(String),

    /// Unexpected storage failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_authorized(msg: impl Into<String>) -> Self {
        Self::NotAuthorized(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::StorageConflict(msg.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound(entity)
    }

    /// Whether the failure may succeed if the operation is attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageConflict(_))
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound(_) | Self::NotEnrolled => ErrorClass::NotFound,
            Self::NotAuthorized(_) => ErrorClass::Forbidden,
            Self::AlreadyEnrolled
            | Self::LessonAlreadyCompleted
            | Self::AlreadyRegistered
            | Self::StorageConflict(_) => ErrorClass::Conflict,
            Self::CourseNotPublished | Self::Validation(_) | Self::InvalidId(_) => {
                ErrorClass::BadRequest
            }
            Self::Storage(_) => ErrorClass::Internal,
        }
    }

    /// Stable machine-readable code for transports.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyEnrolled => "already_enrolled",
            Self::NotEnrolled => "not_enrolled",
            Self::LessonAlreadyCompleted => "lesson_already_completed",
            Self::CourseNotPublished => "course_not_published",
            Self::NotAuthorized(_) => "not_authorized",
            Self::Validation(_) => "validation_failed",
            Self::InvalidId(_) => "invalid_id",
            Self::AlreadyRegistered => "already_registered",
            Self::StorageConflict(_) => "storage_conflict",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Field-level details, if this is a validation failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}
