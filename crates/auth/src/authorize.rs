use thiserror::Error;

use eduhub_core::{DomainError, UserId};

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role '{role}' is not allowed to {action}")]
    RoleNotAllowed { role: Role, action: &'static str },

    #[error("only the course instructor or an admin may {action}")]
    NotCourseOwner { action: &'static str },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::NotAuthorized(value.to_string())
    }
}

/// Ownership predicate for a course.
///
/// True when the caller is the course's instructor or holds the admin role.
/// No IO, no side effects.
pub fn can_manage_course(principal: &Principal, instructor_id: UserId) -> bool {
    principal.role.is_admin() || principal.user_id == instructor_id
}

/// Gate a mutating course operation (update, delete, lesson changes).
///
/// Must be evaluated before any mutation is applied.
pub fn authorize_course_mutation(
    principal: &Principal,
    instructor_id: UserId,
    action: &'static str,
) -> Result<(), AuthzError> {
    if can_manage_course(principal, instructor_id) {
        Ok(())
    } else {
        Err(AuthzError::NotCourseOwner { action })
    }
}

/// Require the caller to hold one of `allowed`.
pub fn require_role(
    principal: &Principal,
    allowed: &[Role],
    action: &'static str,
) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotAllowed {
            role: principal.role,
            action,
        })
    }
}
