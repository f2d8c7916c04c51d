use eduhub_core::UserId;

use crate::Role;

/// A fully resolved caller for authorization decisions.
///
/// Built by the transport from validated token claims; the core trusts it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}
