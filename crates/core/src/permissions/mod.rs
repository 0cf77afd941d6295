//! Permission system for admin operations

use crate::error::{Error, Result};
use crate::models::AdminRole;

/// Mutations an administrator can attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    /// Create, update or delete map records
    EditContent,
    /// Save outlines from the map builders
    DrawShapes,
    /// Publish or retract announcements and events
    PublishNotices,
    /// Change app branding
    EditSettings,
    /// Create administrator accounts
    ManageAccounts,
}

/// Permission matrix for admin roles
pub struct PermissionMatrix;

impl PermissionMatrix {
    /// Check if a role has permission to perform an action
    pub fn can_perform(role: AdminRole, action: AdminAction) -> bool {
        match action {
            AdminAction::EditContent | AdminAction::DrawShapes | AdminAction::PublishNotices => {
                role >= AdminRole::Editor
            }
            AdminAction::EditSettings | AdminAction::ManageAccounts => role == AdminRole::Admin,
        }
    }

    /// Like [`can_perform`](Self::can_perform) but as an error for `?`
    pub fn require(role: AdminRole, action: AdminAction) -> Result<()> {
        if Self::can_perform(role, action) {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "{:?} role cannot perform {:?}",
                role, action
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_permissions() {
        let role = AdminRole::Editor;
        assert!(PermissionMatrix::can_perform(role, AdminAction::EditContent));
        assert!(PermissionMatrix::can_perform(role, AdminAction::DrawShapes));
        assert!(PermissionMatrix::can_perform(role, AdminAction::PublishNotices));
        assert!(!PermissionMatrix::can_perform(role, AdminAction::EditSettings));
        assert!(!PermissionMatrix::can_perform(role, AdminAction::ManageAccounts));
    }

    #[test]
    fn test_admin_can_do_everything() {
        for action in [
            AdminAction::EditContent,
            AdminAction::DrawShapes,
            AdminAction::PublishNotices,
            AdminAction::EditSettings,
            AdminAction::ManageAccounts,
        ] {
            assert!(PermissionMatrix::can_perform(AdminRole::Admin, action));
        }
    }

    #[test]
    fn test_require_maps_to_permission_denied() {
        let err = PermissionMatrix::require(AdminRole::Editor, AdminAction::EditSettings)
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }
}
