//! Admin permission model
//!
//! Roles live on the user row; fine-grained permissions live in a separate
//! per-admin list. `super_admin` bypasses the list entirely, `staff` may only
//! run the check-in desk.

use super::audit::AuditLog;
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Permission granted to staff members without an admin record
pub const STAFF_PERMISSION: Permission = Permission::ManageAttendance;

/// Decide whether `user` may perform an operation guarded by `required`
pub fn authorize(
    user: &User,
    record: Option<&AdminPermissions>,
    required: Permission,
) -> CongressResult<()> {
    if !user.is_active {
        return Err(CongressError::forbidden("account is deactivated"));
    }
    if user.has_role(Role::SuperAdmin) {
        return Ok(());
    }
    if required == STAFF_PERMISSION && user.has_role(Role::Staff) {
        return Ok(());
    }
    if !user.has_role(Role::Admin) {
        return Err(CongressError::forbidden("administrator role required"));
    }
    match record {
        Some(record) if record.grants(required) => Ok(()),
        _ => Err(CongressError::forbidden(format!(
            "missing permission {}",
            required
        ))),
    }
}

/// Collapse duplicates and keep a stable order
pub fn normalize_permissions(permissions: &[Permission]) -> Vec<Permission> {
    let mut permissions = permissions.to_vec();
    permissions.sort();
    permissions.dedup();
    permissions
}

pub struct PermissionService {
    storage: Arc<dyn StorageBackend>,
    audit: Arc<AuditLog>,
}

impl PermissionService {
    pub fn new(storage: Arc<dyn StorageBackend>, audit: Arc<AuditLog>) -> Self {
        Self { storage, audit }
    }

    /// Fail with `403` unless `user` holds `required`
    pub async fn require(&self, user: &User, required: Permission) -> CongressResult<()> {
        // Only plain admins need their permission record
        let record = if user.has_role(Role::Admin) && !user.has_role(Role::SuperAdmin) {
            self.storage.get_admin_permissions(user.id).await?
        } else {
            None
        };
        authorize(user, record.as_ref(), required)
    }

    /// Effective permissions of a user as seen by `authorize`
    pub async fn effective(&self, user: &User) -> CongressResult<Vec<Permission>> {
        let mut granted = Vec::new();
        let record = self.storage.get_admin_permissions(user.id).await?;
        for permission in Permission::ALL {
            if authorize(user, record.as_ref(), permission).is_ok() {
                granted.push(permission);
            }
        }
        Ok(granted)
    }

    pub async fn get_permissions(
        &self,
        actor: &User,
        user_id: Uuid,
    ) -> CongressResult<AdminPermissions> {
        self.require(actor, Permission::ManagePermissions).await?;
        let target = self.storage.get_user(user_id).await?;

        Ok(self
            .storage
            .get_admin_permissions(target.id)
            .await?
            .unwrap_or(AdminPermissions {
                user_id: target.id,
                permissions: Vec::new(),
                granted_by: None,
                updated_at: target.updated_at,
            }))
    }

    /// Replace the permission list of an admin user
    pub async fn set_permissions(
        &self,
        actor: &User,
        user_id: Uuid,
        permissions: &[Permission],
    ) -> CongressResult<AdminPermissions> {
        self.require(actor, Permission::ManagePermissions).await?;

        let target = self.storage.get_user(user_id).await?;
        if !target.has_role(Role::Admin) {
            return Err(CongressError::invalid(
                "permissions can only be assigned to users with the admin role",
            ));
        }

        let permissions = normalize_permissions(permissions);
        let saved = self
            .storage
            .save_admin_permissions(target.id, &permissions, Some(actor.id))
            .await?;

        info!(user_id = %target.id, granted_by = %actor.id, count = permissions.len(), "Admin permissions updated");
        self.audit
            .record(
                NewAuditEntry::new("permissions.updated", "user")
                    .actor(actor.id)
                    .entity_id(target.id)
                    .details(json!({ "permissions": permissions })),
            )
            .await;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(roles: &[Role]) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            full_name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            password_hash: String::new(),
            institution: None,
            phone: None,
            qr_code: "ABCDEFGHJKLMNPQR".to_string(),
            roles: Role::normalize(roles.iter().copied()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn record(user: &User, permissions: &[Permission]) -> AdminPermissions {
        AdminPermissions {
            user_id: user.id,
            permissions: permissions.to_vec(),
            granted_by: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_super_admin_allowed_everything() {
        let admin = user(&[Role::SuperAdmin]);
        for permission in Permission::ALL {
            assert!(authorize(&admin, None, permission).is_ok());
        }
    }

    #[test]
    fn test_inactive_denied_first() {
        let mut admin = user(&[Role::SuperAdmin]);
        admin.is_active = false;
        let err = authorize(&admin, None, Permission::ViewReports).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_participant_without_role_denied() {
        let participant = user(&[]);
        let granted = record(&participant, &[Permission::ViewReports]);
        let err = authorize(&participant, Some(&granted), Permission::ViewReports).unwrap_err();
        assert!(err.to_string().contains("administrator role required"));
    }

    #[test]
    fn test_admin_needs_listed_permission() {
        let admin = user(&[Role::Admin]);
        let granted = record(&admin, &[Permission::ManagePayments]);
        assert!(authorize(&admin, Some(&granted), Permission::ManagePayments).is_ok());
        assert!(authorize(&admin, Some(&granted), Permission::ManageUsers).is_err());
        assert!(authorize(&admin, None, Permission::ManagePayments).is_err());
    }

    #[test]
    fn test_staff_only_checks_in() {
        let staff = user(&[Role::Staff]);
        assert!(authorize(&staff, None, Permission::ManageAttendance).is_ok());
        assert!(authorize(&staff, None, Permission::ManagePayments).is_err());
    }

    #[test]
    fn test_normalize_permissions() {
        let list = normalize_permissions(&[
            Permission::ViewReports,
            Permission::ManageUsers,
            Permission::ViewReports,
        ]);
        assert_eq!(list, vec![Permission::ManageUsers, Permission::ViewReports]);
    }
}
