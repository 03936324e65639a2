use super::audit::AuditLog;
use super::permissions::PermissionService;
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Account administration
pub struct UserService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
    audit: Arc<AuditLog>,
}

impl UserService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        permissions: Arc<PermissionService>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            storage,
            permissions,
            audit,
        }
    }

    pub async fn list_users(
        &self,
        actor: &User,
        filter: &UserFilter,
    ) -> CongressResult<Vec<UserProfile>> {
        self.permissions
            .require(actor, Permission::ManageUsers)
            .await?;
        let users = self.storage.list_users(filter).await?;
        Ok(users.iter().map(User::profile).collect())
    }

    pub async fn get_user(&self, actor: &User, id: Uuid) -> CongressResult<UserProfile> {
        self.permissions
            .require(actor, Permission::ManageUsers)
            .await?;
        Ok(self.storage.get_user(id).await?.profile())
    }

    /// Replace the role set of a user. `participant` is always kept and only
    /// a super admin may grant or revoke `super_admin`.
    pub async fn set_roles(
        &self,
        actor: &User,
        id: Uuid,
        roles: &[Role],
    ) -> CongressResult<UserProfile> {
        self.permissions
            .require(actor, Permission::ManageUsers)
            .await?;

        let target = self.storage.get_user(id).await?;
        let roles = Role::normalize(roles.iter().copied());

        let changes_super_admin =
            target.has_role(Role::SuperAdmin) != roles.contains(&Role::SuperAdmin);
        if changes_super_admin && !actor.has_role(Role::SuperAdmin) {
            return Err(CongressError::forbidden(
                "only a super admin can grant or revoke super_admin",
            ));
        }
        if target.id == actor.id && !roles.contains(&Role::SuperAdmin) && changes_super_admin {
            return Err(CongressError::invalid(
                "super admins cannot revoke their own super_admin role",
            ));
        }

        let updated = self.storage.update_user_roles(target.id, &roles).await?;

        info!(user_id = %updated.id, actor_id = %actor.id, roles = ?updated.roles, "User roles updated");
        self.audit
            .record(
                NewAuditEntry::new("user.roles_updated", "user")
                    .actor(actor.id)
                    .entity_id(updated.id)
                    .details(json!({ "before": target.roles, "after": updated.roles })),
            )
            .await;

        Ok(updated.profile())
    }

    pub async fn deactivate(&self, actor: &User, id: Uuid) -> CongressResult<UserProfile> {
        self.permissions
            .require(actor, Permission::ManageUsers)
            .await?;

        if actor.id == id {
            return Err(CongressError::invalid("you cannot deactivate your own account"));
        }
        let target = self.storage.get_user(id).await?;
        if target.has_role(Role::SuperAdmin) && !actor.has_role(Role::SuperAdmin) {
            return Err(CongressError::forbidden(
                "only a super admin can deactivate a super admin",
            ));
        }

        let updated = self.storage.set_user_active(target.id, false).await?;

        info!(user_id = %updated.id, actor_id = %actor.id, "User deactivated");
        self.audit
            .record(
                NewAuditEntry::new("user.deactivated", "user")
                    .actor(actor.id)
                    .entity_id(updated.id),
            )
            .await;

        Ok(updated.profile())
    }
}
