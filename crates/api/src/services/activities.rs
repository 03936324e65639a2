use super::audit::AuditLog;
use super::permissions::PermissionService;
use chrono::Utc;
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct ActivityService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
    audit: Arc<AuditLog>,
}

impl ActivityService {
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

    /// Active activities for everyone; inactive ones only for activity managers
    pub async fn list(
        &self,
        actor: Option<&User>,
        include_inactive: bool,
    ) -> CongressResult<Vec<ActivitySummary>> {
        if include_inactive {
            let actor = actor.ok_or_else(|| CongressError::unauthorized("login required"))?;
            self.permissions
                .require(actor, Permission::ManageActivities)
                .await?;
        }
        self.storage.list_activities(include_inactive).await
    }

    pub async fn get(&self, id: Uuid) -> CongressResult<Activity> {
        self.storage.get_activity(id).await
    }

    pub async fn create(
        &self,
        actor: &User,
        request: CreateActivityRequest,
    ) -> CongressResult<Activity> {
        self.permissions
            .require(actor, Permission::ManageActivities)
            .await?;

        let activity = request.into_activity(Uuid::new_v4(), Utc::now())?;
        let created = self.storage.create_activity(&activity).await?;

        info!(activity_id = %created.id, kind = %created.kind, "Activity created");
        self.audit
            .record(
                NewAuditEntry::new("activity.created", "activity")
                    .actor(actor.id)
                    .entity_id(created.id)
                    .details(json!({ "title": created.title, "kind": created.kind })),
            )
            .await;

        Ok(created)
    }

    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        request: UpdateActivityRequest,
    ) -> CongressResult<Activity> {
        self.permissions
            .require(actor, Permission::ManageActivities)
            .await?;

        let mut activity = self.storage.get_activity(id).await?;
        let changes = serde_json::to_value(&request)?;
        request.apply(&mut activity, Utc::now())?;
        let updated = self.storage.update_activity(&activity).await?;

        info!(activity_id = %updated.id, "Activity updated");
        self.audit
            .record(
                NewAuditEntry::new("activity.updated", "activity")
                    .actor(actor.id)
                    .entity_id(updated.id)
                    .details(changes),
            )
            .await;

        Ok(updated)
    }

    /// Soft delete: the activity disappears from the public list but keeps
    /// its enrollments, attendance and diplomas
    pub async fn deactivate(&self, actor: &User, id: Uuid) -> CongressResult<Activity> {
        self.permissions
            .require(actor, Permission::ManageActivities)
            .await?;

        let mut activity = self.storage.get_activity(id).await?;
        activity.is_active = false;
        activity.updated_at = Utc::now();
        let updated = self.storage.update_activity(&activity).await?;

        info!(activity_id = %updated.id, "Activity deactivated");
        self.audit
            .record(
                NewAuditEntry::new("activity.deactivated", "activity")
                    .actor(actor.id)
                    .entity_id(updated.id),
            )
            .await;

        Ok(updated)
    }
}
