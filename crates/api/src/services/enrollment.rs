use super::audit::AuditLog;
use super::permissions::PermissionService;
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct EnrollmentService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
    audit: Arc<AuditLog>,
}

impl EnrollmentService {
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

    /// Free activities confirm immediately; paid ones wait for a completed
    /// payment unless one already exists
    pub async fn enroll(&self, user: &User, activity_id: Uuid) -> CongressResult<Enrollment> {
        let activity = self.storage.get_activity(activity_id).await?;
        if !activity.is_active {
            return Err(CongressError::invalid("activity is not open for enrollment"));
        }

        let status = if activity.is_free()
            || self
                .storage
                .has_completed_payment(user.id, Some(activity.id))
                .await?
        {
            EnrollmentStatus::Confirmed
        } else {
            EnrollmentStatus::PendingPayment
        };

        let enrollment = self
            .storage
            .create_enrollment(user.id, activity.id, status)
            .await?;

        info!(
            user_id = %user.id,
            activity_id = %activity.id,
            status = enrollment.status.as_str(),
            "User enrolled"
        );
        self.audit
            .record(
                NewAuditEntry::new("enrollment.created", "enrollment")
                    .actor(user.id)
                    .entity_id(enrollment.id)
                    .details(json!({
                        "activity_id": activity.id,
                        "status": enrollment.status,
                    })),
            )
            .await;

        Ok(enrollment)
    }

    pub async fn cancel(&self, user: &User, activity_id: Uuid) -> CongressResult<Enrollment> {
        let enrollment = self
            .storage
            .find_open_enrollment(user.id, activity_id)
            .await?
            .ok_or_else(|| CongressError::not_found("Enrollment"))?;

        let cancelled = self
            .storage
            .update_enrollment_status(enrollment.id, EnrollmentStatus::Cancelled)
            .await?;

        info!(user_id = %user.id, activity_id = %activity_id, "Enrollment cancelled");
        self.audit
            .record(
                NewAuditEntry::new("enrollment.cancelled", "enrollment")
                    .actor(user.id)
                    .entity_id(cancelled.id)
                    .details(json!({ "activity_id": activity_id })),
            )
            .await;

        Ok(cancelled)
    }

    pub async fn my_enrollments(&self, user: &User) -> CongressResult<Vec<Enrollment>> {
        self.storage.list_user_enrollments(user.id).await
    }

    pub async fn activity_enrollments(
        &self,
        actor: &User,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Enrollment>> {
        self.permissions
            .require(actor, Permission::ManageActivities)
            .await?;
        let activity = self.storage.get_activity(activity_id).await?;
        self.storage.list_activity_enrollments(activity.id).await
    }
}
