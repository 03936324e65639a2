use super::permissions::PermissionService;
use congress_models::*;
use congress_storage::StorageBackend;
use std::sync::Arc;
use uuid::Uuid;

pub struct ReportService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
}

impl ReportService {
    pub fn new(storage: Arc<dyn StorageBackend>, permissions: Arc<PermissionService>) -> Self {
        Self {
            storage,
            permissions,
        }
    }

    pub async fn summary(&self, actor: &User) -> CongressResult<CongressSummary> {
        self.permissions
            .require(actor, Permission::ViewReports)
            .await?;
        self.storage.congress_summary().await
    }

    pub async fn activity_report(
        &self,
        actor: &User,
        activity_id: Uuid,
    ) -> CongressResult<ActivityReport> {
        self.permissions
            .require(actor, Permission::ViewReports)
            .await?;
        let mut report = self.storage.activity_report(activity_id).await?;
        report.compute_rate();
        Ok(report)
    }
}
