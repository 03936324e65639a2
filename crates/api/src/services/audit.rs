use congress_models::*;
use congress_storage::StorageBackend;
use std::sync::Arc;
use tracing::{debug, warn};

/// Application-side system log
pub struct AuditLog {
    storage: Arc<dyn StorageBackend>,
}

impl AuditLog {
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Append an entry. A failed write is logged and never fails the caller.
    pub async fn record(&self, entry: NewAuditEntry) {
        let action = entry.action.clone();
        match self.storage.append_audit(entry).await {
            Ok(saved) => debug!(action = %saved.action, entity = %saved.entity, "Audit entry recorded"),
            Err(e) => warn!(action = %action, error = %e, "Failed to write audit entry"),
        }
    }

    /// Newest first; the caller is responsible for the permission check
    pub async fn list(&self, params: &AuditListParams) -> CongressResult<Vec<AuditEntry>> {
        self.storage
            .list_audit(params.entity.as_deref(), params.effective_limit())
            .await
    }
}
