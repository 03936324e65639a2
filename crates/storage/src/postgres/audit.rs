//! Audit log operations

use super::rows::AuditRow;
use super::{query_error, PostgresStorageBackend};
use congress_models::*;
use uuid::Uuid;

impl PostgresStorageBackend {
    pub async fn append_audit_impl(&self, entry: NewAuditEntry) -> CongressResult<AuditEntry> {
        let row = sqlx::query_as::<_, AuditRow>(
            r#"
            INSERT INTO audit_log (id, actor_id, action, entity, entity_id, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, actor_id, action, entity, entity_id, details, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.actor_id)
        .bind(&entry.action)
        .bind(&entry.entity)
        .bind(entry.entity_id)
        .bind(&entry.details)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(row.into())
    }

    /// Newest entries first
    pub async fn list_audit_impl(
        &self,
        entity: Option<&str>,
        limit: u32,
    ) -> CongressResult<Vec<AuditEntry>> {
        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT id, actor_id, action, entity, entity_id, details, created_at
            FROM audit_log
            WHERE ($1::text IS NULL OR entity = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(entity)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.into_iter().map(AuditEntry::from).collect())
    }
}
