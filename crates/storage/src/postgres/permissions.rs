//! Admin permission operations

use super::rows::AdminPermissionsRow;
use super::{query_error, PostgresStorageBackend};
use congress_models::*;
use uuid::Uuid;

impl PostgresStorageBackend {
    pub async fn get_admin_permissions_impl(
        &self,
        user_id: Uuid,
    ) -> CongressResult<Option<AdminPermissions>> {
        sqlx::query_as::<_, AdminPermissionsRow>(
            r#"
            SELECT user_id, permissions, granted_by, updated_at
            FROM admin_permissions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(AdminPermissions::try_from)
        .transpose()
    }

    /// Replace the whole permission list for a user
    pub async fn save_admin_permissions_impl(
        &self,
        user_id: Uuid,
        permissions: &[Permission],
        granted_by: Option<Uuid>,
    ) -> CongressResult<AdminPermissions> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;
        if !exists {
            return Err(CongressError::not_found("User"));
        }

        sqlx::query_as::<_, AdminPermissionsRow>(
            r#"
            INSERT INTO admin_permissions (user_id, permissions, granted_by, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE
            SET permissions = EXCLUDED.permissions,
                granted_by = EXCLUDED.granted_by,
                updated_at = NOW()
            RETURNING user_id, permissions, granted_by, updated_at
            "#,
        )
        .bind(user_id)
        .bind(serde_json::to_value(permissions)?)
        .bind(granted_by)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?
        .try_into()
    }
}
