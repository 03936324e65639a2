//! User operations

use super::rows::UserRow;
use super::{db_error, query_error, PostgresStorageBackend};
use crate::conflicts;
use congress_models::*;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, full_name, email, password_hash, institution, phone, qr_code, \
                            roles, is_active, created_at, updated_at";

fn roles_json(roles: &[Role]) -> CongressResult<serde_json::Value> {
    Ok(serde_json::to_value(Role::normalize(roles.iter().copied()))?)
}

impl PostgresStorageBackend {
    pub async fn create_user_impl(&self, user: NewUser) -> CongressResult<User> {
        let roles = roles_json(&user.roles)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, full_name, email, password_hash, institution, phone, qr_code, roles)
            VALUES ($1, $2, LOWER($3), $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.institution)
        .bind(&user.phone)
        .bind(&user.qr_code)
        .bind(roles)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let qr_clash = matches!(
                &e,
                sqlx::Error::Database(db) if db.constraint() == Some("users_qr_code_key")
            );
            db_error(
                e,
                if qr_clash {
                    conflicts::QR_CODE_TAKEN
                } else {
                    conflicts::EMAIL_TAKEN
                },
            )
        })?;

        row.try_into()
    }

    pub async fn get_user_impl(&self, id: Uuid) -> CongressResult<User> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?
            .ok_or_else(|| CongressError::not_found("User"))?
            .try_into()
    }

    pub async fn find_user_by_email_impl(&self, email: &str) -> CongressResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(User::try_from)
        .transpose()
    }

    pub async fn find_user_by_qr_code_impl(&self, qr_code: &str) -> CongressResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE qr_code = $1",
            USER_COLUMNS
        ))
        .bind(qr_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(User::try_from)
        .transpose()
    }

    pub async fn list_users_impl(&self, filter: &UserFilter) -> CongressResult<Vec<User>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| format!("%{}%", term.to_lowercase()));
        let role = filter
            .role
            .map(|role| serde_json::json!([role.as_str()]));

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {}
            FROM users
            WHERE ($1::text IS NULL OR LOWER(full_name) LIKE $1 OR LOWER(email) LIKE $1)
              AND ($2::jsonb IS NULL OR roles @> $2)
            ORDER BY LOWER(full_name)
            "#,
            USER_COLUMNS
        ))
        .bind(search)
        .bind(role)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        super::rows::convert_rows(rows)
    }

    pub async fn update_user_roles_impl(&self, id: Uuid, roles: &[Role]) -> CongressResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET roles = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(roles_json(roles)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("User"))?
        .try_into()
    }

    pub async fn set_user_active_impl(&self, id: Uuid, is_active: bool) -> CongressResult<User> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("User"))?
        .try_into()
    }
}
