//! Enrollment operations

use super::rows::{convert_rows, EnrollmentRow};
use super::{db_error, query_error, PostgresStorageBackend};
use crate::conflicts;
use congress_models::*;
use uuid::Uuid;

const ENROLLMENT_COLUMNS: &str = "id, user_id, activity_id, status, enrolled_at, updated_at";

impl PostgresStorageBackend {
    /// Insert an enrollment while holding a row lock on the activity, so two
    /// concurrent requests cannot both take the last seat
    pub async fn create_enrollment_impl(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment> {
        let mut tx = self.pool.begin().await.map_err(query_error)?;

        let capacity = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT capacity FROM activities WHERE id = $1 FOR UPDATE",
        )
        .bind(activity_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("Activity"))?;

        let already = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM enrollments
                WHERE user_id = $1 AND activity_id = $2 AND status <> 'cancelled'
            )
            "#,
        )
        .bind(user_id)
        .bind(activity_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(query_error)?;
        if already {
            return Err(CongressError::conflict(conflicts::ALREADY_ENROLLED));
        }

        if let Some(capacity) = capacity {
            let taken = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM enrollments WHERE activity_id = $1 AND status <> 'cancelled'",
            )
            .bind(activity_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(query_error)?;
            if taken >= i64::from(capacity) {
                return Err(CongressError::conflict(conflicts::ACTIVITY_FULL));
            }
        }

        let row = sqlx::query_as::<_, EnrollmentRow>(&format!(
            r#"
            INSERT INTO enrollments (id, user_id, activity_id, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            ENROLLMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(activity_id)
        .bind(status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error(e, conflicts::ALREADY_ENROLLED))?;

        tx.commit().await.map_err(query_error)?;
        row.try_into()
    }

    pub async fn find_open_enrollment_impl(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> CongressResult<Option<Enrollment>> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            r#"
            SELECT {}
            FROM enrollments
            WHERE user_id = $1 AND activity_id = $2 AND status <> 'cancelled'
            "#,
            ENROLLMENT_COLUMNS
        ))
        .bind(user_id)
        .bind(activity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .map(Enrollment::try_from)
        .transpose()
    }

    pub async fn update_enrollment_status_impl(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment> {
        sqlx::query_as::<_, EnrollmentRow>(&format!(
            "UPDATE enrollments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ENROLLMENT_COLUMNS
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, conflicts::ALREADY_ENROLLED))?
        .ok_or_else(|| CongressError::not_found("Enrollment"))?
        .try_into()
    }

    /// `column` is a fixed identifier chosen by the caller, never user input
    pub async fn list_enrollments_impl(
        &self,
        column: &'static str,
        id: Uuid,
    ) -> CongressResult<Vec<Enrollment>> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(&format!(
            "SELECT {} FROM enrollments WHERE {} = $1 ORDER BY enrolled_at",
            ENROLLMENT_COLUMNS, column
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        convert_rows(rows)
    }
}
