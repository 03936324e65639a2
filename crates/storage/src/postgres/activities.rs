//! Activity operations

use super::rows::{ActivityRow, ActivitySummaryRow};
use super::{query_error, PostgresStorageBackend};
use congress_models::*;
use uuid::Uuid;

const ACTIVITY_COLUMNS: &str = "id, title, description, kind, speaker, location, starts_at, \
                                ends_at, capacity, price_cents, is_active, created_at, updated_at";

impl PostgresStorageBackend {
    pub async fn create_activity_impl(&self, activity: &Activity) -> CongressResult<Activity> {
        sqlx::query_as::<_, ActivityRow>(&format!(
            r#"
            INSERT INTO activities
                (id, title, description, kind, speaker, location, starts_at, ends_at,
                 capacity, price_cents, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(activity.id)
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(activity.kind.as_str())
        .bind(&activity.speaker)
        .bind(&activity.location)
        .bind(activity.starts_at)
        .bind(activity.ends_at)
        .bind(activity.capacity)
        .bind(activity.price_cents)
        .bind(activity.is_active)
        .bind(activity.created_at)
        .bind(activity.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?
        .try_into()
    }

    pub async fn get_activity_impl(&self, id: Uuid) -> CongressResult<Activity> {
        sqlx::query_as::<_, ActivityRow>(&format!(
            "SELECT {} FROM activities WHERE id = $1",
            ACTIVITY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("Activity"))?
        .try_into()
    }

    /// Activities ordered by start time, with their open enrollment count
    pub async fn list_activities_impl(
        &self,
        include_inactive: bool,
    ) -> CongressResult<Vec<ActivitySummary>> {
        let rows = sqlx::query_as::<_, ActivitySummaryRow>(
            r#"
            SELECT a.id, a.title, a.description, a.kind, a.speaker, a.location, a.starts_at,
                   a.ends_at, a.capacity, a.price_cents, a.is_active, a.created_at, a.updated_at,
                   COUNT(e.id) FILTER (WHERE e.status <> 'cancelled') AS enrolled_count
            FROM activities a
            LEFT JOIN enrollments e ON e.activity_id = a.id
            WHERE $1 OR a.is_active
            GROUP BY a.id
            ORDER BY a.starts_at
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.into_iter()
            .map(|row| {
                Ok::<_, CongressError>(ActivitySummary {
                    activity: Activity::try_from(row.activity)?,
                    enrolled_count: row.enrolled_count,
                })
            })
            .collect()
    }

    pub async fn update_activity_impl(&self, activity: &Activity) -> CongressResult<Activity> {
        sqlx::query_as::<_, ActivityRow>(&format!(
            r#"
            UPDATE activities
            SET title = $2, description = $3, kind = $4, speaker = $5, location = $6,
                starts_at = $7, ends_at = $8, capacity = $9, price_cents = $10,
                is_active = $11, updated_at = $12
            WHERE id = $1
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        ))
        .bind(activity.id)
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(activity.kind.as_str())
        .bind(&activity.speaker)
        .bind(&activity.location)
        .bind(activity.starts_at)
        .bind(activity.ends_at)
        .bind(activity.capacity)
        .bind(activity.price_cents)
        .bind(activity.is_active)
        .bind(activity.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("Activity"))?
        .try_into()
    }
}
