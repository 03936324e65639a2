//! Aggregate queries for the reporting endpoints

use super::{query_error, PostgresStorageBackend};
use chrono::NaiveDate;
use congress_models::*;
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct SummaryCountsRow {
    total_users: i64,
    active_users: i64,
    total_activities: i64,
    active_activities: i64,
    confirmed_enrollments: i64,
    activity_attendance_total: i64,
    revenue_cents: i64,
    diplomas_issued: i64,
}

#[derive(Debug, FromRow)]
struct ActivityCountsRow {
    title: String,
    pending_payment: i64,
    confirmed: i64,
    cancelled: i64,
    attended: i64,
    diplomas_issued: i64,
}

impl PostgresStorageBackend {
    pub async fn congress_summary_impl(&self) -> CongressResult<CongressSummary> {
        let counts = sqlx::query_as::<_, SummaryCountsRow>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM users WHERE is_active) AS active_users,
                (SELECT COUNT(*) FROM activities) AS total_activities,
                (SELECT COUNT(*) FROM activities WHERE is_active) AS active_activities,
                (SELECT COUNT(*) FROM enrollments WHERE status = 'confirmed') AS confirmed_enrollments,
                (SELECT COUNT(*) FROM attendance WHERE activity_id IS NOT NULL) AS activity_attendance_total,
                (SELECT COALESCE(SUM(amount_cents), 0)::BIGINT FROM payments WHERE status = 'completed') AS revenue_cents,
                (SELECT COUNT(*) FROM diplomas) AS diplomas_issued
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        let daily = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT session_date, COUNT(*)
            FROM attendance
            WHERE activity_id IS NULL
            GROUP BY session_date
            ORDER BY session_date
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let by_status = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM payments GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(CongressSummary {
            total_users: counts.total_users,
            active_users: counts.active_users,
            total_activities: counts.total_activities,
            active_activities: counts.active_activities,
            confirmed_enrollments: counts.confirmed_enrollments,
            general_attendance: daily
                .into_iter()
                .map(|(session_date, count)| DailyAttendance {
                    session_date,
                    count,
                })
                .collect(),
            activity_attendance_total: counts.activity_attendance_total,
            revenue_cents: counts.revenue_cents,
            payments_by_status: by_status.into_iter().collect::<BTreeMap<_, _>>(),
            diplomas_issued: counts.diplomas_issued,
        })
    }

    pub async fn activity_report_impl(&self, activity_id: Uuid) -> CongressResult<ActivityReport> {
        let row = sqlx::query_as::<_, ActivityCountsRow>(
            r#"
            SELECT
                a.title,
                (SELECT COUNT(*) FROM enrollments e WHERE e.activity_id = a.id AND e.status = 'pending_payment') AS pending_payment,
                (SELECT COUNT(*) FROM enrollments e WHERE e.activity_id = a.id AND e.status = 'confirmed') AS confirmed,
                (SELECT COUNT(*) FROM enrollments e WHERE e.activity_id = a.id AND e.status = 'cancelled') AS cancelled,
                (SELECT COUNT(*) FROM attendance t WHERE t.activity_id = a.id) AS attended,
                (SELECT COUNT(*) FROM diplomas d WHERE d.activity_id = a.id) AS diplomas_issued
            FROM activities a
            WHERE a.id = $1
            "#,
        )
        .bind(activity_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or_else(|| CongressError::not_found("Activity"))?;

        Ok(ActivityReport {
            activity_id,
            title: row.title,
            pending_payment: row.pending_payment,
            confirmed: row.confirmed,
            cancelled: row.cancelled,
            attended: row.attended,
            attendance_rate: 0.0,
            diplomas_issued: row.diplomas_issued,
        })
    }
}
