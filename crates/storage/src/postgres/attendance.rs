//! Attendance operations

use super::rows::AttendanceRow;
use super::{db_error, query_error, PostgresStorageBackend};
use crate::conflicts;
use chrono::NaiveDate;
use congress_models::*;
use uuid::Uuid;

const ATTENDANCE_COLUMNS: &str = "id, user_id, activity_id, session_date, scanned_by, scanned_at";

impl PostgresStorageBackend {
    /// Duplicates are rejected by the partial unique indexes on attendance
    pub async fn record_attendance_impl(
        &self,
        attendance: NewAttendance,
    ) -> CongressResult<Attendance> {
        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            INSERT INTO attendance (id, user_id, activity_id, session_date, scanned_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(attendance.user_id)
        .bind(attendance.activity_id)
        .bind(attendance.session_date)
        .bind(attendance.scanned_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, conflicts::ATTENDANCE_RECORDED))?;

        Ok(row.into())
    }

    pub async fn list_user_attendance_impl(&self, user_id: Uuid) -> CongressResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE user_id = $1 ORDER BY scanned_at",
            ATTENDANCE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.into_iter().map(Attendance::from).collect())
    }

    pub async fn list_activity_attendance_impl(
        &self,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE activity_id = $1 ORDER BY scanned_at",
            ATTENDANCE_COLUMNS
        ))
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.into_iter().map(Attendance::from).collect())
    }

    pub async fn list_general_attendance_impl(
        &self,
        date: Option<NaiveDate>,
    ) -> CongressResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            SELECT {}
            FROM attendance
            WHERE activity_id IS NULL AND ($1::date IS NULL OR session_date = $1)
            ORDER BY scanned_at
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(rows.into_iter().map(Attendance::from).collect())
    }
}
