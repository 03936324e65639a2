//! PostgreSQL storage backend implementation

mod activities;
mod attendance;
mod audit;
mod diplomas;
mod enrollments;
mod payments;
mod permissions;
mod reports;
mod rows;
mod users;

pub use rows::*;

use super::StorageBackend;
use anyhow::Result;
use chrono::NaiveDate;
use congress_models::*;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

/// Map a sqlx error, turning unique violations into `Conflict`
pub(crate) fn db_error(err: sqlx::Error, conflict: &str) -> CongressError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => CongressError::conflict(conflict),
        other => CongressError::database(other.to_string()),
    }
}

pub(crate) fn query_error(err: sqlx::Error) -> CongressError {
    CongressError::database(err.to_string())
}

/// PostgreSQL storage backend
pub struct PostgresStorageBackend {
    pool: PgPool,
}

impl PostgresStorageBackend {
    /// Connect and apply pending migrations
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to PostgreSQL database...");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))?;

        info!("Successfully connected to PostgreSQL");

        // sqlx only applies migrations that are not recorded yet
        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            if e.to_string().contains("already exists") || e.to_string().contains("duplicate") {
                info!("Skipping migrations (already applied by a concurrent instance)");
            } else {
                return Err(anyhow::anyhow!("Failed to run migrations: {}", e));
            }
        } else {
            info!("Database migrations completed");
        }

        Ok(Self { pool })
    }

    /// Get the underlying database connection pool
    pub fn get_db_pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl StorageBackend for PostgresStorageBackend {
    async fn ping(&self) -> CongressResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| ())
            .map_err(query_error)
    }

    async fn create_user(&self, user: NewUser) -> CongressResult<User> {
        self.create_user_impl(user).await
    }

    async fn get_user(&self, id: Uuid) -> CongressResult<User> {
        self.get_user_impl(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> CongressResult<Option<User>> {
        self.find_user_by_email_impl(email).await
    }

    async fn find_user_by_qr_code(&self, qr_code: &str) -> CongressResult<Option<User>> {
        self.find_user_by_qr_code_impl(qr_code).await
    }

    async fn list_users(&self, filter: &UserFilter) -> CongressResult<Vec<User>> {
        self.list_users_impl(filter).await
    }

    async fn update_user_roles(&self, id: Uuid, roles: &[Role]) -> CongressResult<User> {
        self.update_user_roles_impl(id, roles).await
    }

    async fn set_user_active(&self, id: Uuid, is_active: bool) -> CongressResult<User> {
        self.set_user_active_impl(id, is_active).await
    }

    async fn get_admin_permissions(
        &self,
        user_id: Uuid,
    ) -> CongressResult<Option<AdminPermissions>> {
        self.get_admin_permissions_impl(user_id).await
    }

    async fn save_admin_permissions(
        &self,
        user_id: Uuid,
        permissions: &[Permission],
        granted_by: Option<Uuid>,
    ) -> CongressResult<AdminPermissions> {
        self.save_admin_permissions_impl(user_id, permissions, granted_by)
            .await
    }

    async fn create_activity(&self, activity: &Activity) -> CongressResult<Activity> {
        self.create_activity_impl(activity).await
    }

    async fn get_activity(&self, id: Uuid) -> CongressResult<Activity> {
        self.get_activity_impl(id).await
    }

    async fn list_activities(&self, include_inactive: bool) -> CongressResult<Vec<ActivitySummary>> {
        self.list_activities_impl(include_inactive).await
    }

    async fn update_activity(&self, activity: &Activity) -> CongressResult<Activity> {
        self.update_activity_impl(activity).await
    }

    async fn create_enrollment(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment> {
        self.create_enrollment_impl(user_id, activity_id, status)
            .await
    }

    async fn find_open_enrollment(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> CongressResult<Option<Enrollment>> {
        self.find_open_enrollment_impl(user_id, activity_id).await
    }

    async fn update_enrollment_status(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment> {
        self.update_enrollment_status_impl(id, status).await
    }

    async fn list_user_enrollments(&self, user_id: Uuid) -> CongressResult<Vec<Enrollment>> {
        self.list_enrollments_impl("user_id", user_id).await
    }

    async fn list_activity_enrollments(
        &self,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Enrollment>> {
        self.list_enrollments_impl("activity_id", activity_id).await
    }

    async fn record_attendance(&self, attendance: NewAttendance) -> CongressResult<Attendance> {
        self.record_attendance_impl(attendance).await
    }

    async fn list_user_attendance(&self, user_id: Uuid) -> CongressResult<Vec<Attendance>> {
        self.list_user_attendance_impl(user_id).await
    }

    async fn list_activity_attendance(
        &self,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Attendance>> {
        self.list_activity_attendance_impl(activity_id).await
    }

    async fn list_general_attendance(
        &self,
        date: Option<NaiveDate>,
    ) -> CongressResult<Vec<Attendance>> {
        self.list_general_attendance_impl(date).await
    }

    async fn create_payment(&self, payment: NewPayment) -> CongressResult<Payment> {
        self.create_payment_impl(payment).await
    }

    async fn get_payment(&self, id: Uuid) -> CongressResult<Payment> {
        self.get_payment_impl(id).await
    }

    async fn review_payment(
        &self,
        id: Uuid,
        status: PaymentStatus,
        reviewer: Uuid,
    ) -> CongressResult<Payment> {
        self.review_payment_impl(id, status, reviewer).await
    }

    async fn list_payments(
        &self,
        user_id: Option<Uuid>,
        status: Option<PaymentStatus>,
    ) -> CongressResult<Vec<Payment>> {
        self.list_payments_impl(user_id, status).await
    }

    async fn has_completed_payment(
        &self,
        user_id: Uuid,
        activity_id: Option<Uuid>,
    ) -> CongressResult<bool> {
        self.has_completed_payment_impl(user_id, activity_id).await
    }

    async fn create_diploma(&self, diploma: NewDiploma) -> CongressResult<Diploma> {
        self.create_diploma_impl(diploma).await
    }

    async fn list_user_diplomas(&self, user_id: Uuid) -> CongressResult<Vec<Diploma>> {
        self.list_diplomas_impl("user_id", user_id).await
    }

    async fn list_activity_diplomas(&self, activity_id: Uuid) -> CongressResult<Vec<Diploma>> {
        self.list_diplomas_impl("activity_id", activity_id).await
    }

    async fn find_diploma_by_code(&self, code: &str) -> CongressResult<Option<Diploma>> {
        self.find_diploma_by_code_impl(code).await
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> CongressResult<AuditEntry> {
        self.append_audit_impl(entry).await
    }

    async fn list_audit(
        &self,
        entity: Option<&str>,
        limit: u32,
    ) -> CongressResult<Vec<AuditEntry>> {
        self.list_audit_impl(entity, limit).await
    }

    async fn congress_summary(&self) -> CongressResult<CongressSummary> {
        self.congress_summary_impl().await
    }

    async fn activity_report(&self, activity_id: Uuid) -> CongressResult<ActivityReport> {
        self.activity_report_impl(activity_id).await
    }
}
