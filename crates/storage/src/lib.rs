use chrono::NaiveDate;
use congress_models::*;
use uuid::Uuid;

mod memory;
pub use memory::*;

mod postgres;
pub use postgres::*;

/// Conflict messages shared by both backends
pub mod conflicts {
    pub const EMAIL_TAKEN: &str = "email already registered";
    pub const QR_CODE_TAKEN: &str = "qr code already assigned";
    pub const ALREADY_ENROLLED: &str = "already enrolled in this activity";
    pub const ACTIVITY_FULL: &str = "activity is full";
    pub const ATTENDANCE_RECORDED: &str = "attendance already recorded";
    pub const PAYMENT_OPEN: &str = "a payment for this item is already pending or completed";
    pub const PAYMENT_REVIEWED: &str = "payment has already been reviewed";
    pub const DIPLOMA_ISSUED: &str = "diploma already issued";
}

/// Storage backend trait
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reachability check used by the readiness route
    async fn ping(&self) -> CongressResult<()>;

    // User methods
    async fn create_user(&self, user: NewUser) -> CongressResult<User>;
    async fn get_user(&self, id: Uuid) -> CongressResult<User>;
    async fn find_user_by_email(&self, email: &str) -> CongressResult<Option<User>>;
    async fn find_user_by_qr_code(&self, qr_code: &str) -> CongressResult<Option<User>>;
    async fn list_users(&self, filter: &UserFilter) -> CongressResult<Vec<User>>;
    async fn update_user_roles(&self, id: Uuid, roles: &[Role]) -> CongressResult<User>;
    async fn set_user_active(&self, id: Uuid, is_active: bool) -> CongressResult<User>;

    // Admin permission methods
    async fn get_admin_permissions(&self, user_id: Uuid)
        -> CongressResult<Option<AdminPermissions>>;
    async fn save_admin_permissions(
        &self,
        user_id: Uuid,
        permissions: &[Permission],
        granted_by: Option<Uuid>,
    ) -> CongressResult<AdminPermissions>;

    // Activity methods
    async fn create_activity(&self, activity: &Activity) -> CongressResult<Activity>;
    async fn get_activity(&self, id: Uuid) -> CongressResult<Activity>;
    async fn list_activities(&self, include_inactive: bool) -> CongressResult<Vec<ActivitySummary>>;
    async fn update_activity(&self, activity: &Activity) -> CongressResult<Activity>;

    // Enrollment methods

    /// Insert an enrollment. The one-open-enrollment rule and the activity
    /// capacity are checked atomically with the insert.
    async fn create_enrollment(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment>;
    async fn find_open_enrollment(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> CongressResult<Option<Enrollment>>;
    async fn update_enrollment_status(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment>;
    async fn list_user_enrollments(&self, user_id: Uuid) -> CongressResult<Vec<Enrollment>>;
    async fn list_activity_enrollments(&self, activity_id: Uuid)
        -> CongressResult<Vec<Enrollment>>;

    // Attendance methods

    /// Insert a scan; `Conflict` when the user already has one for the same
    /// day (general) or the same activity
    async fn record_attendance(&self, attendance: NewAttendance) -> CongressResult<Attendance>;
    async fn list_user_attendance(&self, user_id: Uuid) -> CongressResult<Vec<Attendance>>;
    async fn list_activity_attendance(&self, activity_id: Uuid)
        -> CongressResult<Vec<Attendance>>;
    async fn list_general_attendance(
        &self,
        date: Option<NaiveDate>,
    ) -> CongressResult<Vec<Attendance>>;

    // Payment methods
    async fn create_payment(&self, payment: NewPayment) -> CongressResult<Payment>;
    async fn get_payment(&self, id: Uuid) -> CongressResult<Payment>;

    /// Move a pending payment to `status`. Completing an activity payment
    /// also confirms the user's pending enrollment in the same transaction.
    async fn review_payment(
        &self,
        id: Uuid,
        status: PaymentStatus,
        reviewer: Uuid,
    ) -> CongressResult<Payment>;
    async fn list_payments(
        &self,
        user_id: Option<Uuid>,
        status: Option<PaymentStatus>,
    ) -> CongressResult<Vec<Payment>>;
    async fn has_completed_payment(
        &self,
        user_id: Uuid,
        activity_id: Option<Uuid>,
    ) -> CongressResult<bool>;

    // Diploma methods
    async fn create_diploma(&self, diploma: NewDiploma) -> CongressResult<Diploma>;
    async fn list_user_diplomas(&self, user_id: Uuid) -> CongressResult<Vec<Diploma>>;
    async fn list_activity_diplomas(&self, activity_id: Uuid) -> CongressResult<Vec<Diploma>>;
    async fn find_diploma_by_code(&self, code: &str) -> CongressResult<Option<Diploma>>;

    // Audit methods
    async fn append_audit(&self, entry: NewAuditEntry) -> CongressResult<AuditEntry>;
    async fn list_audit(&self, entity: Option<&str>, limit: u32)
        -> CongressResult<Vec<AuditEntry>>;

    // Report methods
    async fn congress_summary(&self) -> CongressResult<CongressSummary>;

    /// Raw counts for one activity; `attendance_rate` is left at 0
    async fn activity_report(&self, activity_id: Uuid) -> CongressResult<ActivityReport>;
}
