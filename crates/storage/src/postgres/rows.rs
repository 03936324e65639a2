//! Database row structures for PostgreSQL

use chrono::{DateTime, NaiveDate, Utc};
use congress_models::*;
use sqlx::FromRow;
use uuid::Uuid;

fn bad_column(column: &str, reason: impl std::fmt::Display) -> CongressError {
    CongressError::database(format!("invalid {} column: {}", column, reason))
}

/// Database row for users table
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub institution: Option<String>,
    pub phone: Option<String>,
    pub qr_code: String,
    pub roles: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CongressError;

    fn try_from(row: UserRow) -> CongressResult<Self> {
        let roles: Vec<Role> =
            serde_json::from_value(row.roles).map_err(|e| bad_column("roles", e))?;
        Ok(User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            institution: row.institution,
            phone: row.phone,
            qr_code: row.qr_code,
            roles: Role::normalize(roles),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for admin_permissions table
#[derive(Debug, FromRow)]
pub struct AdminPermissionsRow {
    pub user_id: Uuid,
    pub permissions: serde_json::Value,
    pub granted_by: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AdminPermissionsRow> for AdminPermissions {
    type Error = CongressError;

    fn try_from(row: AdminPermissionsRow) -> CongressResult<Self> {
        Ok(AdminPermissions {
            user_id: row.user_id,
            permissions: serde_json::from_value(row.permissions)
                .map_err(|e| bad_column("permissions", e))?,
            granted_by: row.granted_by,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for activities table
#[derive(Debug, FromRow)]
pub struct ActivityRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub kind: String,
    pub speaker: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ActivityRow> for Activity {
    type Error = CongressError;

    fn try_from(row: ActivityRow) -> CongressResult<Self> {
        Ok(Activity {
            id: row.id,
            title: row.title,
            description: row.description,
            kind: row.kind.parse().map_err(|e| bad_column("kind", e))?,
            speaker: row.speaker,
            location: row.location,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            capacity: row.capacity,
            price_cents: row.price_cents,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Activity row joined with its open enrollment count
#[derive(Debug, FromRow)]
pub struct ActivitySummaryRow {
    #[sqlx(flatten)]
    pub activity: ActivityRow,
    pub enrolled_count: i64,
}

/// Database row for enrollments table
#[derive(Debug, FromRow)]
pub struct EnrollmentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub status: String,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EnrollmentRow> for Enrollment {
    type Error = CongressError;

    fn try_from(row: EnrollmentRow) -> CongressResult<Self> {
        Ok(Enrollment {
            id: row.id,
            user_id: row.user_id,
            activity_id: row.activity_id,
            status: row.status.parse().map_err(|e| bad_column("status", e))?,
            enrolled_at: row.enrolled_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database row for attendance table
#[derive(Debug, FromRow)]
pub struct AttendanceRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub session_date: NaiveDate,
    pub scanned_by: Option<Uuid>,
    pub scanned_at: DateTime<Utc>,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            id: row.id,
            user_id: row.user_id,
            activity_id: row.activity_id,
            session_date: row.session_date,
            scanned_by: row.scanned_by,
            scanned_at: row.scanned_at,
        }
    }
}

/// Database row for payments table
#[derive(Debug, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Option<Uuid>,
    pub amount_cents: i64,
    pub method: String,
    pub reference: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = CongressError;

    fn try_from(row: PaymentRow) -> CongressResult<Self> {
        Ok(Payment {
            id: row.id,
            user_id: row.user_id,
            activity_id: row.activity_id,
            amount_cents: row.amount_cents,
            method: row.method.parse().map_err(|e| bad_column("method", e))?,
            reference: row.reference,
            status: row.status.parse().map_err(|e| bad_column("status", e))?,
            created_at: row.created_at,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
        })
    }
}

/// Database row for diplomas table
#[derive(Debug, FromRow)]
pub struct DiplomaRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_id: Uuid,
    pub kind: String,
    pub place: Option<i16>,
    pub verification_code: String,
    pub issued_at: DateTime<Utc>,
}

impl TryFrom<DiplomaRow> for Diploma {
    type Error = CongressError;

    fn try_from(row: DiplomaRow) -> CongressResult<Self> {
        Ok(Diploma {
            id: row.id,
            user_id: row.user_id,
            activity_id: row.activity_id,
            kind: DiplomaKind::from_parts(&row.kind, row.place)?,
            verification_code: row.verification_code,
            issued_at: row.issued_at,
        })
    }
}

/// Database row for audit_log table
#[derive(Debug, FromRow)]
pub struct AuditRow {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<AuditRow> for AuditEntry {
    fn from(row: AuditRow) -> Self {
        AuditEntry {
            id: row.id,
            actor_id: row.actor_id,
            action: row.action,
            entity: row.entity,
            entity_id: row.entity_id,
            details: row.details,
            created_at: row.created_at,
        }
    }
}

/// Convert a batch of rows, failing on the first bad one
pub(crate) fn convert_rows<R, T>(rows: Vec<R>) -> CongressResult<Vec<T>>
where
    T: TryFrom<R, Error = CongressError>,
{
    rows.into_iter().map(T::try_from).collect()
}
