//! QR check-in
//!
//! A scan resolves the attendee from the QR payload and inserts one
//! attendance row. Uniqueness is enforced by the storage backend, so
//! concurrent scans of the same code yield one record and one conflict.

use super::audit::AuditLog;
use super::permissions::PermissionService;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use congress_crypto::parse_qr_payload;
use congress_models::*;
use congress_storage::StorageBackend;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Calendar date of `now` at the venue
pub fn session_date(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

pub struct AttendanceService {
    storage: Arc<dyn StorageBackend>,
    permissions: Arc<PermissionService>,
    audit: Arc<AuditLog>,
    offset: FixedOffset,
}

impl AttendanceService {
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        permissions: Arc<PermissionService>,
        audit: Arc<AuditLog>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            storage,
            permissions,
            audit,
            offset,
        }
    }

    pub fn today(&self) -> NaiveDate {
        session_date(Utc::now(), self.offset)
    }

    async fn resolve_attendee(&self, payload: &str) -> CongressResult<User> {
        let code = parse_qr_payload(payload)
            .map_err(|e| CongressError::invalid(format!("unreadable QR code: {}", e)))?;

        let user = self
            .storage
            .find_user_by_qr_code(&code)
            .await?
            .ok_or_else(|| CongressError::not_found("Attendee"))?;
        if !user.is_active {
            warn!(user_id = %user.id, "Scan of a deactivated account");
            return Err(CongressError::forbidden("attendee account is deactivated"));
        }
        Ok(user)
    }

    async fn record(
        &self,
        scanner: &User,
        attendee: User,
        activity_id: Option<Uuid>,
    ) -> CongressResult<CheckInResponse> {
        let attendance = self
            .storage
            .record_attendance(NewAttendance {
                user_id: attendee.id,
                activity_id,
                session_date: self.today(),
                scanned_by: Some(scanner.id),
            })
            .await?;

        info!(
            user_id = %attendee.id,
            activity_id = ?activity_id,
            session_date = %attendance.session_date,
            scanned_by = %scanner.id,
            "Attendance recorded"
        );
        self.audit
            .record(
                NewAuditEntry::new("attendance.recorded", "attendance")
                    .actor(scanner.id)
                    .entity_id(attendance.id)
                    .details(json!({
                        "user_id": attendee.id,
                        "activity_id": activity_id,
                        "session_date": attendance.session_date,
                    })),
            )
            .await;

        Ok(CheckInResponse {
            attendance,
            attendee: Attendee {
                id: attendee.id,
                full_name: attendee.full_name,
                email: attendee.email,
                institution: attendee.institution,
            },
        })
    }

    /// Entrance scan, once per attendee per congress day
    pub async fn check_in_general(
        &self,
        scanner: &User,
        payload: &str,
    ) -> CongressResult<CheckInResponse> {
        self.permissions
            .require(scanner, Permission::ManageAttendance)
            .await?;
        let attendee = self.resolve_attendee(payload).await?;
        self.record(scanner, attendee, None).await
    }

    /// Activity scan; requires a confirmed enrollment
    pub async fn check_in_activity(
        &self,
        scanner: &User,
        activity_id: Uuid,
        payload: &str,
    ) -> CongressResult<CheckInResponse> {
        self.permissions
            .require(scanner, Permission::ManageAttendance)
            .await?;

        let activity = self.storage.get_activity(activity_id).await?;
        if !activity.is_active {
            return Err(CongressError::invalid("activity is not active"));
        }
        let attendee = self.resolve_attendee(payload).await?;

        let confirmed = self
            .storage
            .find_open_enrollment(attendee.id, activity.id)
            .await?
            .map_or(false, |e| e.status == EnrollmentStatus::Confirmed);
        if !confirmed {
            return Err(CongressError::forbidden(
                "attendee has no confirmed enrollment for this activity",
            ));
        }

        self.record(scanner, attendee, Some(activity.id)).await
    }

    pub async fn my_attendance(&self, user: &User) -> CongressResult<Vec<Attendance>> {
        self.storage.list_user_attendance(user.id).await
    }

    pub async fn activity_attendance(
        &self,
        actor: &User,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Attendance>> {
        self.permissions
            .require(actor, Permission::ManageAttendance)
            .await?;
        let activity = self.storage.get_activity(activity_id).await?;
        self.storage.list_activity_attendance(activity.id).await
    }

    pub async fn general_attendance(
        &self,
        actor: &User,
        date: Option<NaiveDate>,
    ) -> CongressResult<Vec<Attendance>> {
        self.permissions
            .require(actor, Permission::ManageAttendance)
            .await?;
        self.storage.list_general_attendance(date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_date_uses_venue_offset() {
        // 03:30 UTC is still the previous evening six hours west
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 3, 30, 0).unwrap();
        let west = FixedOffset::west_opt(6 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        assert_eq!(
            session_date(now, west),
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
        );
        assert_eq!(
            session_date(now, utc),
            NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
        );
    }
}
