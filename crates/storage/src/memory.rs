//! In-memory storage backend
//!
//! Every table lives behind a single `RwLock`, so the uniqueness and
//! capacity checks below happen under the same write guard as the insert.

use super::{conflicts, StorageBackend};
use chrono::{NaiveDate, Utc};
use congress_models::*;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    admin_permissions: HashMap<Uuid, AdminPermissions>,
    activities: HashMap<Uuid, Activity>,
    enrollments: HashMap<Uuid, Enrollment>,
    attendance: Vec<Attendance>,
    payments: HashMap<Uuid, Payment>,
    diplomas: Vec<Diploma>,
    audit: Vec<AuditEntry>,
}

impl Tables {
    fn user(&self, id: Uuid) -> CongressResult<&User> {
        self.users
            .get(&id)
            .ok_or_else(|| CongressError::not_found("User"))
    }

    fn open_enrollment(&self, user_id: Uuid, activity_id: Uuid) -> Option<&Enrollment> {
        self.enrollments.values().find(|e| {
            e.user_id == user_id && e.activity_id == activity_id && e.status.is_open()
        })
    }
}

/// Storage backend used in development and tests
#[derive(Default)]
pub struct MemoryStorageBackend {
    tables: RwLock<Tables>,
}

impl MemoryStorageBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

#[async_trait::async_trait]
impl StorageBackend for MemoryStorageBackend {
    async fn ping(&self) -> CongressResult<()> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> CongressResult<User> {
        let mut tables = self.tables.write().await;

        let email = user.email.to_lowercase();
        if tables.users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(CongressError::conflict(conflicts::EMAIL_TAKEN));
        }
        if tables.users.values().any(|u| u.qr_code == user.qr_code) {
            return Err(CongressError::conflict(conflicts::QR_CODE_TAKEN));
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            email,
            password_hash: user.password_hash,
            institution: user.institution,
            phone: user.phone,
            qr_code: user.qr_code,
            roles: Role::normalize(user.roles),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> CongressResult<User> {
        self.tables.read().await.user(id).cloned()
    }

    async fn find_user_by_email(&self, email: &str) -> CongressResult<Option<User>> {
        let email = email.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_user_by_qr_code(&self, qr_code: &str) -> CongressResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.qr_code == qr_code).cloned())
    }

    async fn list_users(&self, filter: &UserFilter) -> CongressResult<Vec<User>> {
        let tables = self.tables.read().await;
        let users = tables
            .users
            .values()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect();
        Ok(sorted_by(users, |u: &User| u.full_name.to_lowercase()))
    }

    async fn update_user_roles(&self, id: Uuid, roles: &[Role]) -> CongressResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| CongressError::not_found("User"))?;
        user.roles = Role::normalize(roles.iter().copied());
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_user_active(&self, id: Uuid, is_active: bool) -> CongressResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| CongressError::not_found("User"))?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn get_admin_permissions(
        &self,
        user_id: Uuid,
    ) -> CongressResult<Option<AdminPermissions>> {
        Ok(self
            .tables
            .read()
            .await
            .admin_permissions
            .get(&user_id)
            .cloned())
    }

    async fn save_admin_permissions(
        &self,
        user_id: Uuid,
        permissions: &[Permission],
        granted_by: Option<Uuid>,
    ) -> CongressResult<AdminPermissions> {
        let mut tables = self.tables.write().await;
        tables.user(user_id)?;

        let record = AdminPermissions {
            user_id,
            permissions: permissions.to_vec(),
            granted_by,
            updated_at: Utc::now(),
        };
        tables.admin_permissions.insert(user_id, record.clone());
        Ok(record)
    }

    async fn create_activity(&self, activity: &Activity) -> CongressResult<Activity> {
        let mut tables = self.tables.write().await;
        tables.activities.insert(activity.id, activity.clone());
        Ok(activity.clone())
    }

    async fn get_activity(&self, id: Uuid) -> CongressResult<Activity> {
        self.tables
            .read()
            .await
            .activities
            .get(&id)
            .cloned()
            .ok_or_else(|| CongressError::not_found("Activity"))
    }

    async fn list_activities(&self, include_inactive: bool) -> CongressResult<Vec<ActivitySummary>> {
        let tables = self.tables.read().await;
        let summaries = tables
            .activities
            .values()
            .filter(|a| include_inactive || a.is_active)
            .map(|a| ActivitySummary {
                activity: a.clone(),
                enrolled_count: tables
                    .enrollments
                    .values()
                    .filter(|e| e.activity_id == a.id && e.status.is_open())
                    .count() as i64,
            })
            .collect();
        Ok(sorted_by(summaries, |s: &ActivitySummary| s.activity.starts_at))
    }

    async fn update_activity(&self, activity: &Activity) -> CongressResult<Activity> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .activities
            .get_mut(&activity.id)
            .ok_or_else(|| CongressError::not_found("Activity"))?;
        *stored = activity.clone();
        Ok(activity.clone())
    }

    async fn create_enrollment(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment> {
        let mut tables = self.tables.write().await;
        tables.user(user_id)?;
        let capacity = tables
            .activities
            .get(&activity_id)
            .ok_or_else(|| CongressError::not_found("Activity"))?
            .capacity;

        if tables.open_enrollment(user_id, activity_id).is_some() {
            return Err(CongressError::conflict(conflicts::ALREADY_ENROLLED));
        }
        if let Some(capacity) = capacity {
            let taken = tables
                .enrollments
                .values()
                .filter(|e| e.activity_id == activity_id && e.status.is_open())
                .count();
            if taken >= capacity as usize {
                return Err(CongressError::conflict(conflicts::ACTIVITY_FULL));
            }
        }

        let now = Utc::now();
        let enrollment = Enrollment {
            id: Uuid::new_v4(),
            user_id,
            activity_id,
            status,
            enrolled_at: now,
            updated_at: now,
        };
        tables.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    async fn find_open_enrollment(
        &self,
        user_id: Uuid,
        activity_id: Uuid,
    ) -> CongressResult<Option<Enrollment>> {
        Ok(self
            .tables
            .read()
            .await
            .open_enrollment(user_id, activity_id)
            .cloned())
    }

    async fn update_enrollment_status(
        &self,
        id: Uuid,
        status: EnrollmentStatus,
    ) -> CongressResult<Enrollment> {
        let mut tables = self.tables.write().await;
        let enrollment = tables
            .enrollments
            .get_mut(&id)
            .ok_or_else(|| CongressError::not_found("Enrollment"))?;
        enrollment.status = status;
        enrollment.updated_at = Utc::now();
        Ok(enrollment.clone())
    }

    async fn list_user_enrollments(&self, user_id: Uuid) -> CongressResult<Vec<Enrollment>> {
        let tables = self.tables.read().await;
        let items = tables
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by(items, |e: &Enrollment| e.enrolled_at))
    }

    async fn list_activity_enrollments(
        &self,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Enrollment>> {
        let tables = self.tables.read().await;
        let items = tables
            .enrollments
            .values()
            .filter(|e| e.activity_id == activity_id)
            .cloned()
            .collect();
        Ok(sorted_by(items, |e: &Enrollment| e.enrolled_at))
    }

    async fn record_attendance(&self, attendance: NewAttendance) -> CongressResult<Attendance> {
        let mut tables = self.tables.write().await;
        tables.user(attendance.user_id)?;

        let duplicate = tables.attendance.iter().any(|a| {
            a.user_id == attendance.user_id
                && match attendance.activity_id {
                    Some(activity_id) => a.activity_id == Some(activity_id),
                    None => a.activity_id.is_none() && a.session_date == attendance.session_date,
                }
        });
        if duplicate {
            return Err(CongressError::conflict(conflicts::ATTENDANCE_RECORDED));
        }

        let record = Attendance {
            id: Uuid::new_v4(),
            user_id: attendance.user_id,
            activity_id: attendance.activity_id,
            session_date: attendance.session_date,
            scanned_by: attendance.scanned_by,
            scanned_at: Utc::now(),
        };
        tables.attendance.push(record.clone());
        Ok(record)
    }

    async fn list_user_attendance(&self, user_id: Uuid) -> CongressResult<Vec<Attendance>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendance
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_activity_attendance(
        &self,
        activity_id: Uuid,
    ) -> CongressResult<Vec<Attendance>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendance
            .iter()
            .filter(|a| a.activity_id == Some(activity_id))
            .cloned()
            .collect())
    }

    async fn list_general_attendance(
        &self,
        date: Option<NaiveDate>,
    ) -> CongressResult<Vec<Attendance>> {
        let tables = self.tables.read().await;
        Ok(tables
            .attendance
            .iter()
            .filter(|a| a.is_general() && date.map_or(true, |d| a.session_date == d))
            .cloned()
            .collect())
    }

    async fn create_payment(&self, payment: NewPayment) -> CongressResult<Payment> {
        let mut tables = self.tables.write().await;
        tables.user(payment.user_id)?;

        let open = tables.payments.values().any(|p| {
            p.user_id == payment.user_id
                && p.activity_id == payment.activity_id
                && p.status.is_open()
        });
        if open {
            return Err(CongressError::conflict(conflicts::PAYMENT_OPEN));
        }

        let record = Payment {
            id: Uuid::new_v4(),
            user_id: payment.user_id,
            activity_id: payment.activity_id,
            amount_cents: payment.amount_cents,
            method: payment.method,
            reference: payment.reference,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
        };
        tables.payments.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_payment(&self, id: Uuid) -> CongressResult<Payment> {
        self.tables
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| CongressError::not_found("Payment"))
    }

    async fn review_payment(
        &self,
        id: Uuid,
        status: PaymentStatus,
        reviewer: Uuid,
    ) -> CongressResult<Payment> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        let payment = tables
            .payments
            .get_mut(&id)
            .ok_or_else(|| CongressError::not_found("Payment"))?;
        if payment.status != PaymentStatus::Pending {
            return Err(CongressError::conflict(conflicts::PAYMENT_REVIEWED));
        }
        payment.status = status;
        payment.reviewed_by = Some(reviewer);
        payment.reviewed_at = Some(now);
        let payment = payment.clone();

        if let (PaymentStatus::Completed, Some(activity_id)) = (status, payment.activity_id) {
            if let Some(enrollment) = tables.enrollments.values_mut().find(|e| {
                e.user_id == payment.user_id
                    && e.activity_id == activity_id
                    && e.status == EnrollmentStatus::PendingPayment
            }) {
                enrollment.status = EnrollmentStatus::Confirmed;
                enrollment.updated_at = now;
            }
        }

        Ok(payment)
    }

    async fn list_payments(
        &self,
        user_id: Option<Uuid>,
        status: Option<PaymentStatus>,
    ) -> CongressResult<Vec<Payment>> {
        let tables = self.tables.read().await;
        let items = tables
            .payments
            .values()
            .filter(|p| user_id.map_or(true, |id| p.user_id == id))
            .filter(|p| status.map_or(true, |s| p.status == s))
            .cloned()
            .collect();
        Ok(sorted_by(items, |p: &Payment| p.created_at))
    }

    async fn has_completed_payment(
        &self,
        user_id: Uuid,
        activity_id: Option<Uuid>,
    ) -> CongressResult<bool> {
        let tables = self.tables.read().await;
        Ok(tables.payments.values().any(|p| {
            p.user_id == user_id
                && p.activity_id == activity_id
                && p.status == PaymentStatus::Completed
        }))
    }

    async fn create_diploma(&self, diploma: NewDiploma) -> CongressResult<Diploma> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.diplomas.iter().any(|d| {
            d.verification_code == diploma.verification_code
                || (d.activity_id == diploma.activity_id
                    && d.kind == diploma.kind
                    && (d.user_id == diploma.user_id
                        || matches!(d.kind, DiplomaKind::Placement { .. })))
        });
        if duplicate {
            return Err(CongressError::conflict(conflicts::DIPLOMA_ISSUED));
        }

        let record = Diploma {
            id: Uuid::new_v4(),
            user_id: diploma.user_id,
            activity_id: diploma.activity_id,
            kind: diploma.kind,
            verification_code: diploma.verification_code,
            issued_at: Utc::now(),
        };
        tables.diplomas.push(record.clone());
        Ok(record)
    }

    async fn list_user_diplomas(&self, user_id: Uuid) -> CongressResult<Vec<Diploma>> {
        let tables = self.tables.read().await;
        Ok(tables
            .diplomas
            .iter()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_activity_diplomas(&self, activity_id: Uuid) -> CongressResult<Vec<Diploma>> {
        let tables = self.tables.read().await;
        Ok(tables
            .diplomas
            .iter()
            .filter(|d| d.activity_id == activity_id)
            .cloned()
            .collect())
    }

    async fn find_diploma_by_code(&self, code: &str) -> CongressResult<Option<Diploma>> {
        let tables = self.tables.read().await;
        Ok(tables
            .diplomas
            .iter()
            .find(|d| d.verification_code == code)
            .cloned())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> CongressResult<AuditEntry> {
        let record = AuditEntry {
            id: Uuid::new_v4(),
            actor_id: entry.actor_id,
            action: entry.action,
            entity: entry.entity,
            entity_id: entry.entity_id,
            details: entry.details,
            created_at: Utc::now(),
        };
        self.tables.write().await.audit.push(record.clone());
        Ok(record)
    }

    async fn list_audit(
        &self,
        entity: Option<&str>,
        limit: u32,
    ) -> CongressResult<Vec<AuditEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit
            .iter()
            .rev()
            .filter(|e| entity.map_or(true, |name| e.entity == name))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn congress_summary(&self) -> CongressResult<CongressSummary> {
        let tables = self.tables.read().await;

        let mut general: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for record in tables.attendance.iter().filter(|a| a.is_general()) {
            *general.entry(record.session_date).or_default() += 1;
        }

        let mut payments_by_status: BTreeMap<String, i64> = BTreeMap::new();
        for payment in tables.payments.values() {
            *payments_by_status
                .entry(payment.status.as_str().to_string())
                .or_default() += 1;
        }

        Ok(CongressSummary {
            total_users: tables.users.len() as i64,
            active_users: tables.users.values().filter(|u| u.is_active).count() as i64,
            total_activities: tables.activities.len() as i64,
            active_activities: tables.activities.values().filter(|a| a.is_active).count()
                as i64,
            confirmed_enrollments: tables
                .enrollments
                .values()
                .filter(|e| e.status == EnrollmentStatus::Confirmed)
                .count() as i64,
            general_attendance: general
                .into_iter()
                .map(|(session_date, count)| DailyAttendance {
                    session_date,
                    count,
                })
                .collect(),
            activity_attendance_total: tables
                .attendance
                .iter()
                .filter(|a| !a.is_general())
                .count() as i64,
            revenue_cents: tables
                .payments
                .values()
                .filter(|p| p.status == PaymentStatus::Completed)
                .map(|p| p.amount_cents)
                .sum(),
            payments_by_status,
            diplomas_issued: tables.diplomas.len() as i64,
        })
    }

    async fn activity_report(&self, activity_id: Uuid) -> CongressResult<ActivityReport> {
        let tables = self.tables.read().await;
        let activity = tables
            .activities
            .get(&activity_id)
            .ok_or_else(|| CongressError::not_found("Activity"))?;

        let count_status = |status: EnrollmentStatus| {
            tables
                .enrollments
                .values()
                .filter(|e| e.activity_id == activity_id && e.status == status)
                .count() as i64
        };

        Ok(ActivityReport {
            activity_id,
            title: activity.title.clone(),
            pending_payment: count_status(EnrollmentStatus::PendingPayment),
            confirmed: count_status(EnrollmentStatus::Confirmed),
            cancelled: count_status(EnrollmentStatus::Cancelled),
            attended: tables
                .attendance
                .iter()
                .filter(|a| a.activity_id == Some(activity_id))
                .count() as i64,
            attendance_rate: 0.0,
            diplomas_issued: tables
                .diplomas
                .iter()
                .filter(|d| d.activity_id == activity_id)
                .count() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_user(email: &str, qr: &str) -> NewUser {
        NewUser {
            full_name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            institution: None,
            phone: None,
            qr_code: qr.to_string(),
            roles: vec![],
        }
    }

    fn activity(capacity: Option<i32>) -> Activity {
        let now = Utc::now();
        Activity {
            id: Uuid::new_v4(),
            title: "Workshop".to_string(),
            description: String::new(),
            kind: ActivityKind::Workshop,
            speaker: None,
            location: None,
            starts_at: now,
            ends_at: now + Duration::hours(1),
            capacity,
            price_cents: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_email_unique_case_insensitive() {
        let storage = MemoryStorageBackend::new();
        let user = storage
            .create_user(new_user("Ada@Example.com", "AAAA"))
            .await
            .unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.roles, vec![Role::Participant]);

        let err = storage
            .create_user(new_user("ada@example.COM", "BBBB"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_capacity_enforced() {
        let storage = MemoryStorageBackend::new();
        let a = storage.create_user(new_user("a@x.io", "A1")).await.unwrap();
        let b = storage.create_user(new_user("b@x.io", "B1")).await.unwrap();
        let workshop = storage.create_activity(&activity(Some(1))).await.unwrap();

        storage
            .create_enrollment(a.id, workshop.id, EnrollmentStatus::Confirmed)
            .await
            .unwrap();
        let err = storage
            .create_enrollment(b.id, workshop.id, EnrollmentStatus::Confirmed)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), conflicts::ACTIVITY_FULL);
    }

    #[tokio::test]
    async fn test_general_attendance_once_per_day() {
        let storage = MemoryStorageBackend::new();
        let user = storage.create_user(new_user("a@x.io", "A1")).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let scan = |date| NewAttendance {
            user_id: user.id,
            activity_id: None,
            session_date: date,
            scanned_by: None,
        };

        storage.record_attendance(scan(day)).await.unwrap();
        let err = storage.record_attendance(scan(day)).await.unwrap_err();
        assert_eq!(err.to_string(), conflicts::ATTENDANCE_RECORDED);

        let next_day = day.succ_opt().unwrap();
        storage.record_attendance(scan(next_day)).await.unwrap();
        assert_eq!(storage.list_general_attendance(Some(day)).await.unwrap().len(), 1);
        assert_eq!(storage.list_general_attendance(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_completed_payment_confirms_enrollment() {
        let storage = MemoryStorageBackend::new();
        let user = storage.create_user(new_user("a@x.io", "A1")).await.unwrap();
        let mut paid = activity(None);
        paid.price_cents = 15_000;
        let paid = storage.create_activity(&paid).await.unwrap();

        let enrollment = storage
            .create_enrollment(user.id, paid.id, EnrollmentStatus::PendingPayment)
            .await
            .unwrap();
        let payment = storage
            .create_payment(NewPayment {
                user_id: user.id,
                activity_id: Some(paid.id),
                amount_cents: 15_000,
                method: PaymentMethod::Cash,
                reference: None,
            })
            .await
            .unwrap();

        storage
            .review_payment(payment.id, PaymentStatus::Completed, user.id)
            .await
            .unwrap();
        let confirmed = storage
            .find_open_enrollment(user.id, paid.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.id, enrollment.id);
        assert_eq!(confirmed.status, EnrollmentStatus::Confirmed);

        let err = storage
            .review_payment(payment.id, PaymentStatus::Rejected, user.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_audit_newest_first() {
        let storage = MemoryStorageBackend::new();
        for action in ["one", "two", "three"] {
            storage
                .append_audit(NewAuditEntry::new(action, "user"))
                .await
                .unwrap();
        }
        storage
            .append_audit(NewAuditEntry::new("other", "payment"))
            .await
            .unwrap();

        let entries = storage.list_audit(Some("user"), 2).await.unwrap();
        let actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["three", "two"]);
    }
}
