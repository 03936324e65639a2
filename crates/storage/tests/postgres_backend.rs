// Integration tests against a live PostgreSQL database.
// Run with: DATABASE_URL=postgresql://... cargo test -p congress-storage -- --ignored

use chrono::{Duration, NaiveDate, Utc};
use congress_models::*;
use congress_storage::{conflicts, PostgresStorageBackend, StorageBackend};
use uuid::Uuid;

async fn connect() -> PostgresStorageBackend {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for this test");
    PostgresStorageBackend::new(&database_url, 5)
        .await
        .expect("Failed to connect to PostgreSQL")
}

fn new_user(tag: &str) -> NewUser {
    let unique = Uuid::new_v4().simple().to_string();
    NewUser {
        full_name: format!("Test {}", tag),
        email: format!("{}-{}@congress.test", tag, unique),
        password_hash: "hash".to_string(),
        institution: None,
        phone: None,
        qr_code: unique[..16].to_uppercase(),
        roles: vec![Role::Participant],
    }
}

fn workshop(capacity: Option<i32>, price_cents: Cents) -> Activity {
    let now = Utc::now();
    Activity {
        id: Uuid::new_v4(),
        title: "Integration Workshop".to_string(),
        description: String::new(),
        kind: ActivityKind::Workshop,
        speaker: None,
        location: Some("Lab 3".to_string()),
        starts_at: now,
        ends_at: now + Duration::hours(2),
        capacity,
        price_cents,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_user_roundtrip_and_conflicts() {
    let storage = connect().await;
    storage.ping().await.unwrap();

    let new = new_user("roundtrip");
    let email = new.email.clone();
    let user = storage.create_user(new.clone()).await.unwrap();
    assert_eq!(user.roles, vec![Role::Participant]);

    let found = storage.find_user_by_email(&email).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);

    let mut duplicate = new_user("roundtrip");
    duplicate.email = email.to_uppercase();
    let err = storage.create_user(duplicate).await.unwrap_err();
    assert_eq!(err.status_code(), 409);

    let updated = storage
        .update_user_roles(user.id, &[Role::Participant, Role::Admin])
        .await
        .unwrap();
    assert!(updated.has_role(Role::Admin));

    let saved = storage
        .save_admin_permissions(user.id, &[Permission::ViewReports], None)
        .await
        .unwrap();
    assert!(saved.grants(Permission::ViewReports));
    assert!(!saved.grants(Permission::ManageUsers));
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_enrollment_capacity_and_payment_review() {
    let storage = connect().await;
    let a = storage.create_user(new_user("cap-a")).await.unwrap();
    let b = storage.create_user(new_user("cap-b")).await.unwrap();
    let activity = storage
        .create_activity(&workshop(Some(1), 2_500))
        .await
        .unwrap();

    let enrollment = storage
        .create_enrollment(a.id, activity.id, EnrollmentStatus::PendingPayment)
        .await
        .unwrap();
    let err = storage
        .create_enrollment(b.id, activity.id, EnrollmentStatus::PendingPayment)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), conflicts::ACTIVITY_FULL);

    let payment = storage
        .create_payment(NewPayment {
            user_id: a.id,
            activity_id: Some(activity.id),
            amount_cents: 2_500,
            method: PaymentMethod::Card,
            reference: None,
        })
        .await
        .unwrap();
    let reviewed = storage
        .review_payment(payment.id, PaymentStatus::Completed, a.id)
        .await
        .unwrap();
    assert_eq!(reviewed.status, PaymentStatus::Completed);

    let confirmed = storage
        .find_open_enrollment(a.id, activity.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmed.id, enrollment.id);
    assert_eq!(confirmed.status, EnrollmentStatus::Confirmed);

    let report = storage.activity_report(activity.id).await.unwrap();
    assert_eq!(report.confirmed, 1);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_attendance_and_diploma_uniqueness() {
    let storage = connect().await;
    let user = storage.create_user(new_user("attend")).await.unwrap();
    let activity = storage.create_activity(&workshop(None, 0)).await.unwrap();
    let day = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();

    let scan = NewAttendance {
        user_id: user.id,
        activity_id: None,
        session_date: day,
        scanned_by: None,
    };
    storage.record_attendance(scan.clone()).await.unwrap();
    let err = storage.record_attendance(scan).await.unwrap_err();
    assert_eq!(err.to_string(), conflicts::ATTENDANCE_RECORDED);

    let code = format!("DIP-{}", &Uuid::new_v4().simple().to_string()[..16].to_uppercase());
    let diploma = NewDiploma {
        user_id: user.id,
        activity_id: activity.id,
        kind: DiplomaKind::Participation,
        verification_code: code.clone(),
    };
    storage.create_diploma(diploma.clone()).await.unwrap();
    let err = storage.create_diploma(diploma).await.unwrap_err();
    assert_eq!(err.status_code(), 409);

    let found = storage.find_diploma_by_code(&code).await.unwrap().unwrap();
    assert_eq!(found.user_id, user.id);
}
