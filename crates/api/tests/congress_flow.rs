mod common;

use axum::http::{Method, StatusCode};
use common::*;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoints() {
    let app = spawn_app().await;

    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/health/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_ready"], true);
}

#[tokio::test]
async fn test_register_and_login() {
    let app = spawn_app().await;
    let (_, token) = app.register("Ana Torres", "Ana@Example.com").await;

    let (status, body) = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "ana@example.com");
    assert_eq!(body["data"]["roles"], json!(["participant"]));
    assert!(body["data"]["qr_payload"].as_str().unwrap().starts_with("CONGRESS:"));

    let welcome = app.outbox.sent().await;
    assert!(welcome.iter().any(|n| n.to == "ana@example.com"));

    // Same email in another case is taken
    let (status, _) = app
        .post(
            "/api/auth/register",
            None,
            json!({ "full_name": "Ana 2", "email": "ANA@example.com", "password": PASSWORD }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_routes_require_login() {
    let app = spawn_app().await;

    let (status, _) = app.get("/api/auth/me", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.get("/api/auth/me", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Public catalog
    let (status, _) = app.get("/api/activities", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_paid_workshop_flow() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let activity = app
        .create_activity(&admin, "Rust for Embedded", "workshop", Some(30), 5_000)
        .await;
    let (_, token) = app.register("Luis Perez", "luis@example.com").await;

    // Paid activity starts pending
    let (status, body) = app
        .post(&format!("/api/activities/{}/enroll", activity), Some(&token), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "pending_payment");

    let (status, body) = app
        .post(
            "/api/payments",
            Some(&token),
            json!({ "activity_id": activity, "method": "transfer", "reference": "TX-881" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["amount_cents"], 5_000);
    assert_eq!(body["data"]["status"], "pending");
    let payment = body["data"]["id"].as_str().unwrap().to_string();

    // Only one open payment per purpose
    let (status, _) = app
        .post(
            "/api/payments",
            Some(&token),
            json!({ "activity_id": activity, "method": "cash" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(
            &format!("/api/admin/payments/{}/confirm", payment),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let (_, body) = app.get("/api/enrollments/me", Some(&token)).await;
    assert_eq!(body["data"][0]["status"], "confirmed");

    // Reviewing twice is rejected
    let (status, _) = app
        .post(
            &format!("/api/admin/payments/{}/reject", payment),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Entrance and activity scans
    let qr = app.qr_payload(&token).await;
    let (status, body) = app
        .post("/api/attendance/general", Some(&admin), json!({ "qr_code": qr }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["attendee"]["full_name"], "Luis Perez");

    let (status, _) = app
        .post("/api/attendance/general", Some(&admin), json!({ "qr_code": qr }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .post(
            &format!("/api/attendance/activities/{}", activity),
            Some(&admin),
            json!({ "qr_code": qr.to_lowercase() }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.get("/api/attendance/me", Some(&token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // Diplomas, idempotent
    let uri = format!("/api/diplomas/activities/{}/generate", activity);
    let (status, body) = app.post(&uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["issued"], 1);
    let code = body["data"]["diplomas"][0]["verification_code"]
        .as_str()
        .unwrap()
        .to_string();

    let (_, body) = app.post(&uri, Some(&admin), json!({})).await;
    assert_eq!(body["data"]["issued"], 0);
    assert_eq!(body["data"]["skipped"], 1);

    let (status, body) = app
        .get(&format!("/api/diplomas/verify/{}", code), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["holder_name"], "Luis Perez");
    assert_eq!(body["data"]["activity_title"], "Rust for Embedded");

    let (status, _) = app.get("/api/diplomas/verify/DOES-NOT-EXIST", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app
        .get(&format!("/api/reports/activities/{}", activity), Some(&admin))
        .await;
    assert_eq!(body["data"]["confirmed"], 1);
    assert_eq!(body["data"]["attended"], 1);
    assert_eq!(body["data"]["diplomas_issued"], 1);
}

#[tokio::test]
async fn test_activity_scan_needs_confirmed_enrollment() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let activity = app
        .create_activity(&admin, "Keynote", "conference", None, 0)
        .await;
    let (_, token) = app.register("Marta Gil", "marta@example.com").await;
    let qr = app.qr_payload(&token).await;

    let uri = format!("/api/attendance/activities/{}", activity);
    let (status, _) = app.post(&uri, Some(&admin), json!({ "qr_code": qr })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Free activities confirm immediately
    let (_, body) = app
        .post(&format!("/api/activities/{}/enroll", activity), Some(&token), json!({}))
        .await;
    assert_eq!(body["data"]["status"], "confirmed");

    let (status, _) = app.post(&uri, Some(&admin), json!({ "qr_code": qr })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(&uri, Some(&admin), json!({ "qr_code": "garbage!!" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_capacity_is_enforced() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let activity = app
        .create_activity(&admin, "Small Lab", "workshop", Some(1), 0)
        .await;
    let (_, first) = app.register("First", "first@example.com").await;
    let (_, second) = app.register("Second", "second@example.com").await;

    let uri = format!("/api/activities/{}/enroll", activity);
    let (status, _) = app.post(&uri, Some(&first), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.post(&uri, Some(&first), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.post(&uri, Some(&second), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Cancelling frees the seat
    let (status, _) = app.request(Method::DELETE, &uri, Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.post(&uri, Some(&second), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_competition_placements() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let activity = app
        .create_activity(&admin, "Hackathon", "competition", None, 0)
        .await;
    let (winner, token) = app.register("Winner", "winner@example.com").await;
    let (other, _) = app.register("Bystander", "bystander@example.com").await;

    app.post(&format!("/api/activities/{}/enroll", activity), Some(&token), json!({}))
        .await;
    let qr = app.qr_payload(&token).await;
    app.post(
        &format!("/api/attendance/activities/{}", activity),
        Some(&admin),
        json!({ "qr_code": qr }),
    )
    .await;

    let uri = format!("/api/diplomas/activities/{}/placements", activity);
    let (status, _) = app
        .post(
            &uri,
            Some(&admin),
            json!({ "placements": [{ "user_id": other, "place": 2 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .post(
            &uri,
            Some(&admin),
            json!({ "placements": [{ "user_id": winner, "place": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["issued"], 1);
    assert_eq!(body["data"]["diplomas"][0]["kind"]["place"], 1);

    let (_, body) = app.get("/api/diplomas/me", Some(&token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_entrance_scans_record_once() {
    let app = Arc::new(spawn_app().await);
    let admin = app.admin_token().await;
    let (_, token) = app.register("Racer", "racer@example.com").await;
    let qr = app.qr_payload(&token).await;

    let scans: Vec<_> = (0..2)
        .map(|_| {
            let app = app.clone();
            let admin = admin.clone();
            let qr = qr.clone();
            tokio::spawn(async move {
                app.post("/api/attendance/general", Some(&admin), json!({ "qr_code": qr }))
                    .await
                    .0
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for scan in scans {
        statuses.push(scan.await.unwrap());
    }
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::CONFLICT]);

    let (_, body) = app.get("/api/attendance/me", Some(&token)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_entrance_scan_rejects_bad_payloads() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for payload in ["CONGRESS:", "CONGRESS:ABC!", "   "] {
        let (status, body) = app
            .post("/api/attendance/general", Some(&admin), json!({ "qr_code": payload }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{:?}", payload);
        assert_eq!(body["success"], false);
    }

    // Well formed but unknown
    let (status, _) = app
        .post(
            "/api/attendance/general",
            Some(&admin),
            json!({ "qr_code": "CONGRESS:ABCDEFGHJKLMNPQR" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deactivated_attendee_cannot_check_in() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (id, token) = app.register("Former Guest", "former@example.com").await;
    let qr = app.qr_payload(&token).await;

    let (status, _) = app
        .request(
            Method::DELETE,
            &format!("/api/admin/users/{}", id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/attendance/general", Some(&admin), json!({ "qr_code": qr }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

