use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use congress_models::*;
use uuid::Uuid;

use crate::error::{ok, ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// Create attendance router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/attendance/general",
            post(check_in_general).get(general_attendance),
        )
        .route(
            "/attendance/activities/:id",
            post(check_in_activity).get(activity_attendance),
        )
        .route("/attendance/me", get(my_attendance))
}

/// Entrance scan
pub async fn check_in_general(
    State(state): State<AppState>,
    CurrentUser(scanner): CurrentUser,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckInResponse>>), ApiError> {
    let response = state
        .attendance
        .check_in_general(&scanner, &request.qr_code)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Attendance recorded", response)),
    ))
}

/// Activity scan
pub async fn check_in_activity(
    State(state): State<AppState>,
    CurrentUser(scanner): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckInRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckInResponse>>), ApiError> {
    let response = state
        .attendance
        .check_in_activity(&scanner, id, &request.qr_code)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Attendance recorded", response)),
    ))
}

pub async fn general_attendance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<GeneralAttendanceParams>,
) -> ApiResult<Vec<Attendance>> {
    ok(
        "General attendance",
        state.attendance.general_attendance(&user, params.date).await?,
    )
}

pub async fn activity_attendance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Attendance>> {
    ok(
        "Activity attendance",
        state.attendance.activity_attendance(&user, id).await?,
    )
}

pub async fn my_attendance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Attendance>> {
    ok("Attendance", state.attendance.my_attendance(&user).await?)
}
