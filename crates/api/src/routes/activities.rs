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

/// Create activities router, including per-activity enrollment
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/activities", get(list_activities).post(create_activity))
        .route(
            "/activities/:id",
            get(get_activity)
                .put(update_activity)
                .delete(deactivate_activity),
        )
        .route("/activities/:id/enrollments", get(activity_enrollments))
        .route("/activities/:id/enroll", post(enroll).delete(cancel_enrollment))
        .route("/enrollments/me", get(my_enrollments))
}

/// List activities
pub async fn list_activities(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Query(params): Query<ActivityListParams>,
) -> ApiResult<Vec<ActivitySummary>> {
    let actor = user.as_ref().map(|CurrentUser(u)| u);
    let activities = state
        .activities
        .list(actor, params.include_inactive.unwrap_or(false))
        .await?;
    ok("Activities", activities)
}

/// Get activity
pub async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Activity> {
    ok("Activity", state.activities.get(id).await?)
}

/// Create activity
pub async fn create_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateActivityRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Activity>>), ApiError> {
    let activity = state.activities.create(&user, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Activity created", activity)),
    ))
}

/// Update activity
pub async fn update_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateActivityRequest>,
) -> ApiResult<Activity> {
    ok(
        "Activity updated",
        state.activities.update(&user, id, request).await?,
    )
}

/// Deactivate activity
pub async fn deactivate_activity(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Activity> {
    ok(
        "Activity deactivated",
        state.activities.deactivate(&user, id).await?,
    )
}

/// Enrollments of one activity
pub async fn activity_enrollments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<Enrollment>> {
    ok(
        "Enrollments",
        state.enrollments.activity_enrollments(&user, id).await?,
    )
}

/// Enroll the current user
pub async fn enroll(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<Enrollment>>), ApiError> {
    let enrollment = state.enrollments.enroll(&user, id).await?;
    let message = match enrollment.status {
        EnrollmentStatus::PendingPayment => "Enrollment pending payment",
        _ => "Enrollment confirmed",
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(message, enrollment)),
    ))
}

/// Cancel the current user's enrollment
pub async fn cancel_enrollment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Enrollment> {
    ok(
        "Enrollment cancelled",
        state.enrollments.cancel(&user, id).await?,
    )
}

/// Enrollments of the current user
pub async fn my_enrollments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Enrollment>> {
    ok("Enrollments", state.enrollments.my_enrollments(&user).await?)
}
