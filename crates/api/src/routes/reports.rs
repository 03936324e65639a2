use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use congress_models::{ActivityReport, CongressSummary};
use uuid::Uuid;

use crate::error::{ok, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// Create reports router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/activities/:id", get(activity_report))
}

pub async fn summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<CongressSummary> {
    ok("Congress summary", state.reports.summary(&user).await?)
}

pub async fn activity_report(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ActivityReport> {
    ok(
        "Activity report",
        state.reports.activity_report(&user, id).await?,
    )
}
