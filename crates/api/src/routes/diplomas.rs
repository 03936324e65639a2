use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use congress_models::*;
use uuid::Uuid;

use crate::error::{ok, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// Create diplomas router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/diplomas/activities/:id/generate", post(generate_diplomas))
        .route("/diplomas/activities/:id/placements", post(award_placements))
        .route("/diplomas/me", get(my_diplomas))
        .route("/diplomas/verify/:code", get(verify_diploma))
}

pub async fn generate_diplomas(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<GenerateDiplomasResponse> {
    let response = state.diplomas.generate_for_activity(&user, id).await?;
    ok("Diplomas generated", response)
}

pub async fn award_placements(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AwardPlacementsRequest>,
) -> ApiResult<GenerateDiplomasResponse> {
    let response = state
        .diplomas
        .award_placements(&user, id, &request.placements)
        .await?;
    ok("Placements awarded", response)
}

pub async fn my_diplomas(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Diploma>> {
    ok("Diplomas", state.diplomas.my_diplomas(&user).await?)
}

/// Public verification of a printed diploma
pub async fn verify_diploma(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<DiplomaVerification> {
    ok("Diploma is valid", state.diplomas.verify(&code).await?)
}
