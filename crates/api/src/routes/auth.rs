use axum::{extract::State, http::StatusCode, response::Json, routing::{get, post}, Router};
use congress_models::{ApiResponse, LoginRequest, LoginResponse, RegisterRequest, UserProfile};
use serde::Serialize;

use crate::error::{ok, ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// Create auth router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}

/// Profile of the logged in user plus what they may do
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub qr_payload: String,
    pub permissions: Vec<congress_models::Permission>,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserProfile>>), ApiError> {
    let profile = state.auth.register(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Registration complete", profile)),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let response = state.auth.login(request).await?;
    ok("Login successful", response)
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<MeResponse> {
    let permissions = state.permissions.effective(&user).await?;
    ok(
        "Current user",
        MeResponse {
            qr_payload: congress_crypto::encode_qr_payload(&user.qr_code),
            profile: user.profile(),
            permissions,
        },
    )
}
