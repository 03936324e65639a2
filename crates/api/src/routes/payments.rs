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

/// Create payments router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_payment))
        .route("/payments/me", get(my_payments))
        .route("/admin/payments", get(list_payments))
        .route("/admin/payments/:id/confirm", post(confirm_payment))
        .route("/admin/payments/:id/reject", post(reject_payment))
}

pub async fn create_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Payment>>), ApiError> {
    let payment = state.payments.create(&user, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Payment registered, pending review", payment)),
    ))
}

pub async fn my_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Vec<Payment>> {
    ok("Payments", state.payments.my_payments(&user).await?)
}

pub async fn list_payments(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PaymentListParams>,
) -> ApiResult<Vec<Payment>> {
    ok("Payments", state.payments.list(&user, params.status).await?)
}

pub async fn confirm_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Payment> {
    ok("Payment confirmed", state.payments.confirm(&user, id).await?)
}

pub async fn reject_payment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Payment> {
    ok("Payment rejected", state.payments.reject(&user, id).await?)
}
