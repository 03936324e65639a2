use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use congress_models::{ApiResponse, CongressError};

/// Handler error, rendered as the standard JSON envelope
#[derive(Debug)]
pub struct ApiError(pub CongressError);

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

impl From<CongressError> for ApiError {
    fn from(err: CongressError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_internal() {
            tracing::error!(category = self.0.category(), error = %self.0, "request failed");
            "Internal server error".to_string()
        } else {
            tracing::debug!(category = self.0.category(), error = %self.0, "request rejected");
            self.0.to_string()
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

/// Wrap a payload in a successful envelope
pub fn ok<T>(message: &str, data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(message, data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_detail_hidden() {
        let response = ApiError(CongressError::database("connection reset")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_conflict_status() {
        let response = ApiError(CongressError::conflict("activity is full")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
