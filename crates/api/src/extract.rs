use crate::error::ApiError;
use crate::middleware::Claims;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use congress_models::{CongressError, User};
use uuid::Uuid;

/// The authenticated, active user behind the request's bearer token
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| CongressError::unauthorized("login required"))?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| CongressError::unauthorized("invalid token subject"))?;

        let user = match state.storage.get_user(user_id).await {
            Ok(user) => user,
            Err(CongressError::NotFound { .. }) => {
                return Err(CongressError::unauthorized("account no longer exists").into())
            }
            Err(e) => return Err(e.into()),
        };
        if !user.is_active {
            return Err(CongressError::forbidden("account is deactivated").into());
        }

        Ok(CurrentUser(user))
    }
}
