use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, put},
    Router,
};
use congress_models::*;
use uuid::Uuid;

use crate::error::{ok, ApiResult};
use crate::extract::CurrentUser;
use crate::state::AppState;

/// Create admin router (users, permissions, audit log)
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id", get(get_user).delete(deactivate_user))
        .route("/admin/users/:id/roles", put(update_roles))
        .route(
            "/admin/users/:id/permissions",
            get(get_permissions).put(update_permissions),
        )
        .route("/admin/audit", get(list_audit))
}

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(filter): Query<UserFilter>,
) -> ApiResult<Vec<UserProfile>> {
    ok("Users", state.users.list_users(&user, &filter).await?)
}

pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<UserProfile> {
    ok("User", state.users.get_user(&user, id).await?)
}

pub async fn update_roles(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRolesRequest>,
) -> ApiResult<UserProfile> {
    ok(
        "Roles updated",
        state.users.set_roles(&user, id, &request.roles).await?,
    )
}

pub async fn deactivate_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<UserProfile> {
    ok("User deactivated", state.users.deactivate(&user, id).await?)
}

pub async fn get_permissions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<AdminPermissions> {
    ok(
        "Permissions",
        state.permissions.get_permissions(&user, id).await?,
    )
}

pub async fn update_permissions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePermissionsRequest>,
) -> ApiResult<AdminPermissions> {
    ok(
        "Permissions updated",
        state
            .permissions
            .set_permissions(&user, id, &request.permissions)
            .await?,
    )
}

pub async fn list_audit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<AuditListParams>,
) -> ApiResult<Vec<AuditEntry>> {
    state
        .permissions
        .require(&user, Permission::ViewAuditLog)
        .await?;
    ok("Audit log", state.audit.list(&params).await?)
}
