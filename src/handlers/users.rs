use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::{Action, DenyReason, Resource};
use crate::services::user_service::UserService;

use super::{optional_str, parse_uuid, required_bool, required_str, RequestContext};

/// GET /api/users - profiles of the caller's tenant. Admin only.
pub async fn list_users(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::OwnTenant, &Action::ListUsers)?;
    let tenant_id = ctx.require_tenant_id()?;

    let users = UserService::new().await?.list(tenant_id).await?;

    Ok(Json(json!({ "users": users })))
}

/// POST /api/users/create - provision a staff account in the caller's
/// tenant. Admin only; the one-time password is shown exactly once.
pub async fn create_user(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email = required_str(&body, "email")?;
    let role = optional_str(&body, "role").unwrap_or("member");

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::OwnTenant, &Action::CreateUser)?;
    let tenant_id = ctx.require_tenant_id()?;

    // A caller-supplied tenant_id may only name the caller's own tenant;
    // provisioning into a foreign tenant is a cross-tenant write.
    if let Some(requested) = optional_str(&body, "tenant_id") {
        let requested = parse_uuid(requested, "tenant_id")?;
        if requested != tenant_id {
            return Err(ApiError::forbidden(DenyReason::CrossTenant.message()));
        }
    }

    let (created, password) = UserService::new()
        .await?
        .create_user(tenant_id, email, role)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": {
                "id": created.id,
                "email": created.email,
                "role": created.role,
            },
            "password": password,
        })),
    ))
}

/// PATCH /api/users/:user_id/toggle-active - admin only, never on the
/// caller's own profile.
pub async fn toggle_user_active(
    Extension(user): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let user_id = parse_uuid(&user_id, "user_id")?;
    let is_active = required_bool(&body, "is_active")?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(
        Resource::OwnTenant,
        &Action::ToggleUserActive { target: user_id },
    )?;
    let tenant_id = ctx.require_tenant_id()?;

    let profile = UserService::new()
        .await?
        .toggle_active(tenant_id, user_id, is_active)
        .await?;

    Ok(Json(json!({ "profile": profile })))
}
