use axum::{extract::Extension, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::SuperAdminGate;
use crate::services::identity_service::IdentityService;

use super::{required_str, RequestContext};

/// POST /api/auth/login - exchange credentials for a bearer token.
/// Disabled accounts and members of deactivated tenants are refused here
/// as well as on every later request.
pub async fn login(Json(body): Json<Value>) -> Result<Json<Value>, ApiError> {
    let email = required_str(&body, "email")?;
    let password = required_str(&body, "password")?;

    let identities = IdentityService::new().await?;
    let identity = identities
        .verify_credentials(email, password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let auth_user = AuthUser {
        id: identity.id,
        email: identity.email.clone(),
    };
    let ctx = RequestContext::load(auth_user).await?;

    if let Some(profile) = &ctx.profile {
        if !profile.is_active {
            return Err(ApiError::forbidden("Account is disabled"));
        }
        if profile.tenant_id.is_some() && !ctx.tenant_active {
            return Err(ApiError::forbidden("Tenant is deactivated"));
        }
    }

    let token = auth::generate_jwt(Claims::new(identity.id, identity.email.clone()))
        .map_err(|e| {
            tracing::error!("Failed to issue token: {}", e);
            ApiError::internal_server_error("Failed to issue token")
        })?;

    let force_password_reset = ctx
        .profile
        .as_ref()
        .map(|p| p.force_password_reset)
        .unwrap_or(false);

    Ok(Json(json!({
        "token": token,
        "user": { "id": identity.id, "email": identity.email },
        "profile": ctx.profile,
        "force_password_reset": force_password_reset,
    })))
}

/// GET /api/auth/whoami - the caller's identity, profile and gate status.
pub async fn whoami(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let ctx = RequestContext::load(user).await?;
    let gate = SuperAdminGate::from_config();
    let is_super_admin = gate.is_super_admin(&ctx.identity.email);

    Ok(Json(json!({
        "user": { "id": ctx.identity.id, "email": ctx.identity.email },
        "profile": ctx.profile,
        "is_super_admin": is_super_admin,
    })))
}

/// POST /api/auth/reset-password - set a new password and clear the
/// forced-reset flag.
pub async fn reset_password(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let new_password = required_str(&body, "new_password")?;

    if new_password.len() < 8 {
        return Err(ApiError::bad_request(
            "new_password must be at least 8 characters",
        ));
    }

    let ctx = RequestContext::load(user).await?;
    if let Some(profile) = &ctx.profile {
        if !profile.is_active {
            return Err(ApiError::forbidden("Account is disabled"));
        }
    }

    let identities = IdentityService::new().await?;
    identities
        .update_password(ctx.identity.id, new_password)
        .await?;

    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}
