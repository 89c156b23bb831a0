use axum::{extract::Extension, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::auth;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::{Action, Resource};
use crate::services::tenant_service::TenantService;

use super::{optional_str, required_str, RequestContext};

/// POST /api/tenants/create - provision a tenant with its first admin
/// account. The password is included in the response exactly once and is
/// never retrievable again.
pub async fn create_tenant(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let tenant_name = required_str(&body, "tenant_name")?;
    let admin_email = required_str(&body, "admin_email")?;

    if !admin_email.contains('@') {
        return Err(ApiError::bad_request("admin_email must be an email address"));
    }

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Platform, &Action::CreateTenant)?;

    let password = match optional_str(&body, "admin_password") {
        Some(provided) if provided.len() >= 8 => provided.to_string(),
        _ => auth::generate_temporary_password(12),
    };

    let provisioned = TenantService::new()
        .await?
        .create_tenant(tenant_name, admin_email, &password)
        .await?;

    // Reusing an existing identity leaves its password untouched
    let password = provisioned.password_applied.then_some(password);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "tenant": {
                "id": provisioned.tenant.id,
                "name": provisioned.tenant.name,
            },
            "admin": {
                "id": provisioned.admin.id,
                "email": provisioned.admin_email,
                "role": provisioned.admin.role,
            },
            "password": password,
            "message": "Tenant and admin account created",
        })),
    ))
}
