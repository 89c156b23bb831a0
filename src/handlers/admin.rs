use axum::{
    extract::{Extension, Path},
    http::HeaderMap,
    response::Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::auth::{self, AuthUser};
use crate::policy::{Action, Resource, SuperAdminGate};
use crate::services::tenant_service::TenantService;

use super::{parse_uuid, required_bool, RequestContext};

/// GET /api/admin/check-super-admin - never errors; any failure along the
/// way reports false.
pub async fn check_super_admin(headers: HeaderMap) -> Json<Value> {
    let gate = SuperAdminGate::from_config();

    let is_super_admin = auth::resolve_optional(&headers)
        .map(|user| gate.is_super_admin(&user.email))
        .unwrap_or(false);

    Json(json!({ "isSuperAdmin": is_super_admin }))
}

/// GET /api/admin/tenants - all tenants with per-tenant stats.
/// Super-admin only.
pub async fn list_tenants(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Platform, &Action::ListTenants)?;

    let tenants = TenantService::new().await?.list_with_stats().await?;

    Ok(Json(json!({ "tenants": tenants })))
}

/// PATCH /api/admin/tenants/:tenant_id/toggle-active - super-admin only.
pub async fn toggle_tenant_active(
    Extension(user): Extension<AuthUser>,
    Path(tenant_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let tenant_id = parse_uuid(&tenant_id, "tenant_id")?;
    let is_active = required_bool(&body, "is_active")?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Platform, &Action::ToggleTenantActive)?;

    let tenant = TenantService::new()
        .await?
        .toggle_active(tenant_id, is_active)
        .await?;

    Ok(Json(json!({
        "message": "Tenant state updated",
        "is_active": tenant.is_active,
    })))
}
