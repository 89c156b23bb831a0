use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::{Action, Resource};
use crate::services::case_service::CaseService;
use crate::services::slot_service::SlotService;

use super::{optional_str, parse_uuid, required_str, RequestContext};

/// POST /api/cases/:case_id/slots - propose an interview window for a
/// case in the caller's tenant.
pub async fn create_slot(
    Extension(user): Extension<AuthUser>,
    Path(case_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let case_id = parse_uuid(&case_id, "case_id")?;
    let start_time = required_timestamp(&body, "start_time")?;
    let end_time = required_timestamp(&body, "end_time")?;
    let note = optional_str(&body, "note");

    let case = CaseService::new()
        .await?
        .find(case_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case not found"))?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Tenant(case.tenant_id), &Action::CreateSlot)?;

    let slot = SlotService::new()
        .await?
        .create(case.id, start_time, end_time, note)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "slot": slot }))))
}

/// PATCH /api/slots/:slot_id - reschedule a slot. Ownership is
/// re-resolved through slot -> case -> tenant on every call.
pub async fn update_slot(
    Extension(user): Extension<AuthUser>,
    Path(slot_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let slot_id = parse_uuid(&slot_id, "slot_id")?;
    let start_time = required_timestamp(&body, "start_time")?;
    let end_time = required_timestamp(&body, "end_time")?;
    let note = optional_str(&body, "note");

    let service = SlotService::new().await?;
    let (slot, tenant_id) = service
        .find_with_tenant(slot_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Slot not found"))?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Tenant(tenant_id), &Action::UpdateSlot)?;

    let updated = service.update(slot.id, start_time, end_time, note).await?;

    Ok(Json(json!({ "slot": updated })))
}

/// DELETE /api/slots/:slot_id - remove a slot and, by cascade, every
/// availability recorded against it.
pub async fn delete_slot(
    Extension(user): Extension<AuthUser>,
    Path(slot_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let slot_id = parse_uuid(&slot_id, "slot_id")?;

    let service = SlotService::new().await?;
    let (slot, tenant_id) = service
        .find_with_tenant(slot_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Slot not found"))?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Tenant(tenant_id), &Action::DeleteSlot)?;

    service.delete(slot.id).await?;

    Ok(Json(json!({ "ok": true })))
}

fn required_timestamp(body: &Value, field: &str) -> Result<DateTime<Utc>, ApiError> {
    let raw = required_str(body, field)?;
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::bad_request(format!("{} must be an RFC 3339 timestamp", field)))
}
