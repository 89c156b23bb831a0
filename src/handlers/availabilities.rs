use axum::{http::StatusCode, response::Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::availability_service::AvailabilityService;

use super::{optional_str, parse_uuid, required_str};

/// POST /api/candidate-availabilities - public candidate submission: one
/// availability row per selected slot. Duplicate (slot, email) pairs are
/// reported as "already responded", not silently duplicated.
pub async fn submit(Json(body): Json<Value>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let case_id = parse_uuid(required_str(&body, "case_id")?, "case_id")?;

    let slot_ids = body
        .get("slot_ids")
        .and_then(Value::as_array)
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| ApiError::bad_request("slot_ids must be a non-empty array"))?;

    let slot_ids = slot_ids
        .iter()
        .map(|id| {
            id.as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| ApiError::bad_request("slot_ids must contain UUIDs"))
        })
        .collect::<Result<Vec<Uuid>, ApiError>>()?;

    let candidate_name = optional_str(&body, "candidate_name");
    let email = optional_str(&body, "email");

    let recorded = AvailabilityService::new()
        .await?
        .submit(case_id, &slot_ids, candidate_name, email)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "slot_ids": recorded }))))
}
