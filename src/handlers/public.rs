use axum::{extract::Path, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::services::case_service::CaseService;

/// GET /api/public/cases/:public_id - the unauthenticated candidate view.
/// Looked up by the opaque public token only; no tenant data is exposed.
pub async fn candidate_case(Path(public_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let service = CaseService::new().await?;

    let case = service
        .find_by_public_id(&public_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case not found"))?;

    let slots: Vec<Value> = service
        .slots(case.id)
        .await?
        .into_iter()
        .map(|slot| {
            json!({
                "id": slot.id,
                "start_time": slot.start_time,
                "end_time": slot.end_time,
                "note": slot.note,
            })
        })
        .collect();

    Ok(Json(json!({
        "case": {
            "id": case.id,
            "title": case.title,
            "candidate_name": case.candidate_name,
            "stage": case.stage,
            "status": case.status,
        },
        "slots": slots,
    })))
}
