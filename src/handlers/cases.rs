use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::intake::{self, ParsedEmail};
use crate::middleware::auth::AuthUser;
use crate::policy::{self, Action, Resource};
use crate::services::case_service::CaseService;

use super::{optional_str, parse_uuid, required_str, RequestContext};

const MIN_EMAIL_TEXT_LEN: usize = 20;

/// POST /api/create-case-from-email - parse pasted email text into a case
/// owned by the caller's tenant.
pub async fn create_case_from_email(
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let email_text = required_str(&body, "email_text")?;

    if email_text.len() < MIN_EMAIL_TEXT_LEN {
        return Err(ApiError::bad_request(
            "Email text is too short; paste the full message body",
        ));
    }

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::OwnTenant, &Action::CreateCase)?;
    let tenant_id = ctx.require_tenant_id()?;
    let profile = ctx.require_profile()?;

    let parsed = intake::extract_or_default(intake::default_parser(), email_text).await;
    let seed = intake::merge(&ParsedEmail::default(), &parsed);

    let case = CaseService::new()
        .await?
        .create_case(Some(tenant_id), Some(profile.id), seed, Some(email_text))
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "case": case }))))
}

/// GET /api/cases - cases visible to the caller: the whole tenant for
/// admins, own cases for members.
pub async fn list_cases(Extension(user): Extension<AuthUser>) -> Result<Json<Value>, ApiError> {
    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::OwnTenant, &Action::ListCases)?;

    let visibility = ctx
        .policy_profile()
        .as_ref()
        .and_then(policy::case_visibility)
        .ok_or_else(|| ApiError::forbidden("No tenant membership for this account"))?;

    let cases = CaseService::new().await?.list(visibility).await?;

    Ok(Json(json!({ "cases": cases })))
}

/// GET /api/cases/:case_id - case detail with slots and recorded
/// availabilities. Ownership is checked against the stored row's tenant.
pub async fn get_case(
    Extension(user): Extension<AuthUser>,
    Path(case_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let case_id = parse_uuid(&case_id, "case_id")?;

    let service = CaseService::new().await?;
    let case = service
        .find(case_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case not found"))?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(
        Resource::Tenant(case.tenant_id),
        &Action::ReadCase {
            created_by: case.created_by,
        },
    )?;

    let slots = service.slots_with_availabilities(case.id).await?;

    Ok(Json(json!({ "case": case, "slots": slots })))
}

/// PATCH /api/cases/:case_id/status - staff status/stage update. The
/// case's tenant is fetched fresh, never trusted from the client.
pub async fn update_case_status(
    Extension(user): Extension<AuthUser>,
    Path(case_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let case_id = parse_uuid(&case_id, "case_id")?;
    let status = required_str(&body, "status")?;
    let stage = optional_str(&body, "stage");

    let service = CaseService::new().await?;
    let case = service
        .find(case_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Case not found"))?;

    let ctx = RequestContext::load(user).await?;
    ctx.authorize(Resource::Tenant(case.tenant_id), &Action::UpdateCase)?;

    let updated = service.update_status(case.id, status, stage).await?;

    Ok(Json(json!({
        "case": {
            "id": updated.id,
            "title": updated.title,
            "status": updated.status,
            "stage": updated.stage,
        }
    })))
}
