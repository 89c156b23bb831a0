use axum::{http::HeaderMap, http::StatusCode, response::Json};
use serde_json::{json, Value};
use subtle::ConstantTimeEq;

use crate::config;
use crate::error::ApiError;
use crate::intake::{self, ParsedEmail};
use crate::services::case_service::CaseService;
use crate::services::tenant_service::TenantService;

use super::{optional_str, parse_uuid};

const MIN_EMAIL_TEXT_LEN: usize = 20;

/// POST /api/webhooks/zapier - signed inbound-email bridge. The shared
/// secret is checked before the body is even parsed; an unconfigured
/// secret is a server misconfiguration, never a bypass.
pub async fn zapier(
    headers: HeaderMap,
    body: String,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let secret = config::config()
        .webhook
        .zapier_secret
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("Webhook secret is not configured"))?;

    let provided = headers
        .get("x-zapier-secret")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

    if !bool::from(provided.as_bytes().ct_eq(secret.as_bytes())) {
        return Err(ApiError::unauthorized("Unauthorized"));
    }

    let body: Value = serde_json::from_str(&body)
        .map_err(|_| ApiError::bad_request("A JSON body is required"))?;

    let email_text = optional_str(&body, "email_text")
        .or_else(|| optional_str(&body, "body"))
        .unwrap_or("");

    if email_text.len() < MIN_EMAIL_TEXT_LEN {
        return Err(ApiError::bad_request(
            "Send enough text including the email body (email_text)",
        ));
    }

    // An explicit tenant_id is accepted on this path only, and only after
    // verifying the tenant actually exists.
    let tenant_id = match optional_str(&body, "tenant_id") {
        Some(raw) => {
            let id = parse_uuid(raw, "tenant_id")?;
            if !TenantService::new().await?.exists(id).await? {
                return Err(ApiError::bad_request("Specified tenant was not found"));
            }
            Some(id)
        }
        None => None,
    };

    let parsed = intake::extract_or_default(intake::default_parser(), email_text).await;
    let overrides = ParsedEmail {
        title: optional_str(&body, "title").map(String::from),
        candidate_name: optional_str(&body, "candidate_name").map(String::from),
        stage: optional_str(&body, "stage").map(String::from),
        status: optional_str(&body, "status").map(String::from),
    };
    let seed = intake::merge(&overrides, &parsed);

    let case = CaseService::new()
        .await?
        .create_case(tenant_id, None, seed, Some(email_text))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "case": case, "source": "zapier_webhook" })),
    ))
}
