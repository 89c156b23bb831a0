mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

const LONG_ENOUGH_BODY: &str =
    "Hello, we would like to schedule a first interview with Jane Doe next week.";

#[tokio::test]
async fn webhook_rejects_missing_secret() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/webhooks/zapier", server.base_url))
        .json(&json!({ "email_text": LONG_ENOUGH_BODY }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test]
async fn webhook_rejects_wrong_secret() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/webhooks/zapier", server.base_url))
        .header("x-zapier-secret", "wrong-secret")
        .json(&json!({ "email_text": LONG_ENOUGH_BODY }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn webhook_rejects_short_email_text() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/webhooks/zapier", server.base_url))
        .header("x-zapier-secret", common::WEBHOOK_SECRET)
        .json(&json!({ "email_text": "too short" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn webhook_rejects_non_json_body() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/webhooks/zapier", server.base_url))
        .header("x-zapier-secret", common::WEBHOOK_SECRET)
        .body("this is not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn webhook_rejects_malformed_tenant_id() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/webhooks/zapier", server.base_url))
        .header("x-zapier-secret", common::WEBHOOK_SECRET)
        .json(&json!({ "email_text": LONG_ENOUGH_BODY, "tenant_id": "not-a-uuid" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
