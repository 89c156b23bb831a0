mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn availability_submission_requires_case_and_slots() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let url = format!("{}/api/candidate-availabilities", server.base_url);

    // Missing case_id
    let res = client
        .post(&url)
        .json(&json!({ "slot_ids": ["00000000-0000-0000-0000-000000000000"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Empty slot list
    let res = client
        .post(&url)
        .json(&json!({
            "case_id": "00000000-0000-0000-0000-000000000000",
            "slot_ids": []
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Slot ids must be UUIDs
    let res = client
        .post(&url)
        .json(&json!({
            "case_id": "00000000-0000-0000-0000-000000000000",
            "slot_ids": ["nope"]
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert!(body["error"].is_string());
    Ok(())
}
