mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_greets() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.client.get(server.url("/")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await?, "Job is falling from the sky.");
    Ok(())
}

#[tokio::test]
async fn cors_allows_configured_origin_with_credentials() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .client
        .get(server.url("/jobs"))
        .header("Origin", "http://localhost:5173")
        .send()
        .await?;
    assert_eq!(res.headers()["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");

    let res = server
        .client
        .get(server.url("/jobs"))
        .header("Origin", "http://evil.example")
        .send()
        .await?;
    assert!(res.headers().get("access-control-allow-origin").is_none());
    Ok(())
}
