#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use job_portal_api::config::{AppConfig, StoreBackend};
use job_portal_api::database::{Collection, DocumentStore, MemoryStore};
use job_portal_api::{app, AppState};

pub const TEST_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    /// Direct handle on the store behind the server
    pub store: MemoryStore,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// POST /jwt and return the `token=...` pair to send back as a Cookie header
    pub async fn login(&self, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/jwt"))
            .json(&json!({ "email": email }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .context("login response has no Set-Cookie")?
            .to_str()?
            .to_string();
        let pair = set_cookie
            .split(';')
            .next()
            .context("empty Set-Cookie")?
            .trim()
            .to_string();
        Ok(pair)
    }

    /// POST /jobs and return the new job id
    pub async fn post_job(&self, job: Value) -> Result<String> {
        let res = self.client.post(self.url("/jobs")).json(&job).send().await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "post job failed: {}", res.status());
        let body: Value = res.json().await?;
        body["insertedId"].as_str().map(str::to_string).context("missing insertedId")
    }

    /// POST /job-applications and return the new application id
    pub async fn apply(&self, job_id: &str, email: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url("/job-applications"))
            .json(&json!({ "job_id": job_id, "applicant_email": email, "status": "pending" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "apply failed: {}", res.status());
        let body: Value = res.json().await?;
        body["insertedId"].as_str().map(str::to_string).context("missing insertedId")
    }

    pub async fn stored_application(&self, id: &str) -> Result<Option<Value>> {
        let id = uuid_of(id)?;
        let doc = self.store.find_by_id(Collection::JobApplications, id).await?;
        Ok(doc.map(Value::Object))
    }
}

fn uuid_of(id: &str) -> Result<uuid::Uuid> {
    Ok(job_portal_api::database::parse_id(id)?)
}

/// Start the real router on a free port, backed by a fresh in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let mut config = AppConfig::development();
    config.server.port = port;
    config.database.backend = StoreBackend::Memory;
    config.security.jwt_secret = TEST_SECRET.to_string();

    let store = MemoryStore::new();
    let state = AppState::new(config, Arc::new(store.clone()));

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.expect("test server");
    });

    let server = TestServer {
        port,
        base_url,
        store,
        client: reqwest::Client::new(),
    };
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}
