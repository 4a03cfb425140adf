#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use zero_api::auth::TokenIssuer;
use zero_api::database::models::User;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Mutex<Child>,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_zero-api"));
        cmd.env("ZERO_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL from .env when present
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child: Mutex::new(child),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                // Up is enough; the database may legitimately be absent
                if resp.status() == reqwest::StatusCode::OK || resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(45)).await?;
    Ok(server)
}

/// Token signed with the active configuration for a user holding `roles`
pub fn token_with_roles(roles: &[&str]) -> String {
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: "inspector@example.com".to_string(),
        normalized_email: "INSPECTOR@EXAMPLE.COM".to_string(),
        first_name: "Iker".to_string(),
        last_name: "Garmendia".to_string(),
        izaro_code: "IZ-042".to_string(),
        password_hash: String::new(),
        created_at: now,
        updated_at: now,
    };
    let roles: Vec<String> = roles.iter().map(|r| r.to_string()).collect();
    TokenIssuer::from_config()
        .issue(&user, &roles)
        .expect("development config carries a JWT secret")
        .token
}

/// Send one request through the router and decode the JSON body
pub async fn call(app: Router, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
