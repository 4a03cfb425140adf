use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::cli::config::{current_server, load_environment_config};

/// Thin HTTP client for the current server that unwraps the response envelope
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            base_url: base_url.into(),
            token,
            http,
        })
    }

    /// Client for the current server without credentials
    pub fn anonymous() -> anyhow::Result<Self> {
        let (_, server) = current_server()?;
        Self::new(server.url, None)
    }

    /// Client for the current server using the saved session token
    pub fn authenticated() -> anyhow::Result<Self> {
        let (name, server) = current_server()?;
        let env_config = load_environment_config()?;
        let session = env_config
            .sessions
            .get(&name)
            .ok_or_else(|| anyhow::anyhow!("Not logged in to '{}'. Use 'zero auth login' first", name))?;

        if session.is_expired() {
            return Err(anyhow::anyhow!("Session for '{}' expired at {}; log in again", name, session.expires_at));
        }

        Self::new(server.url, Some(session.token.clone()))
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        self.send::<()>(Method::GET, path, query, None).await
    }

    pub async fn post<B: Serialize>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> anyhow::Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let envelope: Value = response.json().await.unwrap_or(Value::Null);
        unwrap_envelope(status, envelope)
    }
}

/// `data` of a success envelope, or an error carrying the server's message and code
fn unwrap_envelope(status: StatusCode, envelope: Value) -> anyhow::Result<Value> {
    if status.is_success() && envelope["success"] == Value::Bool(true) {
        return Ok(envelope.get("data").cloned().unwrap_or(Value::Null));
    }

    let message = envelope["error"].as_str().unwrap_or("request failed");
    let mut text = match envelope["code"].as_str() {
        Some(code) => format!("{} ({}): {}", status.as_u16(), code, message),
        None => format!("{}: {}", status.as_u16(), message),
    };
    if let Some(errors) = envelope["errors"].as_array() {
        for error in errors.iter().filter_map(Value::as_str) {
            text.push_str(&format!("\n  - {}", error));
        }
    }
    if let Some(details) = envelope.get("details") {
        text.push_str(&format!("\n  details: {}", details));
    }
    Err(anyhow::anyhow!(text))
}
