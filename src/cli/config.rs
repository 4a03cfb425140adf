use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub url: String,
    #[serde(default)]
    pub description: String,
    pub added_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

/// Contents of server.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub servers: HashMap<String, ServerInfo>,
}

/// Token held for one server after `zero auth login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionInfo {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Contents of env.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub current_server: Option<String>,
    #[serde(default)]
    pub sessions: HashMap<String, SessionInfo>,
}

impl EnvironmentConfig {
    pub fn current_session(&self) -> Option<&SessionInfo> {
        self.current_server.as_ref().and_then(|server| self.sessions.get(server))
    }
}

impl ServerInfo {
    /// Accepts `http(s)://host[:port]`; a trailing slash is dropped
    pub fn new(url: &str, description: String) -> anyhow::Result<Self> {
        let parsed = url::Url::parse(url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(anyhow::anyhow!("Server URL must use http or https: {}", url));
        }

        Ok(Self {
            url: parsed.as_str().trim_end_matches('/').to_string(),
            description,
            added_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        })
    }

    /// Default registry name: the URL's host
    pub fn default_name(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.clone())
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("ZERO_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("zero").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn load_json<T: DeserializeOwned + Default>(file_name: &str) -> anyhow::Result<T> {
    let file = get_config_dir()?.join(file_name);
    if !file.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(file)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_json<T: Serialize>(file_name: &str, value: &T) -> anyhow::Result<()> {
    let file = get_config_dir()?.join(file_name);
    fs::write(file, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_json("server.json")
}

pub fn save_server_config(config: &ServerConfig) -> anyhow::Result<()> {
    save_json("server.json", config)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    load_json("env.json")
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    save_json("env.json", config)
}

/// Name and entry of the selected server
pub fn current_server() -> anyhow::Result<(String, ServerInfo)> {
    let env_config = load_environment_config()?;
    let name = env_config
        .current_server
        .ok_or_else(|| anyhow::anyhow!("No current server set. Use 'zero server use <name>' first"))?;

    let servers = load_server_config()?;
    let info = servers
        .servers
        .get(&name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Current server '{}' not found in configuration", name))?;
    Ok((name, info))
}

/// Read a request document from disk; `.yaml`/`.yml` files are YAML, anything else JSON
pub fn read_document<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    parse_document(&content, path)
}

fn parse_document<T: DeserializeOwned>(content: &str, path: &Path) -> anyhow::Result<T> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    );

    if is_yaml {
        serde_yaml::from_str(content).map_err(|e| anyhow::anyhow!("Invalid YAML in {}: {}", path.display(), e))
    } else {
        serde_json::from_str(content).map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))
    }
}

pub async fn ping_server(server_info: &ServerInfo) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_info.url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}
