use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Degraded,
    Down,
    Unknown,
}

/// Persistent CLI state kept in `env.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub server_url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            username: None,
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }
}

impl EnvironmentConfig {
    pub fn set_session(&mut self, token: String, username: String) {
        self.token = Some(token);
        self.username = Some(username);
    }

    pub fn clear_session(&mut self) {
        self.token = None;
        self.username = None;
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("COMISSOES_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("oab-comissoes").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn load_environment_config() -> anyhow::Result<EnvironmentConfig> {
    let env_file = get_config_dir()?.join("env.json");

    if !env_file.exists() {
        return Ok(EnvironmentConfig::default());
    }

    let content = fs::read_to_string(env_file)?;
    let config: EnvironmentConfig = serde_json::from_str(&content)?;
    Ok(config)
}

pub fn save_environment_config(config: &EnvironmentConfig) -> anyhow::Result<()> {
    let env_file = get_config_dir()?.join("env.json");

    let content = serde_json::to_string_pretty(config)?;
    fs::write(env_file, content)?;
    Ok(())
}

/// Normalize a user-supplied server address: default scheme, no trailing slash
pub fn normalize_server_url(raw: &str) -> anyhow::Result<String> {
    let raw = raw.trim();
    let with_scheme = if raw.contains("://") { raw.to_string() } else { format!("http://{}", raw) };
    let url = url::Url::parse(&with_scheme).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", raw, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("Server URL must use http or https");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

pub async fn ping_server(server_url: &str) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server_url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        Ok(response) if response.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE => ServerStatus::Degraded,
        _ => ServerStatus::Down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_server_urls() {
        assert_eq!(normalize_server_url("localhost:3000").unwrap(), "http://localhost:3000");
        assert_eq!(normalize_server_url("https://api.example.org/").unwrap(), "https://api.example.org");
        assert!(normalize_server_url("ftp://example.org").is_err());
    }

    #[test]
    fn session_can_be_set_and_cleared() {
        let mut env = EnvironmentConfig::default();
        env.set_session("tok".into(), "comissaoteste".into());
        assert_eq!(env.token.as_deref(), Some("tok"));
        env.clear_session();
        assert!(env.token.is_none() && env.username.is_none());
        assert_eq!(env.server_url, DEFAULT_SERVER_URL);
    }
}
