#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use uuid::Uuid;

use oab_comissoes_api::auth::{encode_token, Claims};

pub const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Unreachable database: exercises every path that must answer
        // before touching Postgres, and the 503 health report
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_oab-comissoes-api"));
        cmd.env("APP_ENV", "development")
            .env("API_PORT", port.to_string())
            .env("JWT_SECRET", JWT_SECRET)
            .env("DATABASE_URL", "postgres://nobody@127.0.0.1:1/none")
            .env("DATABASE_CONNECTION_TIMEOUT", "2")
            .env("DATABASE_AUTO_MIGRATE", "false")
            .env("OPENAI_API_KEY", "")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// Bearer header value for a token signed with the test secret
pub fn bearer(require_password_change: bool) -> String {
    let claims = Claims::new(Uuid::new_v4(), "comissaodetestes".to_string(), None, require_password_change, 1);
    let token = encode_token(&claims, JWT_SECRET).expect("token encodes");
    format!("Bearer {}", token)
}
