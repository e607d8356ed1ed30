use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::cli::config::{load_environment_config, EnvironmentConfig};

/// Thin REST client over the API envelope
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(90)).build()?;
        Ok(Self { http, base_url: base_url.into(), token })
    }

    pub fn from_env(env: &EnvironmentConfig) -> anyhow::Result<Self> {
        Self::new(env.server_url.clone(), env.token.clone())
    }

    /// Client for the configured server, failing early when not logged in
    pub fn authenticated() -> anyhow::Result<Self> {
        let env = load_environment_config()?;
        if env.token.is_none() {
            anyhow::bail!("Not logged in. Run `comissoes auth login` first");
        }
        Self::from_env(&env)
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn get_query<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path).query(query)).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::PUT, path).json(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> anyhow::Result<Value> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::DELETE, path)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> anyhow::Result<Value> {
        let response = builder.send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        unwrap_envelope(status.as_u16(), body)
    }
}

/// Extract `data` from a success envelope or turn an error envelope into an error
pub fn unwrap_envelope(status: u16, body: Value) -> anyhow::Result<Value> {
    if body.get("success").and_then(Value::as_bool) == Some(true) {
        return Ok(body.get("data").cloned().unwrap_or(Value::Null));
    }

    let message = body.get("error").and_then(Value::as_str).unwrap_or("request failed");
    let code = body.get("code").and_then(Value::as_str).unwrap_or("UNKNOWN");
    let mut text = format!("{} ({} {})", message, status, code);
    if let Some(fields) = body.get("field_errors").and_then(Value::as_object) {
        for (field, detail) in fields {
            text.push_str(&format!("\n  {}: {}", field, detail.as_str().unwrap_or_default()));
        }
    }
    Err(anyhow::anyhow!(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_data() {
        let data = unwrap_envelope(200, json!({ "success": true, "data": [1, 2] })).unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn error_envelope_carries_message_and_fields() {
        let err = unwrap_envelope(
            400,
            json!({
                "success": false,
                "error": "Nome é obrigatório",
                "code": "VALIDATION_ERROR",
                "field_errors": { "nome": "Nome é obrigatório" }
            }),
        )
        .unwrap_err()
        .to_string();
        assert!(err.starts_with("Nome é obrigatório (400 VALIDATION_ERROR)"));
        assert!(err.contains("nome: Nome é obrigatório"));

        let err = unwrap_envelope(502, Value::Null).unwrap_err().to_string();
        assert_eq!(err, "request failed (502 UNKNOWN)");
    }
}
