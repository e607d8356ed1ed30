use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::ServiceError;
use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str = "Você é um assistente que ajuda a criar projetos para as comissões da OAB-GO.";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Turns a free-text project idea into a structured proposal through an
/// OpenAI-compatible chat completion endpoint
#[derive(Clone)]
pub struct IdeiaService {
    client: Client,
    config: LlmConfig,
}

impl IdeiaService {
    pub fn new(config: LlmConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| ServiceError::NotConfigured(format!("HTTP client unavailable: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub async fn generate(&self, ideia: &str) -> Result<Value, ServiceError> {
        let ideia = ideia.trim();
        if ideia.is_empty() {
            return Err(ServiceError::validation("ideia", "Descreva a ideia do projeto"));
        }
        let api_key = match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => return Err(ServiceError::NotConfigured("OPENAI_API_KEY not configured".to_string())),
        };

        let prompt = build_prompt(ideia);
        let body = json!({
            "model": self.config.model,
            "messages": [
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            "temperature": self.config.temperature,
        });

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        tracing::debug!("Requesting project idea from {} ({})", url, self.config.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            tracing::error!("LLM request failed with {}: {}", status, text);
            return Err(ServiceError::Upstream(if text.is_empty() { status.to_string() } else { text }));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ServiceError::Upstream(format!("invalid completion payload: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .unwrap_or_default();

        Ok(parse_completion(&content))
    }
}

pub fn build_prompt(ideia: &str) -> String {
    format!(
        "A partir da seguinte ideia de projeto: \"{}\"\n\
         sugira um nome, descricao curta, objetivos principais, resultados esperados, publico alvo, \
         ate 3 tags e ate 3 possiveis comissoes ou projetos relacionados.\n\
         Responda apenas em JSON no formato: \
         {{\"nome\":\"\",\"descricao\":\"\",\"objetivos\":\"\",\"resultados_esperados\":\"\",\"publico_alvo\":\"\",\
         \"tags\":[\"\"],\"integracoes\":[{{\"nome\":\"\",\"descricao\":\"\"}}]}}",
        ideia
    )
}

/// Parse the model reply as JSON, tolerating a markdown code fence.
/// Anything else comes back as `{ "texto": reply }`.
pub fn parse_completion(content: &str) -> Value {
    let trimmed = strip_code_fence(content.trim());
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(_) => json!({ "texto": content }),
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_idea_and_format() {
        let prompt = build_prompt("portal de transparência");
        assert!(prompt.starts_with("A partir da seguinte ideia de projeto: \"portal de transparência\""));
        assert!(prompt.contains("\"integracoes\":[{\"nome\":\"\",\"descricao\":\"\"}]"));
    }

    #[test]
    fn parses_plain_and_fenced_json() {
        let plain = parse_completion(r#"{"nome":"Portal","tags":["ia"]}"#);
        assert_eq!(plain["nome"], "Portal");

        let fenced = parse_completion("```json\n{\"nome\": \"Portal\"}\n```");
        assert_eq!(fenced["nome"], "Portal");

        let bare_fence = parse_completion("```\n{\"nome\": \"X\"}\n```");
        assert_eq!(bare_fence["nome"], "X");
    }

    #[test]
    fn falls_back_to_raw_text() {
        let value = parse_completion("Não consegui gerar JSON.");
        assert_eq!(value, json!({ "texto": "Não consegui gerar JSON." }));
        assert_eq!(parse_completion(""), json!({ "texto": "" }));
    }

    #[tokio::test]
    async fn blank_idea_and_missing_key_fail_before_any_request() {
        let mut config = crate::config::test_config().llm;
        config.api_key = None;
        let service = IdeiaService::new(config).unwrap();
        assert!(!service.is_configured());
        assert!(matches!(service.generate("  ").await, Err(ServiceError::Validation { .. })));
        assert!(matches!(service.generate("ideia").await, Err(ServiceError::NotConfigured(_))));
    }
}
