//! Client for a locally hosted Ollama server.
//!
//! All calls are single-shot blocking requests: one POST per invocation,
//! no retries, no streaming. Schema constraints passed via
//! [`ChatRequest::format`] are forwarded to the server as the `format`
//! field and are best effort; conformance is checked downstream by
//! [`crate::schema::parse_structured`], never here.

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_CHAT_MODEL: &str = "phi3:mini";
pub const DEFAULT_EMBED_MODEL: &str = "all-minilm";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const BASE_URL_ENV_VAR: &str = "DOCMIND_OLLAMA_URL";
pub const CHAT_MODEL_ENV_VAR: &str = "DOCMIND_MODEL";
pub const EMBED_MODEL_ENV_VAR: &str = "DOCMIND_EMBED_MODEL";

/// Connection settings for the Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model used for chat completions.
    pub chat_model: String,
    /// Model used for embeddings.
    pub embed_model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            chat_model: DEFAULT_CHAT_MODEL.into(),
            embed_model: DEFAULT_EMBED_MODEL.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl OllamaConfig {
    /// Resolve settings from, in order of priority, the `DOCMIND_OLLAMA_URL`,
    /// `DOCMIND_MODEL`, and `DOCMIND_EMBED_MODEL` environment variables,
    /// falling back to the built-in defaults. Command-line flags override
    /// the result field by field.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var(BASE_URL_ENV_VAR)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.into()),
            chat_model: std::env::var(CHAT_MODEL_ENV_VAR)
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.into()),
            embed_model: std::env::var(EMBED_MODEL_ENV_VAR)
                .unwrap_or_else(|_| DEFAULT_EMBED_MODEL.into()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// A single-turn chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System instruction.
    pub system: String,
    /// Optional user message following the instruction.
    pub user: Option<String>,
    /// Optional JSON schema the response must conform to.
    pub format: Option<serde_json::Value>,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Anything that can answer a single-turn chat request with raw text.
pub trait LanguageModel {
    fn invoke(&self, request: &ChatRequest) -> Result<String>;
}

/// Anything that can embed a piece of text into a vector.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Client for the Ollama REST API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Check that the server is reachable and list its local models.
    ///
    /// Sends a lightweight request to the `/api/tags` endpoint.
    pub fn probe(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(5))
            .build();

        let resp = agent.get(&url).call().map_err(|e| Error::Unreachable {
            url: self.config.base_url.clone(),
            message: e.to_string(),
        })?;

        let body = resp
            .into_string()
            .map_err(|e| Error::Response(e.to_string()))?;
        let json: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| Error::Response(e.to_string()))?;

        let models = json["models"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| m["name"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    /// Send a single-turn chat request and return the raw response text.
    pub fn chat(&self, request: &ChatRequest) -> Result<String> {
        let body = chat_body(&self.config.chat_model, request);
        let json = self.post_json("/api/chat", &body)?;

        let content = json["message"]["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::Response("missing message content".into()))?;

        tracing::debug!("raw model response: {content}");
        Ok(content)
    }

    /// Embed a piece of text with the configured embedding model.
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.config.embed_model,
            "prompt": text,
        });
        let json = self.post_json("/api/embeddings", &body)?;

        let values = json["embedding"].as_array().ok_or_else(|| {
            Error::Response("missing 'embedding' field".into())
        })?;

        let mut vector = Vec::with_capacity(values.len());
        for value in values {
            let number = value.as_f64().ok_or_else(|| {
                Error::Response("non-numeric embedding value".into())
            })?;
            vector.push(number as f32);
        }
        Ok(vector)
    }

    fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.config.base_url, path);
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build();

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => {
                    Error::Request(format!("server returned status {code}"))
                }
                ureq::Error::Transport(t) => Error::Unreachable {
                    url: self.config.base_url.clone(),
                    message: t.to_string(),
                },
            })?;

        let resp_str = resp
            .into_string()
            .map_err(|e| Error::Response(e.to_string()))?;

        serde_json::from_str(&resp_str).map_err(|e| Error::Response(e.to_string()))
    }
}

impl LanguageModel for OllamaClient {
    fn invoke(&self, request: &ChatRequest) -> Result<String> {
        self.chat(request)
    }
}

impl Embedder for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }
}

fn chat_body(model: &str, request: &ChatRequest) -> serde_json::Value {
    let mut messages = vec![serde_json::json!({
        "role": "system",
        "content": request.system,
    })];
    if let Some(user) = &request.user {
        messages.push(serde_json::json!({
            "role": "user",
            "content": user,
        }));
    }

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
        "stream": false,
        "options": {"temperature": request.temperature},
    });
    if let Some(schema) = &request.format {
        body["format"] = schema.clone();
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_user() -> ChatRequest {
        ChatRequest {
            system: "You are a helpful assistant.".into(),
            user: Some("What is entropy?".into()),
            format: None,
            temperature: 0.7,
        }
    }

    #[test]
    fn default_config_values() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.chat_model, "phi3:mini");
        assert_eq!(config.embed_model, "all-minilm");
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn chat_body_shape() {
        let body = chat_body("phi3:mini", &request_with_user());

        assert_eq!(body["model"], "phi3:mini");
        assert_eq!(body["stream"], false);

        let temperature = body["options"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "What is entropy?");
        assert!(body.get("format").is_none(), "no format unless requested");
    }

    #[test]
    fn chat_body_without_user_message() {
        let request = ChatRequest {
            system: "Summarize.".into(),
            user: None,
            format: None,
            temperature: 0.7,
        };
        let body = chat_body("phi3:mini", &request);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn chat_body_carries_schema_constraint() {
        let schema = serde_json::json!({"type": "object"});
        let request = ChatRequest {
            system: "Extract concepts.".into(),
            user: None,
            format: Some(schema.clone()),
            temperature: 0.8,
        };
        let body = chat_body("phi3:mini", &request);
        assert_eq!(body["format"], schema);
    }

    #[test]
    fn probe_unreachable_is_hard_error() {
        let config = OllamaConfig {
            base_url: "http://127.0.0.1:1".into(), // unreachable port
            ..Default::default()
        };
        let client = OllamaClient::new(config);
        assert!(matches!(client.probe(), Err(Error::Unreachable { .. })));
    }

    #[test]
    fn chat_unreachable_is_hard_error() {
        let config = OllamaConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        let client = OllamaClient::new(config);
        let result = client.chat(&request_with_user());
        assert!(matches!(result, Err(Error::Unreachable { .. })));
    }

    #[test]
    fn embed_unreachable_is_hard_error() {
        let config = OllamaConfig {
            base_url: "http://127.0.0.1:1".into(),
            ..Default::default()
        };
        let client = OllamaClient::new(config);
        assert!(client.embed_text("hello").is_err());
    }
}
