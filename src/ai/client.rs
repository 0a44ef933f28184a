//! LLM API client supporting Anthropic and OpenAI-compatible backends
//!
//! Each call is a single user turn plus the configured system prompt. HTTP is
//! synchronous (ureq); the async [`ModelAsk`] implementation moves the call
//! onto tokio's blocking pool so it never stalls the runtime.

use crate::ai::{AiError, AiResult, ModelAsk};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::debug;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    #[default]
    Anthropic,
    OpenAi,
    Deepinfra,
    OpenRouter,
    Ollama,
}

impl LlmBackend {
    pub fn env_key(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Deepinfra => "DEEPINFRA_API_KEY",
            LlmBackend::OpenRouter => "OPENROUTER_API_KEY",
            LlmBackend::Ollama => "OLLAMA_MODEL",
        }
    }

    pub fn signup_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://console.anthropic.com/settings/keys",
            LlmBackend::OpenAi => "https://platform.openai.com/api-keys",
            LlmBackend::Deepinfra => "https://deepinfra.com/dash/api_keys",
            LlmBackend::OpenRouter => "https://openrouter.ai/keys",
            LlmBackend::Ollama => "https://ollama.ai (no key needed, just run locally)",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "claude-sonnet-4-20250514",
            LlmBackend::OpenAi => "gpt-4o-mini",
            LlmBackend::Deepinfra => "meta-llama/Llama-3.3-70B-Instruct",
            LlmBackend::OpenRouter => "anthropic/claude-sonnet-4",
            LlmBackend::Ollama => "qwen2.5-coder:7b",
        }
    }

    pub fn api_url(&self) -> &'static str {
        match self {
            LlmBackend::Anthropic => "https://api.anthropic.com/v1/messages",
            LlmBackend::OpenAi => "https://api.openai.com/v1/chat/completions",
            LlmBackend::Deepinfra => "https://api.deepinfra.com/v1/openai/chat/completions",
            LlmBackend::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            LlmBackend::Ollama => "http://localhost:11434/v1/chat/completions",
        }
    }

    pub fn is_openai_compatible(&self) -> bool {
        !matches!(self, LlmBackend::Anthropic)
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, LlmBackend::Ollama)
    }
}

impl std::str::FromStr for LlmBackend {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmBackend::Anthropic),
            "openai" => Ok(LlmBackend::OpenAi),
            "deepinfra" => Ok(LlmBackend::Deepinfra),
            "openrouter" => Ok(LlmBackend::OpenRouter),
            "ollama" => Ok(LlmBackend::Ollama),
            other => Err(AiError::ConfigError(format!(
                "Unknown AI backend '{}'. Valid: anthropic, openai, deepinfra, openrouter, ollama",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: LlmBackend,
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    /// HTTP timeout for a single call
    pub timeout: Duration,
    /// System prompt sent with every `ask`
    pub system: Option<String>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::default(),
            model: None,
            max_tokens: 2048,
            temperature: 0.1,
            timeout: Duration::from_secs(30),
            system: Some(crate::ai::SYSTEM_PROMPT.to_string()),
        }
    }
}

impl AiConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.backend.default_model())
    }
}

/// Client for one review prompt at a time
#[derive(Clone)]
pub struct AiClient {
    config: AiConfig,
    api_key: String,
    agent: ureq::Agent,
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    ureq::config::Config::builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent()
}

impl AiClient {
    pub fn new(config: AiConfig, api_key: impl Into<String>) -> Self {
        let agent = make_agent(config.timeout);
        Self {
            config,
            api_key: api_key.into(),
            agent,
        }
    }

    /// Client for `config`, reading the backend's API key from the environment
    pub fn from_env(mut config: AiConfig) -> AiResult<Self> {
        if !config.backend.requires_api_key() {
            if config.model.is_none() {
                config.model = env::var("OLLAMA_MODEL").ok();
            }
            return Ok(Self::new(config, "ollama"));
        }

        let env_key = config.backend.env_key();
        let api_key = env::var(env_key).map_err(|_| AiError::MissingApiKey {
            env_var: env_key.to_string(),
            signup_url: config.backend.signup_url().to_string(),
        })?;

        Ok(Self::new(config, api_key))
    }

    pub fn backend(&self) -> LlmBackend {
        self.config.backend
    }

    pub fn model(&self) -> &str {
        self.config.model()
    }

    /// Send one prompt and return the reply text (blocking)
    pub fn complete(&self, prompt: &str) -> AiResult<String> {
        debug!(
            "Asking {:?} ({}) about {} prompt chars",
            self.config.backend,
            self.model(),
            prompt.len()
        );
        if self.config.backend.is_openai_compatible() {
            self.complete_openai(prompt)
        } else {
            self.complete_anthropic(prompt)
        }
    }

    /// Send a request and turn transport errors and 4xx/5xx into `AiError`
    fn send<B: Serialize>(
        &self,
        request: ureq::RequestBuilder<ureq::typestate::WithBody>,
        body: &B,
    ) -> AiResult<ureq::http::Response<ureq::Body>> {
        let response = request.send_json(body).map_err(|e| match e {
            ureq::Error::Timeout(_) => AiError::Timeout(self.config.timeout),
            other => AiError::RequestFailed(other.to_string()),
        })?;

        let status = response.status().as_u16();
        if status >= 400 {
            let message = response.into_body().read_to_string().unwrap_or_default();
            return Err(AiError::ApiError { status, message });
        }
        Ok(response)
    }

    fn openai_body<'a>(&'a self, prompt: &'a str) -> OpenAiRequest<'a> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.config.system.as_deref() {
            messages.push(Turn { role: "system", content: system });
        }
        messages.push(Turn { role: "user", content: prompt });
        OpenAiRequest {
            model: self.model(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    fn anthropic_body<'a>(&'a self, prompt: &'a str) -> AnthropicRequest<'a> {
        AnthropicRequest {
            model: self.model(),
            max_tokens: self.config.max_tokens,
            messages: vec![Turn { role: "user", content: prompt }],
            system: self.config.system.as_deref(),
            temperature: self.config.temperature,
        }
    }

    fn complete_openai(&self, prompt: &str) -> AiResult<String> {
        let mut request = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json");
        if self.config.backend.requires_api_key() {
            request = request.header("Authorization", &format!("Bearer {}", self.api_key));
        }

        let resp: OpenAiResponse = self
            .send(request, &self.openai_body(prompt))?
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::ParseError("No response choices".to_string()))
    }

    fn complete_anthropic(&self, prompt: &str) -> AiResult<String> {
        let request = self
            .agent
            .post(self.config.backend.api_url())
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01");

        let resp: AnthropicResponse = self
            .send(request, &self.anthropic_body(prompt))?
            .into_body()
            .read_json()
            .map_err(|e| AiError::ParseError(e.to_string()))?;

        let text: String = resp
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text)
            .collect();
        if text.is_empty() {
            return Err(AiError::ParseError("No text content in response".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ModelAsk for AiClient {
    async fn ask(&self, prompt: &str) -> AiResult<String> {
        let client = self.clone();
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || client.complete(&prompt))
            .await
            .map_err(|e| AiError::RequestFailed(format!("model task failed: {}", e)))?
    }
}

/// One chat turn on the wire
#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<Turn<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

/// Anthropic takes the system prompt outside the turn list
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Turn<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    temperature: f32,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}
