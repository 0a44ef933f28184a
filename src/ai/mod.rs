//! AI augmentation
//!
//! Best-effort enrichment of local findings with an external text model.
//! The model is reached through the [`ModelAsk`] capability; its free-form,
//! frequently malformed reply is recovered by the [`ResilientFindingDecoder`].
//! Uses BYOK (bring your own key): API keys are read from environment variables.
//!
//! # Environment Variables
//!
//! - `ANTHROPIC_API_KEY`: Required for the Anthropic backend
//! - `OPENAI_API_KEY`: Required for the OpenAI backend
//! - `DEEPINFRA_API_KEY`, `OPENROUTER_API_KEY`: OpenAI-compatible backends
//! - `OLLAMA_MODEL`: Optional model override for a local Ollama server
//!
//! # Example
//!
//! ```rust,ignore
//! use codesight::ai::{AiClient, AiConfig, AugmentationCoordinator};
//!
//! let client = AiClient::from_env(AiConfig::default())?;
//! let coordinator = AugmentationCoordinator::default();
//! let findings = coordinator.augment(&unit, &client).await;
//! ```

mod augment;
mod client;
pub mod decoder;
mod prompts;

pub use augment::AugmentationCoordinator;
pub use client::{AiClient, AiConfig, LlmBackend};
pub use decoder::{DecodeStrategy, RawRecord, ResilientFindingDecoder};
pub use prompts::{build_review_prompt, sample_source, SYSTEM_PROMPT};

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the AI module
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Missing API key: {env_var} not set. Get your key at {signup_url}")]
    MissingApiKey { env_var: String, signup_url: String },

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model call cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type AiResult<T> = Result<T, AiError>;

/// The model-ask capability: send a prompt, get raw text back.
///
/// Implementations may fail with a transport error; callers treat failure
/// and a malformed reply the same way.
#[async_trait]
pub trait ModelAsk: Send + Sync {
    async fn ask(&self, prompt: &str) -> AiResult<String>;
}

/// Adapts an async closure into a [`ModelAsk`]
pub struct AskFn<F>(pub F);

#[async_trait]
impl<F, Fut> ModelAsk for AskFn<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = AiResult<String>> + Send,
{
    async fn ask(&self, prompt: &str) -> AiResult<String> {
        (self.0)(prompt.to_string()).await
    }
}
