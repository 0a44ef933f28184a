//! AI augmentation coordinator
//!
//! Builds a bounded prompt for a source unit, asks the model and decodes
//! whatever comes back. Augmentation is best-effort: a failed, timed-out or
//! superseded call yields no findings and never fails the analysis.

use super::decoder::ResilientFindingDecoder;
use super::prompts::build_review_prompt;
use super::{AiError, AiResult, ModelAsk};
use crate::models::{Finding, SourceUnit};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default character budget of the source sample
pub const DEFAULT_SAMPLE_CHARS: usize = 2000;

/// Drives one model round-trip per source unit
#[derive(Debug, Clone)]
pub struct AugmentationCoordinator {
    decoder: ResilientFindingDecoder,
    sample_chars: usize,
    timeout: Option<Duration>,
}

impl Default for AugmentationCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl AugmentationCoordinator {
    pub fn new() -> Self {
        Self {
            decoder: ResilientFindingDecoder::new(),
            sample_chars: DEFAULT_SAMPLE_CHARS,
            timeout: None,
        }
    }

    pub fn with_sample_chars(mut self, sample_chars: usize) -> Self {
        self.sample_chars = sample_chars.max(1);
        self
    }

    /// Abandon the model call after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn sample_chars(&self) -> usize {
        self.sample_chars
    }

    /// Ask the model about `unit` and decode its reply
    pub async fn augment<A: ModelAsk + ?Sized>(&self, unit: &SourceUnit, ask: &A) -> Vec<Finding> {
        self.augment_with(unit, ask, None).await
    }

    /// Like [`augment`](Self::augment), abandoning the call when `cancel`
    /// fires. Whatever the model would have returned is discarded.
    pub async fn augment_with<A: ModelAsk + ?Sized>(
        &self,
        unit: &SourceUnit,
        ask: &A,
        cancel: Option<&CancellationToken>,
    ) -> Vec<Finding> {
        let prompt = build_review_prompt(unit, self.sample_chars);

        let reply = match cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(AiError::Cancelled),
                    reply = self.ask_bounded(ask, &prompt) => reply,
                }
            }
            None => self.ask_bounded(ask, &prompt).await,
        };

        match reply {
            Ok(text) => {
                let findings = self.decoder.decode(&text, unit);
                debug!("AI augmentation found {} issues in {}", findings.len(), unit.path);
                findings
            }
            Err(AiError::Cancelled) => {
                debug!("AI augmentation for {} superseded", unit.path);
                Vec::new()
            }
            Err(e) => {
                warn!("AI augmentation unavailable for {}: {}", unit.path, e);
                Vec::new()
            }
        }
    }

    async fn ask_bounded<A: ModelAsk + ?Sized>(&self, ask: &A, prompt: &str) -> AiResult<String> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, ask.ask(prompt))
                .await
                .unwrap_or(Err(AiError::Timeout(limit))),
            None => ask.ask(prompt).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AskFn;
    use crate::models::{Category, Origin};
    use std::sync::{Arc, Mutex};

    fn unit() -> SourceUnit {
        SourceUnit::from_path("src/db.js", "const q = 1;\nconst r = 2;\nconst s = 3;\n")
    }

    #[tokio::test]
    async fn test_reply_is_decoded() {
        let ask = AskFn(|_prompt: String| async {
            Ok::<_, AiError>(r#"{"patterns": [{"type": "security", "severity": "high", "description": "raw query", "line": 2}]}"#.to_string())
        });
        let findings = AugmentationCoordinator::new().augment(&unit(), &ask).await;
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, Category::Security);
        assert_eq!(findings[0].origin, Origin::Ai);
        assert_eq!(findings[0].location.start_line, 1);
    }

    #[tokio::test]
    async fn test_prompt_is_bounded() {
        let seen = Arc::new(Mutex::new(String::new()));
        let sink = Arc::clone(&seen);
        let ask = AskFn(move |prompt: String| {
            let sink = Arc::clone(&sink);
            async move {
                *sink.lock().unwrap() = prompt;
                Ok::<_, AiError>(String::new())
            }
        });
        let big = SourceUnit::from_path("big.py", "x = 1\n".repeat(2000));
        let coordinator = AugmentationCoordinator::new().with_sample_chars(60);
        coordinator.augment(&big, &ask).await;

        let prompt = seen.lock().unwrap().clone();
        assert!(prompt.contains("[truncated]"));
        assert!(prompt.matches("x = 1").count() <= 10);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_nothing() {
        let ask = AskFn(|_prompt: String| async {
            Err::<String, _>(AiError::RequestFailed("connection refused".into()))
        });
        assert!(AugmentationCoordinator::new().augment(&unit(), &ask).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_best_effort() {
        let ask = AskFn(|_prompt: String| async { Ok::<_, AiError>("I think it looks fine.".to_string()) });
        assert!(AugmentationCoordinator::new().augment(&unit(), &ask).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_discards_reply() {
        let ask = AskFn(|_prompt: String| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AiError>(r#"{"patterns": [{"type": "security", "description": "late"}]}"#.to_string())
        });
        let coordinator = AugmentationCoordinator::new().with_timeout(Duration::from_secs(5));
        assert!(coordinator.augment(&unit(), &ask).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_discards_reply() {
        let ask = AskFn(|_prompt: String| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, AiError>(r#"{"patterns": [{"type": "security", "description": "late"}]}"#.to_string())
        });
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let findings = AugmentationCoordinator::new()
            .augment_with(&unit(), &ask, Some(&token))
            .await;
        assert!(findings.is_empty());
    }
}
