//! Outbound gateway to the text-generation service.
//!
//! The vendor wire shape stays behind [`AiGateway`]: the rest of the crate
//! only knows "generate text given a prompt and optional system context,
//! streamed incrementally" plus one-shot summarization.

mod gemini;

pub use gemini::GeminiClient;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::config::ConfigStore;

/// AI gateway errors.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("API key is not configured")]
    MissingApiKey,

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI service error: {0}")]
    Api(String),
}

/// One increment of a streaming generation.
///
/// Deltas arrive in send order; every stream terminates with exactly one
/// `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
}

/// A text-generation service.
///
/// `stream_text` validates its input before any network traffic: a blank
/// prompt or missing credential is an immediate error, not a stream that
/// fails later. Once started, a stream runs to completion or error; there
/// is no mid-stream cancellation.
#[async_trait]
pub trait AiGateway: Send + Sync {
    /// Start a streamed generation; events are delivered in order on the
    /// returned channel.
    async fn stream_text(
        &self,
        prompt: &str,
        system_context: Option<&str>,
    ) -> Result<mpsc::Receiver<StreamEvent>, AiError>;

    /// Single-shot summarization of a chapter.
    async fn summarize(&self, text: &str) -> Result<String, AiError>;
}

/// Gateway bound to the live application settings.
///
/// Credentials, model, and proxy are re-read from the [`ConfigStore`] on
/// every call, so a key pasted into the settings dialog takes effect on the
/// next message without a restart.
pub struct LiveGateway {
    config: ConfigStore,
}

impl LiveGateway {
    pub fn new(config: ConfigStore) -> Self {
        Self { config }
    }

    fn client(&self) -> Result<GeminiClient, AiError> {
        GeminiClient::from_config(&self.config.get())
    }
}

#[async_trait]
impl AiGateway for LiveGateway {
    async fn stream_text(
        &self,
        prompt: &str,
        system_context: Option<&str>,
    ) -> Result<mpsc::Receiver<StreamEvent>, AiError> {
        self.client()?.stream_text(prompt, system_context).await
    }

    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        self.client()?.summarize(text).await
    }
}
