//! Streaming client for the generative-language HTTP API.

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::{AiError, AiGateway, StreamEvent};
use crate::config::AppConfig;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const SUMMARIZE_INSTRUCTION: &str =
    "Summarize the following chapter in a few sentences, keeping every plot-relevant fact:";

/// HTTP client for the generative-language API.
///
/// Streaming uses the server-sent-events form of the generate endpoint;
/// each event carries zero or more text parts. A blocked or malformed
/// event is skipped silently and the stream continues; only request-level
/// failures terminate it with an error.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Build a client from the application settings. Fails when the API
    /// key is absent, before any request is attempted.
    pub fn from_config(config: &AppConfig) -> Result<Self, AiError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(AiError::MissingApiKey)?;

        let mut builder = reqwest::Client::builder();
        let proxy = config.proxy_url.trim();
        if !proxy.is_empty() {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        let model = config.model.trim();
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: if model.is_empty() { DEFAULT_MODEL } else { model }.to_string(),
            client: builder.build()?,
        })
    }

    /// Point the client at a different endpoint base (tests, relays).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_body(prompt: &str, system_context: Option<&str>) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });
        if let Some(context) = system_context {
            body["systemInstruction"] = json!({ "parts": [{ "text": context }] });
        }
        body
    }

    /// Pull the concatenated text parts out of one response payload.
    /// Blocked or shapeless payloads yield `None`.
    fn response_text(value: &Value) -> Option<String> {
        let parts = value
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait::async_trait]
impl AiGateway for GeminiClient {
    async fn stream_text(
        &self,
        prompt: &str,
        system_context: Option<&str>,
    ) -> Result<mpsc::Receiver<StreamEvent>, AiError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AiError::EmptyPrompt);
        }

        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let request = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt, system_context));

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    let _ = tx.send(StreamEvent::Error(err.to_string())).await;
                    return;
                }
            };
            if !response.status().is_success() {
                let status = response.status();
                let detail = response.text().await.unwrap_or_default();
                let _ = tx
                    .send(StreamEvent::Error(format!("{status}: {detail}")))
                    .await;
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        let _ = tx.send(StreamEvent::Error(err.to_string())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim_end_matches('\r').to_string();
                    buffer.drain(..=pos);
                    let Some(data) = line.strip_prefix("data:").map(str::trim) else {
                        continue;
                    };
                    // Blocked or malformed events carry no usable text;
                    // skip them and keep the stream alive.
                    let Ok(value) = serde_json::from_str::<Value>(data) else {
                        continue;
                    };
                    if let Some(text) = Self::response_text(&value) {
                        if tx.send(StreamEvent::Delta(text)).await.is_err() {
                            // Receiver went away with the process; stop pulling.
                            return;
                        }
                    }
                }
            }
            let _ = tx.send(StreamEvent::Done).await;
        });
        Ok(rx)
    }

    async fn summarize(&self, text: &str) -> Result<String, AiError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AiError::EmptyPrompt);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let prompt = format!("{SUMMARIZE_INSTRUCTION}\n\n{text}");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(&prompt, None))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AiError::Api(format!("{status}: {detail}")));
        }
        let value: Value = response.json().await?;
        Self::response_text(&value)
            .ok_or_else(|| AiError::Api("response contained no text".to_string()))
    }
}
