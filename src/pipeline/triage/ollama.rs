use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::prompt::TriagePrompt;
use super::types::{GenerationOptions, LlmClient};
use super::InvocationError;
use crate::config::LlmConfig;

/// Ollama HTTP client for chat-style inference.
pub struct OllamaClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, InvocationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| InvocationError::HttpClient(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, InvocationError> {
        Self::new(&config.base_url, config.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_send_error(&self, e: reqwest::Error) -> InvocationError {
        if e.is_connect() {
            InvocationError::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            InvocationError::Timeout(self.timeout_secs)
        } else {
            InvocationError::HttpClient(e.to_string())
        }
    }
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

/// Response body from Ollama /api/chat
#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl LlmClient for OllamaClient {
    fn chat(
        &self,
        model: &str,
        prompt: &TriagePrompt,
        options: &GenerationOptions,
    ) -> Result<String, InvocationError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            stream: false,
            options: ChatOptions {
                temperature: options.temperature,
                top_p: options.top_p,
                num_predict: options.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => InvocationError::Unauthorized {
                    status: status.as_u16(),
                },
                429 => InvocationError::QuotaExceeded(body),
                code => InvocationError::Upstream { status: code, body },
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| InvocationError::ResponseBody(e.to_string()))?;

        Ok(parsed.message.content)
    }
}

/// Mock LLM client for testing. Returns a fixed reply or a fixed failure
/// and remembers the last prompt it was sent.
pub struct MockLlmClient {
    reply: Option<String>,
    last_prompt: Mutex<Option<TriagePrompt>>,
}

impl MockLlmClient {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            last_prompt: Mutex::new(None),
        }
    }

    /// A client whose every call fails as if the endpoint were down.
    pub fn unreachable() -> Self {
        Self {
            reply: None,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn last_prompt(&self) -> Option<TriagePrompt> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl LlmClient for MockLlmClient {
    fn chat(
        &self,
        _model: &str,
        prompt: &TriagePrompt,
        _options: &GenerationOptions,
    ) -> Result<String, InvocationError> {
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.clone());
        }
        self.reply
            .clone()
            .ok_or_else(|| InvocationError::Connection("mock://unreachable".into()))
    }
}
