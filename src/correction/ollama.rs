/*!
 * Ollama-backed sentence corrector.
 *
 * Talks to a local Ollama `/api/generate` endpoint. The endpoint must be a
 * loopback address; construction refuses anything externally routable so
 * transcript text never leaves the machine.
 */

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use url::{Host, Url};

use super::{parse_sentence_array, SentenceCorrector};
use crate::errors::CorrectionError;

/// Default Ollama endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default correction model
pub const DEFAULT_MODEL: &str = "qwen:14b";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1000;
const CONNECTION_PROBE_TIMEOUT_SECS: u64 = 5;

// Low temperature keeps the correction deterministic.
const CORRECTION_TEMPERATURE: f32 = 0.1;
const CORRECTION_TOP_P: f32 = 0.9;

/// Instruction template. Placeholders: {count}, {sentences}
const CORRECTION_PROMPT_TEMPLATE: &str = "\
# Role:
你是一個精通香港粵語的專業字幕編輯。

# Task:
以下有 {count} 句由語音識別轉錄的句子。逐句修正錯別字與同音字錯誤（例如「C度」->「喺度」），保留地道粵語口語詞彙（例如「搞掂」、「冇問題」），並補上正確標點。

# Rules:
- 不要合併或拆分句子，輸出句數必須與輸入句數相同。
- 嚴格按照 JSON 字串陣列格式輸出，例如 [\"句子一。\", \"句子二。\"]。
- 絕對不要在輸出中包含任何 markdown 標記（例如 ```json）或任何解釋性文字。

# 原始句子:
{sentences}
";

/// Generate request for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// Whether to stream the response
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    #[serde(default)]
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

/// Builder methods for GenerationRequest - API surface for library consumers
#[allow(dead_code)]
impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: Some(false),
            options: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options
            .get_or_insert(GenerationOptions {
                temperature: None,
                top_p: None,
            })
            .temperature = Some(temperature);
        self
    }

    /// Set the top-p sampling parameter
    pub fn top_p(mut self, top_p: f32) -> Self {
        self.options
            .get_or_insert(GenerationOptions {
                temperature: None,
                top_p: None,
            })
            .top_p = Some(top_p);
        self
    }
}

/// Sentence corrector backed by a local Ollama service
#[derive(Debug)]
pub struct OllamaCorrector {
    /// Base URL of the service, loopback only
    endpoint: String,
    /// Model name
    model: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl OllamaCorrector {
    /// Create a corrector with default timeout and retry settings.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CorrectionError> {
        Self::new_with_config(
            endpoint,
            model,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_MAX_RETRIES,
            DEFAULT_BACKOFF_BASE_MS,
        )
    }

    /// Create a corrector with explicit timeout and retry settings.
    pub fn new_with_config(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CorrectionError> {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self::validate_loopback(&endpoint)?;

        let model = model.into();
        info!("Correction service: model {} at {}", model, endpoint);

        Ok(Self {
            endpoint,
            model,
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Transcript text must never leave the machine: only `localhost`,
    /// `127.0.0.1` and `::1` are accepted as correction endpoints.
    fn validate_loopback(endpoint: &str) -> Result<(), CorrectionError> {
        let url = Url::parse(endpoint).map_err(|e| {
            error!("Refusing unparsable correction endpoint '{}': {}", endpoint, e);
            CorrectionError::EndpointRefused(endpoint.to_string())
        })?;

        let allowed = match url.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(ip)) => ip == Ipv4Addr::LOCALHOST,
            Some(Host::Ipv6(ip)) => ip == Ipv6Addr::LOCALHOST,
            None => false,
        };

        if !allowed {
            error!("Refusing non-loopback correction endpoint: {}", endpoint);
            return Err(CorrectionError::EndpointRefused(endpoint.to_string()));
        }
        Ok(())
    }

    fn build_prompt(&self, raw_text: &str) -> String {
        let numbered: Vec<String> = raw_text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| format!("{}. {}", i + 1, line.trim()))
            .collect();

        CORRECTION_PROMPT_TEMPLATE
            .replace("{count}", &numbered.len().to_string())
            .replace("{sentences}", &numbered.join("\n"))
    }

    /// Send one generation request with retry and exponential backoff.
    async fn generate(&self, prompt: String) -> Result<String, CorrectionError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerationRequest::new(&self.model, prompt)
            .temperature(CORRECTION_TEMPERATURE)
            .top_p(CORRECTION_TOP_P);

        let mut attempt = 0;
        let mut last_error: Option<CorrectionError> = None;

        while attempt <= self.max_retries {
            match self.client.post(&url).json(&request).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed = response
                            .json::<GenerationResponse>()
                            .await
                            .map_err(|e| CorrectionError::ParseError(e.to_string()))?;
                        return Ok(parsed.response);
                    } else if status.as_u16() == 429 {
                        error!(
                            "Correction service rate limited - attempt {}/{}",
                            attempt + 1,
                            self.max_retries + 1
                        );
                        last_error = Some(CorrectionError::RateLimitExceeded(format!(
                            "HTTP 429 from {}",
                            url
                        )));
                    } else if status.is_server_error() {
                        let message = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!(
                            "Correction service error ({}): {} - attempt {}/{}",
                            status,
                            message,
                            attempt + 1,
                            self.max_retries + 1
                        );
                        last_error = Some(CorrectionError::ApiError {
                            status_code: status.as_u16(),
                            message,
                        });
                    } else {
                        // Client error, retrying will not help.
                        let message = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Failed to get error response text".to_string());
                        error!("Correction service error ({}): {}", status, message);
                        return Err(CorrectionError::ApiError {
                            status_code: status.as_u16(),
                            message,
                        });
                    }
                }
                Err(e) => {
                    error!(
                        "Correction service network error: {} - attempt {}/{}",
                        e,
                        attempt + 1,
                        self.max_retries + 1
                    );
                    last_error = Some(CorrectionError::RequestFailed(e.to_string()));
                }
            }

            attempt += 1;
            if attempt <= self.max_retries {
                let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1));
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CorrectionError::ConnectionError(format!(
                "Request failed after {} attempts",
                self.max_retries + 1
            ))
        }))
    }
}

#[async_trait]
impl SentenceCorrector for OllamaCorrector {
    async fn correct(&self, raw_text: &str) -> Vec<String> {
        if raw_text.trim().is_empty() {
            return Vec::new();
        }

        debug!(
            "Sending {} chars to correction service",
            raw_text.chars().count()
        );
        let prompt = self.build_prompt(raw_text);

        match self.generate(prompt).await {
            Ok(reply) => match parse_sentence_array(&reply) {
                Ok(sentences) => {
                    debug!("Correction service returned {} sentences", sentences.len());
                    sentences
                }
                Err(e) => {
                    error!("Unusable correction reply, keeping original text: {}", e);
                    vec![raw_text.to_string()]
                }
            },
            Err(e) => {
                error!("Correction request failed, keeping original text: {}", e);
                vec![raw_text.to_string()]
            }
        }
    }

    async fn check_connection(&self) -> Result<(), CorrectionError> {
        let url = format!("{}/api/generate", self.endpoint);
        let request = GenerationRequest::new(&self.model, "Hi");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .timeout(Duration::from_secs(CONNECTION_PROBE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| CorrectionError::ConnectionError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CorrectionError::ApiError {
                status_code: response.status().as_u16(),
                message: "Correction service probe failed".to_string(),
            })
        }
    }
}
