pub mod error;

pub use error::SfxError;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Serialize;
use std::thread;
use std::time::Duration;
use tracing::warn;

pub const SOUND_GENERATION_URL: &str = "https://api.elevenlabs.io/v1/sound-generation";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_CAP_MS: u64 = 8_000;

/// Provider seam for sound generation. The batch loop talks to this trait
/// only, so tests can swap the HTTP client for a scripted stand-in.
pub trait SoundGenerator {
    /// Generate one sound effect, blocking until the provider returns the
    /// encoded audio bytes or a categorized failure.
    fn generate(
        &self,
        text: &str,
        duration_seconds: f64,
        prompt_influence: f64,
    ) -> Result<Vec<u8>, SfxError>;
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    text: &'a str,
    duration_seconds: f64,
    prompt_influence: f64,
}

/// Blocking client for the ElevenLabs sound-generation endpoint. Owns the
/// retry policy: transient failures are retried up to `max_retries` times
/// with capped exponential backoff.
pub struct ElevenLabsSfxClient {
    http: Client,
    api_key: String,
    max_retries: u32,
    endpoint: String,
}

impl ElevenLabsSfxClient {
    pub fn new(api_key: impl Into<String>, max_retries: u32) -> Result<Self, SfxError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SfxError::ApiKey("API key must not be empty".to_string()));
        }

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            api_key,
            max_retries,
            endpoint: SOUND_GENERATION_URL.to_string(),
        })
    }

    fn request_once(&self, body: &GenerationRequest<'_>) -> Result<Vec<u8>, SfxError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header("xi-api-key", &self.api_key)
            .json(body)
            .send()?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.bytes()?.to_vec());
        }

        let detail = summarize_error_body(&response.text().unwrap_or_default(), status);
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SfxError::ApiKey(detail),
            StatusCode::TOO_MANY_REQUESTS => SfxError::RateLimit(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                SfxError::Parameter(detail)
            }
            _ => SfxError::Generation(detail),
        })
    }
}

impl SoundGenerator for ElevenLabsSfxClient {
    fn generate(
        &self,
        text: &str,
        duration_seconds: f64,
        prompt_influence: f64,
    ) -> Result<Vec<u8>, SfxError> {
        let body = GenerationRequest {
            text,
            duration_seconds,
            prompt_influence,
        };

        let mut attempt: u32 = 0;
        loop {
            match self.request_once(&body) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = backoff_delay(attempt);
                    warn!(
                        "generation attempt {}/{} failed ({err}); retrying in {delay:?}",
                        attempt + 1,
                        self.max_retries + 1
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    let ms = BACKOFF_BASE_MS.saturating_mul(1 << attempt.min(6));
    Duration::from_millis(ms.min(BACKOFF_CAP_MS))
}

/// Pull the human-readable message out of an API error body, which is
/// usually JSON shaped like `{"detail": {"message": "..."}}`.
fn summarize_error_body(body: &str, status: StatusCode) -> String {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/detail/message")
                .or_else(|| value.pointer("/detail"))
                .and_then(|m| m.as_str().map(str::to_string))
        });

    match message {
        Some(message) => format!("HTTP {status}: {message}"),
        None => {
            let trimmed: String = body.trim().chars().take(300).collect();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                format!("HTTP {status}: {trimmed}")
            }
        }
    }
}
