use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::Duration;

use crate::audio::{self, AudioBuffer};
use crate::errors::SynthesisError;
use crate::providers::{ensure_sample_rate, Synthesizer};

/// Client for a TTS server that answers `POST /synthesize` with a WAV body
#[derive(Debug)]
pub struct HttpSynthesizer {
    /// Base URL of the server
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Rate the server is expected to produce
    sample_rate: u32,
}

/// Synthesis request body
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Voice or style identifier
    pub voice: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
        }
    }
}

impl HttpSynthesizer {
    /// Create a client for the given base URL
    ///
    /// Request timeouts are enforced per call by the timeline assembler, so the
    /// client itself only bounds connection setup.
    pub fn new(base_url: impl Into<String>, sample_rate: u32) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            base_url,
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            sample_rate,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn synthesize_url(&self) -> String {
        format!("{}/synthesize", self.base_url)
    }
}

#[async_trait]
impl Synthesizer for HttpSynthesizer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let request = SynthesisRequest::new(text, voice);
        debug!("POST {} ({} chars, voice {})", self.synthesize_url(), text.len(), voice);

        let response = self.client.post(self.synthesize_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| SynthesisError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Synthesis server returned {}: {}", status, message);
            return Err(SynthesisError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let body: Bytes = response.bytes().await
            .map_err(|e| SynthesisError::RequestFailed(format!("Failed to read response body: {}", e)))?;

        let buffer = audio::decode_wav(Cursor::new(body))?;
        ensure_sample_rate(&buffer, self.sample_rate)?;
        Ok(buffer)
    }

    async fn test_connection(&self) -> Result<(), SynthesisError> {
        let response = self.client.get(&self.base_url)
            .send()
            .await
            .map_err(|e| SynthesisError::RequestFailed(format!("Cannot reach {}: {}", self.base_url, e)))?;

        // Any HTTP answer means the server is up; a 5xx means it is not healthy
        if response.status().is_server_error() {
            return Err(SynthesisError::ApiError {
                status_code: response.status().as_u16(),
                message: "Synthesis server reported an internal error".to_string(),
            });
        }

        Ok(())
    }
}
