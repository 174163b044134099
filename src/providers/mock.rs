/*!
 * Mock synthesis engine for testing.
 *
 * The mock produces a deterministic buffer whose length depends only on the
 * text, so tests can predict exactly how many samples a cue contributes:
 * - `MockSynthesizer::working()` - Always succeeds
 * - `MockSynthesizer::intermittent(n)` - Fails every nth call
 * - `MockSynthesizer::failing()` - Always fails with an error
 * - `MockSynthesizer::slow(ms)` - Sleeps before answering (timeout testing)
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::audio::AudioBuffer;
use crate::errors::SynthesisError;
use crate::providers::Synthesizer;

/// Samples emitted per character of text
pub const SAMPLES_PER_CHAR: usize = 100;

/// Amplitude of the emitted samples, non-zero so speech differs from silence
pub const MOCK_AMPLITUDE: f32 = 0.5;

/// Behavior mode for the mock engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails on every Nth call
    Intermittent { fail_every: usize },
    /// Always fails
    Failing,
    /// Sleeps before succeeding
    Slow { delay_ms: u64 },
    /// Succeeds but reports a different sample rate
    WrongRate { actual: u32 },
}

/// Mock engine recording every call it receives
#[derive(Debug, Clone)]
pub struct MockSynthesizer {
    behavior: MockBehavior,
    sample_rate: u32,
    call_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSynthesizer {
    pub fn new(behavior: MockBehavior, sample_rate: u32) -> Self {
        Self {
            behavior,
            sample_rate,
            call_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working, 24_000)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every }, 24_000)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing, 24_000)
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms }, 24_000)
    }

    pub fn wrong_rate(actual: u32) -> Self {
        Self::new(MockBehavior::WrongRate { actual }, 24_000)
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Number of synthesize calls, failed ones included
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// `(text, voice)` of every call in order
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    /// Number of samples the mock returns for `text`
    pub fn expected_len(text: &str) -> usize {
        text.chars().count() * SAMPLES_PER_CHAR
    }

    fn speech(&self, text: &str, sample_rate: u32) -> AudioBuffer {
        AudioBuffer::from_samples(vec![MOCK_AMPLITUDE; Self::expected_len(text)], sample_rate)
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer, SynthesisError> {
        let count = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push((text.to_string(), voice.to_string()));

        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.speech(text, self.sample_rate)),

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(SynthesisError::ApiError {
                        status_code: 503,
                        message: format!("Simulated intermittent failure (call #{})", count + 1),
                    })
                } else {
                    Ok(self.speech(text, self.sample_rate))
                }
            }

            MockBehavior::Failing => Err(SynthesisError::ApiError {
                status_code: 500,
                message: "Simulated engine failure".to_string(),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.speech(text, self.sample_rate))
            }

            MockBehavior::WrongRate { actual } => Ok(self.speech(text, actual)),
        }
    }

    async fn test_connection(&self) -> Result<(), SynthesisError> {
        match self.behavior {
            MockBehavior::Failing => Err(SynthesisError::RequestFailed("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }
}
