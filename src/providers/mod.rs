/*!
 * Speech synthesis engines.
 *
 * This module contains adapters for the engines the pipeline can speak through:
 * - HTTP: a TTS server that answers with WAV audio
 * - Command: a local program (Piper-style) that writes WAV to stdout
 * - Mock: deterministic in-process engine for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::app_config::{SynthesisConfig, SynthesisProvider};
use crate::audio::AudioBuffer;
use crate::errors::SynthesisError;

/// Common trait for all speech synthesis engines
///
/// Engines are built once and shared by reference with the timeline
/// assembler. Every call returns a complete mono buffer or an error.
#[async_trait]
pub trait Synthesizer: Send + Sync + Debug {
    /// Sample rate of the buffers this engine returns
    fn sample_rate(&self) -> u32;

    /// Speak `text` with the given voice
    ///
    /// # Arguments
    /// * `text` - Non-empty text to speak
    /// * `voice` - Voice or style identifier understood by the engine
    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer, SynthesisError>;

    /// Test the connection to the engine
    async fn test_connection(&self) -> Result<(), SynthesisError>;
}

/// Build the configured engine
pub fn from_config(config: &SynthesisConfig) -> Box<dyn Synthesizer> {
    match config.provider {
        SynthesisProvider::Http => Box::new(http::HttpSynthesizer::new(
            config.endpoint.clone(),
            config.sample_rate,
        )),
        SynthesisProvider::Command => Box::new(command::CommandSynthesizer::new(
            config.command.clone(),
            config.args.clone(),
            config.sample_rate,
        )),
    }
}

/// Reject audio that does not match the rate the pipeline runs at
pub(crate) fn ensure_sample_rate(buffer: &AudioBuffer, expected: u32) -> Result<(), SynthesisError> {
    if buffer.sample_rate() != expected {
        return Err(SynthesisError::SampleRateMismatch {
            expected,
            actual: buffer.sample_rate(),
        });
    }
    Ok(())
}

pub mod http;
pub mod command;
pub mod mock;
