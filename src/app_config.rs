use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Voice or style identifier passed to the synthesis engine
    #[serde(default = "default_voice")]
    pub voice: String,

    /// Number of cues per output file
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// How the timeline cursor advances between cues
    #[serde(default)]
    pub timing_mode: TimingMode,

    /// Synthesis engine config
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Synthesis engine type
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisProvider {
    // @provider: HTTP TTS server returning WAV
    #[default]
    Http,
    // @provider: External program writing WAV to stdout
    Command,
}

impl SynthesisProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Http => "HTTP",
            Self::Command => "Command",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Http => "http".to_string(),
            Self::Command => "command".to_string(),
        }
    }
}

impl std::fmt::Display for SynthesisProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for SynthesisProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "command" => Ok(Self::Command),
            _ => Err(anyhow!("Invalid synthesis provider: {}", s)),
        }
    }
}

/// What to do with a cue once synthesis retries are exhausted
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Abort the whole run
    #[default]
    Abort,
    /// Substitute silence of the cue's nominal duration and carry on
    Silence,
}

/// Cursor behaviour between cues
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// Cursor follows declared cue end times; long speech makes the track run behind
    #[default]
    Nominal,
    /// Cursor never falls behind the audio already emitted
    DriftCorrected,
}

/// Synthesis engine configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SynthesisConfig {
    /// Engine to use
    #[serde(default)]
    pub provider: SynthesisProvider,

    /// Base URL of the HTTP engine
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Program to run for the command engine
    #[serde(default = "default_command")]
    pub command: String,

    /// Arguments for the command engine; `{voice}` is replaced by the voice
    #[serde(default = "default_command_args")]
    pub args: Vec<String>,

    /// Sample rate the engine produces and the output files use
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Per-call timeout in seconds, 0 disables it
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional attempts after a failed synthesis call
    #[serde(default)]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Policy once retries are exhausted
    #[serde(default)]
    pub on_failure: FailurePolicy,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: SynthesisProvider::default(),
            endpoint: default_endpoint(),
            command: default_command(),
            args: default_command_args(),
            sample_rate: default_sample_rate(),
            timeout_secs: default_timeout_secs(),
            retry_count: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            on_failure: FailurePolicy::default(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

pub fn default_voice() -> String {
    "v2/en_speaker_6".to_string()
}

pub fn default_chunk_size() -> usize {
    100
}

fn default_endpoint() -> String {
    "http://localhost:5002".to_string()
}

fn default_command() -> String {
    "piper".to_string()
}

fn default_command_args() -> Vec<String> {
    vec![
        "--model".to_string(),
        "{voice}".to_string(),
        "--output_file".to_string(),
        "-".to_string(),
    ]
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.voice.trim().is_empty() {
            return Err(anyhow!("Voice identifier must not be empty"));
        }

        if self.chunk_size == 0 {
            return Err(anyhow!("Chunk size must be at least 1 cue"));
        }

        if self.synthesis.sample_rate == 0 {
            return Err(anyhow!("Sample rate must be greater than zero"));
        }

        match self.synthesis.provider {
            SynthesisProvider::Http => {
                url::Url::parse(&self.synthesis.endpoint).map_err(|e| {
                    anyhow!("Invalid synthesis endpoint '{}': {}", self.synthesis.endpoint, e)
                })?;
            }
            SynthesisProvider::Command => {
                if self.synthesis.command.trim().is_empty() {
                    return Err(anyhow!("A command is required for the command synthesis provider"));
                }
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            voice: default_voice(),
            chunk_size: default_chunk_size(),
            timing_mode: TimingMode::default(),
            synthesis: SynthesisConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
