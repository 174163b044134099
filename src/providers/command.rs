use async_trait::async_trait;
use log::{debug, error};
use std::io::Cursor;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::audio::{self, AudioBuffer};
use crate::errors::SynthesisError;
use crate::providers::{ensure_sample_rate, Synthesizer};

// @const: Placeholder replaced by the voice in command arguments
const VOICE_PLACEHOLDER: &str = "{voice}";

/// Runs a local TTS program that reads text on stdin and writes WAV to stdout
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
    sample_rate: u32,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<String>, args: Vec<String>, sample_rate: u32) -> Self {
        Self {
            program: program.into(),
            args,
            sample_rate,
        }
    }

    /// Arguments with the voice substituted in
    pub fn render_args(&self, voice: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(VOICE_PLACEHOLDER, voice))
            .collect()
    }

    /// Keep only the last few stderr lines, engines tend to be chatty
    fn stderr_tail(stderr: &[u8]) -> String {
        let text = String::from_utf8_lossy(stderr);
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return "no output on stderr".to_string();
        }
        lines[lines.len().saturating_sub(5)..].join("\n")
    }
}

#[async_trait]
impl Synthesizer for CommandSynthesizer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn synthesize(&self, text: &str, voice: &str) -> Result<AudioBuffer, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let args = self.render_args(voice);
        debug!("Running {} {:?}", self.program, args);

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SynthesisError::CommandFailed(format!("Failed to spawn '{}': {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await
                .map_err(|e| SynthesisError::CommandFailed(format!("Failed to write text to '{}': {}", self.program, e)))?;
            // Dropping stdin closes the pipe so the engine sees EOF
        }

        let output = child.wait_with_output().await
            .map_err(|e| SynthesisError::CommandFailed(format!("Failed to wait for '{}': {}", self.program, e)))?;

        if !output.status.success() {
            let tail = Self::stderr_tail(&output.stderr);
            error!("Synthesis command '{}' failed: {}", self.program, tail);
            return Err(SynthesisError::CommandFailed(format!("'{}' exited with {}: {}", self.program, output.status, tail)));
        }

        let buffer = audio::decode_wav(Cursor::new(output.stdout))?;
        ensure_sample_rate(&buffer, self.sample_rate)?;
        Ok(buffer)
    }

    async fn test_connection(&self) -> Result<(), SynthesisError> {
        let status = Command::new(&self.program)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| SynthesisError::CommandFailed(format!("Cannot run '{}': {}", self.program, e)))?;

        debug!("'{} --help' exited with {}", self.program, status);
        Ok(())
    }
}
