/*!
 * Error types for the srtvoice application.
 *
 * This module contains custom error types for the different stages of the
 * narration pipeline, using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to a speech synthesis engine
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// Error when sending a request to the engine fails
    #[error("Synthesis request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the engine itself
    #[error("Synthesis engine responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the engine
        message: String,
    },

    /// The engine returned bytes that are not a usable WAV stream
    #[error("Invalid audio returned by synthesis engine: {0}")]
    InvalidAudio(String),

    /// The engine returned audio at a different sample rate than configured
    #[error("Sample rate mismatch: expected {expected} Hz, got {actual} Hz")]
    SampleRateMismatch {
        /// Rate the pipeline is configured for
        expected: u32,
        /// Rate the engine produced
        actual: u32,
    },

    /// The synthesis call did not complete in time
    #[error("Synthesis timed out after {0:?}")]
    Timeout(Duration),

    /// An external synthesis command exited unsuccessfully
    #[error("Synthesis command failed: {0}")]
    CommandFailed(String),

    /// Synthesis was asked to speak an empty string
    #[error("Cannot synthesize empty text")]
    EmptyText,
}

/// Errors that can occur while reading subtitle input
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The subtitle file could not be read
    #[error("Failed to read subtitle file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while writing output chunks
#[derive(Error, Debug)]
pub enum ExportError {
    /// File system failure (permissions, disk full, ...)
    #[error("I/O error while exporting {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// WAV serialization failure
    #[error("WAV encoding failed for {path:?}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// Part numbers must be strictly increasing within one run
    #[error("Part {part_number} exported out of order (last exported part was {last})")]
    PartOutOfOrder { part_number: usize, last: usize },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// The input path does not exist
    #[error("Input file not found: {0:?}")]
    MissingInput(PathBuf),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Synthesis failed for a cue and the failure policy is to abort
    #[error("Synthesis failed for cue {cue_index}: {source}")]
    Synthesis {
        /// Raw index label of the cue that failed
        cue_index: String,
        #[source]
        source: SynthesisError,
    },

    /// Error from chunk export
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// The run was cancelled between cues
    #[error("Narration cancelled")]
    Cancelled,

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}
