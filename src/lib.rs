/*!
 * # srtvoice - Subtitle narration
 *
 * A Rust library that turns a subtitle track into spoken audio.
 *
 * ## Features
 *
 * - Parse SRT subtitles into an ordered cue timeline
 * - Synthesize speech for every cue through pluggable engines:
 *   - HTTP TTS servers returning WAV
 *   - Local programs writing WAV to stdout (Piper-style)
 * - Insert silence so each cue starts where the subtitle says it does
 * - Export the track as WAV files holding a fixed number of cues each
 * - Retry, timeout and cancellation handling for long synthesis runs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: SRT parsing into cues
 * - `audio`: Sample buffers, silence generation and WAV decoding
 * - `providers`: Speech synthesis engines
 * - `timeline`: Cue-by-cue assembly of the audio track
 * - `exporter`: Atomic WAV export of finished chunks
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod audio;
pub mod file_utils;
pub mod subtitle_processor;
pub mod providers;
pub mod timeline;
pub mod exporter;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunReport};
pub use audio::{silence, AudioBuffer};
pub use subtitle_processor::{parse_srt_string, Cue, CueTrack};
pub use timeline::{AudioChunk, CancellationFlag, TimelineAssembler};
pub use exporter::ChunkExporter;
pub use errors::{AppError, ExportError, SubtitleError, SynthesisError};
