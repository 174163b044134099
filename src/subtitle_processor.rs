use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::debug;

use crate::errors::{AppError, SubtitleError};

// @module: Subtitle parsing into an ordered cue timeline

// @const: Single SRT timestamp (HH:MM:SS,mmm)
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d+):(\d+),(\d+)$").expect("timestamp regex is valid")
});

// @const: Separator between start and end timestamp
const TIME_SEPARATOR: &str = " --> ";

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    // @field: Raw index label, kept for traceability only
    pub index: String,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms (not checked against start)
    pub end_time_ms: u64,

    // @field: Spoken text, may be empty
    pub text: String,
}

impl Cue {
    pub fn new(index: impl Into<String>, start_time_ms: u64, end_time_ms: u64, text: impl Into<String>) -> Self {
        Cue {
            index: index.into(),
            start_time_ms,
            end_time_ms,
            text: text.into(),
        }
    }

    /// Start time in seconds
    pub fn start_seconds(&self) -> f64 {
        self.start_time_ms as f64 / 1000.0
    }

    /// End time in seconds
    pub fn end_seconds(&self) -> f64 {
        self.end_time_ms as f64 / 1000.0
    }

    /// Whether this cue has anything to speak
    pub fn has_speech(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Declared duration in ms, zero when the end precedes the start
    pub fn nominal_duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds
    ///
    /// Returns `None` when the text does not have that shape.
    pub fn parse_timestamp(timestamp: &str) -> Option<u64> {
        let caps = TIMESTAMP_REGEX.captures(timestamp.trim())?;
        let field = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());

        let hours = field(1)?;
        let minutes = field(2)?;
        let seconds = field(3)?;
        let millis = field(4)?;

        // Oversized fields make the block malformed rather than wrapping
        hours
            .checked_mul(3600)
            .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
            .and_then(|hm| hm.checked_add(seconds))
            .and_then(|total| total.checked_mul(1000))
            .and_then(|total| total.checked_add(millis))
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "#{} [{} --> {}] {}",
            self.index,
            Self::format_timestamp(self.start_time_ms),
            Self::format_timestamp(self.end_time_ms),
            self.text
        )
    }
}

/// Parse SRT content into cues, in source order
///
/// Blocks are separated by a blank line. A block is skipped when it has fewer
/// than three lines, when its second line lacks `" --> "`, or when one of its
/// timestamps is not `HH:MM:SS,mmm`. Nothing here fails.
pub fn parse_srt_string(content: &str) -> Vec<Cue> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut cues = Vec::new();

    for (block_number, block) in normalized.trim().split("\n\n").enumerate() {
        match parse_block(block) {
            Some(cue) => cues.push(cue),
            None => debug!("Skipping malformed subtitle block {}: {:?}", block_number + 1, block),
        }
    }

    cues
}

fn parse_block(block: &str) -> Option<Cue> {
    let lines: Vec<&str> = block.trim().split('\n').collect();
    if lines.len() < 3 {
        return None;
    }

    let index = lines[0].trim();
    let time_range = lines[1].trim();
    let (start, end) = time_range.split_once(TIME_SEPARATOR)?;

    let start_time_ms = Cue::parse_timestamp(start)?;
    let end_time_ms = Cue::parse_timestamp(end)?;
    let text = lines[2..].join(" ").trim().to_string();

    Some(Cue::new(index, start_time_ms, end_time_ms, text))
}

/// Parsed subtitle file
#[derive(Debug)]
pub struct CueTrack {
    /// Source filename
    pub source_file: PathBuf,

    /// Cues in source order
    pub cues: Vec<Cue>,
}

impl CueTrack {
    pub fn new(source_file: PathBuf, cues: Vec<Cue>) -> Self {
        CueTrack { source_file, cues }
    }

    /// Read and parse an SRT file
    ///
    /// A missing file is reported as `AppError::MissingInput`; any other read
    /// failure is a `SubtitleError`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::MissingInput(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| SubtitleError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(path.to_path_buf(), parse_srt_string(&content)))
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Number of cues that carry text to synthesize
    pub fn spoken_cue_count(&self) -> usize {
        self.cues.iter().filter(|c| c.has_speech()).count()
    }
}

impl fmt::Display for CueTrack {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Subtitle Track")?;
        writeln!(f, "Source: {:?}", self.source_file)?;
        writeln!(f, "Cues: {} ({} spoken)", self.len(), self.spoken_cue_count())?;
        Ok(())
    }
}
