/*!
 * Tests for SRT parsing
 */

use anyhow::Result;
use std::fmt::Write;
use srtvoice::subtitle_processor::{parse_srt_string, Cue, CueTrack};
use srtvoice::AppError;
use crate::common;

/// Test timestamp parsing and formatting
#[test]
fn test_timestamp_parsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let ms = Cue::parse_timestamp(ts).unwrap();
    assert_eq!(ms, 5_025_678);

    assert_eq!(Cue::format_timestamp(ms), ts);
}

/// Test seconds conversion of a late cue
#[test]
fn test_parse_withLateTimestamp_shouldKeepMillisecondPrecision() {
    let cues = parse_srt_string("1\n12:34:56,789 --> 12:34:57,000\nLate line\n");
    assert_eq!(cues.len(), 1);
    assert_eq!(cues[0].start_time_ms, 45_296_789);
    assert!((cues[0].start_seconds() - 45296.789).abs() < 1e-9);
    assert!((cues[0].end_seconds() - 45297.0).abs() < 1e-9);
}

/// Test cue display formatting
#[test]
fn test_cue_display_withValidCue_shouldFormatCorrectly() {
    let cue = Cue::new("7", 5000, 10_000, "Test subtitle");
    let mut output = String::new();
    write!(output, "{}", cue).unwrap();

    assert!(output.contains("#7"));
    assert!(output.contains("00:00:05,000"));
    assert!(output.contains("00:00:10,000"));
    assert!(output.contains("Test subtitle"));
}

/// Text lines are joined with single spaces
#[test]
fn test_parse_withMultilineText_shouldJoinLines() {
    let cues = parse_srt_string("1\n00:00:01,000 --> 00:00:02,000\nHello\nWorld\n");
    assert_eq!(cues[0].text, "Hello World");
}

/// Malformed blocks are skipped, the rest keep their order
#[test]
fn test_parse_withMalformedBlocks_shouldSkipThem() {
    let content = "1\n00:00:01,000 --> 00:00:02,000\nFirst\n\n\
                   2\n00:00:03,000 00:00:04,000\nNo arrow\n\n\
                   3\n00:00:05,000 --> 00:00:06,000\n\n\
                   4\n00:00:07.000 --> 00:00:08,000\nDot separator\n\n\
                   5\n00:00:09,000 --> 00:00:10,000\nLast\n";
    let cues = parse_srt_string(content);

    let indices: Vec<&str> = cues.iter().map(|c| c.index.as_str()).collect();
    assert_eq!(indices, vec!["1", "5"]);
    assert_eq!(cues[1].text, "Last");
}

/// Index labels are opaque and non-monotonic timings are kept as-is
#[test]
fn test_parse_withOddIndicesAndOverlaps_shouldPreserveSourceOrder() {
    let content = "intro\n00:00:05,000 --> 00:00:06,000\nA\n\n\
                   1\n00:00:02,000 --> 00:00:01,000\nB\n";
    let cues = parse_srt_string(content);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].index, "intro");
    assert_eq!(cues[1].start_time_ms, 2000);
    assert_eq!(cues[1].end_time_ms, 1000);
    assert_eq!(cues[1].nominal_duration_ms(), 0);
}

/// Empty and whitespace-only input yields no cues
#[test]
fn test_parse_withEmptyInput_shouldReturnNoCues() {
    assert!(parse_srt_string("").is_empty());
    assert!(parse_srt_string("\n\n   \n").is_empty());
}

/// Whitespace-only text is a cue without speech
#[test]
fn test_cue_hasSpeech_withWhitespaceText_shouldBeFalse() {
    assert!(!Cue::new("1", 0, 1000, "   ").has_speech());
    assert!(Cue::new("1", 0, 1000, " hi ").has_speech());
}

/// Loading a track from disk
#[test]
fn test_cue_track_fromFile_withValidFile_shouldLoadCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let track = CueTrack::from_file(&path)?;
    assert_eq!(track.len(), 3);
    assert_eq!(track.spoken_cue_count(), 3);
    assert_eq!(track.cues[1].start_time_ms, 5000);
    assert_eq!(track.source_file, path);
    Ok(())
}

/// A missing file is reported as missing input
#[test]
fn test_cue_track_fromFile_withMissingFile_shouldFail() {
    let result = CueTrack::from_file("/nonexistent/path/subtitles.srt");
    assert!(matches!(result, Err(AppError::MissingInput(_))));
}
