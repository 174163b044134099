/*!
 * Tests for chunk export
 */

use anyhow::Result;
use srtvoice::audio::{silence, AudioBuffer};
use srtvoice::errors::ExportError;
use srtvoice::exporter::ChunkExporter;
use crate::common;

/// Exported parts are 16-bit mono at the buffer's rate
#[test]
fn test_export_withSpeechAndSilence_shouldWritePcm16() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut exporter = ChunkExporter::new(temp_dir.path());

    let mut buffer = silence(10, 24_000);
    buffer.append(&AudioBuffer::from_samples(vec![1.0, -0.5], 24_000));
    let path = exporter.export(&buffer, 1)?;

    assert_eq!(path, temp_dir.path().join("output_part_1.wav"));
    let (spec, samples) = common::read_wav(&path)?;
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_rate, 24_000);
    assert_eq!(samples.len(), 242);
    assert!(samples[..240].iter().all(|&s| s == 0));
    assert_eq!(samples[240], 32_767);
    assert_eq!(samples[241], -16_383);
    Ok(())
}

/// Parts may skip numbers but never go backwards
#[test]
fn test_export_withDecreasingPartNumber_shouldReject() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut exporter = ChunkExporter::new(temp_dir.path());
    let buffer = silence(5, 8_000);

    exporter.export(&buffer, 1)?;
    exporter.export(&buffer, 3)?;
    let result = exporter.export(&buffer, 2);

    assert!(matches!(result, Err(ExportError::PartOutOfOrder { part_number: 2, last: 3 })));
    assert_eq!(exporter.exported().len(), 2);
    assert_eq!(common::list_file_names(temp_dir.path())?, vec!["output_part_1.wav", "output_part_3.wav"]);
    Ok(())
}

/// Custom prefixes change the file names only
#[test]
fn test_export_withCustomPrefix_shouldUsePrefix() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut exporter = ChunkExporter::with_prefix(temp_dir.path(), "episode_");
    let path = exporter.export(&silence(5, 8_000), 1)?;
    assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("episode_1.wav"));
    Ok(())
}

/// An empty buffer still produces a valid, empty WAV
#[test]
fn test_export_withEmptyBuffer_shouldWriteHeaderOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut exporter = ChunkExporter::new(temp_dir.path());
    let path = exporter.export(&AudioBuffer::empty(16_000), 1)?;

    let (spec, samples) = common::read_wav(&path)?;
    assert_eq!(spec.sample_rate, 16_000);
    assert!(samples.is_empty());
    Ok(())
}

/// A part that cannot be moved into place fails cleanly and leaves earlier parts alone
#[test]
fn test_export_withBlockedTargetPath_shouldLeaveEarlierPartsIntact() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let mut exporter = ChunkExporter::new(temp_dir.path());

    let first = exporter.export(&AudioBuffer::from_samples(vec![0.25; 64], 8_000), 1)?;
    let before = std::fs::read(&first)?;

    // A directory under the final name makes the rename fail
    std::fs::create_dir(temp_dir.path().join("output_part_2.wav"))?;
    let result = exporter.export(&silence(5, 8_000), 2);

    assert!(matches!(result, Err(ExportError::Io { .. })));
    assert_eq!(std::fs::read(&first)?, before);
    assert_eq!(exporter.exported(), &[first.clone()][..]);
    let names = common::list_file_names(temp_dir.path())?;
    assert_eq!(names, vec!["output_part_1.wav", "output_part_2.wav"]);
    assert!(temp_dir.path().join("output_part_2.wav").is_dir());
    Ok(())
}
