/*!
 * Tests for file utilities
 */

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use srtvoice::file_utils::FileManager;
use crate::common;

/// Test file and directory existence checks
#[test]
fn test_exists_withFileAndDir_shouldDistinguish() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let file = common::create_test_file(temp_dir.path(), "a.srt", "x")?;

    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::dir_exists(&file));
    assert!(FileManager::dir_exists(temp_dir.path()));
    assert!(!FileManager::file_exists(temp_dir.path()));
    Ok(())
}

/// Test nested directory creation
#[test]
fn test_ensure_dir_withNestedPath_shouldCreateAll() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("a").join("b").join("c");

    FileManager::ensure_dir(&nested)?;
    assert!(nested.is_dir());

    // Second call is a no-op
    FileManager::ensure_dir(&nested)?;
    Ok(())
}

/// Test recursive search by extension
#[test]
fn test_find_files_withMixedExtensions_shouldReturnSortedMatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let sub = temp_dir.path().join("season1");
    fs::create_dir_all(&sub)?;

    common::create_test_file(temp_dir.path(), "b.srt", "")?;
    common::create_test_file(temp_dir.path(), "a.SRT", "")?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    common::create_test_file(&sub, "c.srt", "")?;

    let found = FileManager::find_files(temp_dir.path(), ".srt")?;
    let names: Vec<String> = found
        .iter()
        .map(|p| p.strip_prefix(temp_dir.path()).unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["a.SRT", "b.srt", "season1/c.srt"]);
    Ok(())
}

/// Test default output directory naming
#[test]
fn test_default_output_dir_withBareFileName_shouldUseCurrentDir() {
    assert_eq!(FileManager::default_output_dir("talk.srt"), PathBuf::from("talk_audio"));
}
