/*!
 * Chunked export of assembled audio to WAV files.
 *
 * Every chunk becomes `<prefix><part>.wav` in the output directory. Files are
 * written to a temporary sibling first and renamed into place once the WAV
 * header is finalized, so a failed write never leaves a file under the final
 * name.
 */

use log::info;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::audio::AudioBuffer;
use crate::errors::ExportError;
use crate::file_utils::FileManager;

/// Default file name prefix for output parts
pub const DEFAULT_PREFIX: &str = "output_part_";

/// Writes chunks with strictly increasing part numbers
#[derive(Debug)]
pub struct ChunkExporter {
    output_dir: PathBuf,
    prefix: String,
    last_part: usize,
    exported: Vec<PathBuf>,
}

impl ChunkExporter {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self::with_prefix(output_dir, DEFAULT_PREFIX)
    }

    pub fn with_prefix<P: AsRef<Path>>(output_dir: P, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
            last_part: 0,
            exported: Vec::new(),
        }
    }

    /// Path a given part is written to
    pub fn part_path(&self, part_number: usize) -> PathBuf {
        self.output_dir.join(format!("{}{}.wav", self.prefix, part_number))
    }

    /// Files written so far, in export order
    pub fn exported(&self) -> &[PathBuf] {
        &self.exported
    }

    /// Serialize `buffer` as part `part_number`
    ///
    /// Part numbers start at 1 and must grow with every call.
    pub fn export(&mut self, buffer: &AudioBuffer, part_number: usize) -> Result<PathBuf, ExportError> {
        if part_number <= self.last_part {
            return Err(ExportError::PartOutOfOrder {
                part_number,
                last: self.last_part,
            });
        }

        let path = self.part_path(part_number);
        FileManager::ensure_dir(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        Self::write_atomically(&path, &self.output_dir, buffer)?;

        self.last_part = part_number;
        self.exported.push(path.clone());
        info!(
            "Saved: {} ({:.1}s)",
            path.display(),
            buffer.duration_ms() as f64 / 1000.0
        );

        Ok(path)
    }

    fn write_atomically(path: &Path, dir: &Path, buffer: &AudioBuffer) -> Result<(), ExportError> {
        let io_err = |source: std::io::Error| ExportError::Io {
            path: path.to_path_buf(),
            source,
        };
        let wav_err = |source: hound::Error| ExportError::Wav {
            path: path.to_path_buf(),
            source,
        };

        // Temp file is deleted on drop if anything below fails
        let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: buffer.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        {
            let mut writer = hound::WavWriter::new(BufWriter::new(temp.as_file_mut()), spec)
                .map_err(wav_err)?;
            for sample in buffer.to_pcm16() {
                writer.write_sample(sample).map_err(wav_err)?;
            }
            writer.finalize().map_err(wav_err)?;
        }

        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;

        Ok(())
    }
}
