use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::{AppError, ExportError, SynthesisError};
use crate::exporter::ChunkExporter;
use crate::file_utils::FileManager;
use crate::providers::{self, Synthesizer};
use crate::subtitle_processor::CueTrack;
use crate::timeline::{AssemblerOptions, AssemblySummary, CancellationFlag, TimelineAssembler};

// @module: Application controller for subtitle narration

/// Result of narrating one subtitle file
#[derive(Debug, Clone)]
pub struct RunReport {
    pub input_file: PathBuf,
    /// Exported parts in part-number order
    pub output_files: Vec<PathBuf>,
    pub summary: AssemblySummary,
    pub elapsed: Duration,
}

/// Main application controller for subtitle narration
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Engine built once and reused for every cue and file
    synthesizer: Box<dyn Synthesizer>,
    // @field: Set from outside (Ctrl-C) to stop between cues
    cancellation: CancellationFlag,
    // @field: Draw progress bars
    show_progress: bool,
}

impl Controller {
    /// Create a controller with the engine described by the configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let synthesizer = providers::from_config(&config.synthesis);
        Self::with_synthesizer(config, synthesizer)
    }

    /// Create a controller around an already constructed engine
    pub fn with_synthesizer(config: Config, synthesizer: Box<dyn Synthesizer>) -> Result<Self, AppError> {
        config.validate().map_err(|e| AppError::Config(e.to_string()))?;

        if synthesizer.sample_rate() != config.synthesis.sample_rate {
            return Err(AppError::Config(format!(
                "Engine produces {} Hz but configuration expects {} Hz",
                synthesizer.sample_rate(),
                config.synthesis.sample_rate
            )));
        }

        Ok(Self {
            config,
            synthesizer,
            cancellation: CancellationFlag::new(),
            show_progress: true,
        })
    }

    /// Disable progress bars (tests, non-interactive runs)
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Flag that stops the current run between cues when set
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Check that the synthesis engine is reachable
    pub async fn test_connection(&self) -> Result<(), SynthesisError> {
        self.synthesizer.test_connection().await
    }

    /// Narrate one subtitle file into `output_dir`
    ///
    /// The input is checked before the output directory is touched.
    pub async fn run(&self, input_file: &Path, output_dir: &Path) -> Result<RunReport, AppError> {
        let multi_progress = MultiProgress::new();
        self.run_with_progress(input_file, output_dir, &multi_progress).await
    }

    async fn run_with_progress(&self, input_file: &Path, output_dir: &Path, multi_progress: &MultiProgress) -> Result<RunReport, AppError> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(AppError::MissingInput(input_file.to_path_buf()));
        }

        let track = CueTrack::from_file(input_file)?;
        info!("Loaded {} cue(s) from {:?} ({} with text)", track.len(), input_file, track.spoken_cue_count());

        FileManager::ensure_dir(output_dir).map_err(|source| ExportError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;

        if track.is_empty() {
            warn!("No cues found in {:?}, nothing to narrate", input_file);
        }

        let progress_bar = self.cue_progress_bar(track.len() as u64, multi_progress);
        let assembler = TimelineAssembler::new(self.synthesizer.as_ref(), AssemblerOptions::from_config(&self.config))
            .with_cancellation(self.cancellation.clone())
            .with_progress(progress_bar.clone());

        let mut exporter = ChunkExporter::new(output_dir);
        let result = assembler
            .assemble(&track.cues, &self.config.voice, |chunk| {
                progress_bar.set_message(format!("part {}", chunk.part_number));
                exporter.export(&chunk.buffer, chunk.part_number)?;
                Ok(())
            })
            .await;

        progress_bar.finish_and_clear();
        let summary = result?;

        if summary.cues_substituted > 0 {
            warn!("{} cue(s) were replaced by silence after synthesis failed", summary.cues_substituted);
        }

        let elapsed = start_time.elapsed();
        info!(
            "Narration complete: {} part(s) in {}",
            exporter.exported().len(),
            Self::format_duration(elapsed)
        );

        Ok(RunReport {
            input_file: input_file.to_path_buf(),
            output_files: exporter.exported().to_vec(),
            summary,
            elapsed,
        })
    }

    /// Narrate every `.srt` file under `input_dir`
    ///
    /// Each file gets its own timeline and an output subdirectory mirroring
    /// its path under `input_dir` (`s1/ep.srt` -> `output_dir/s1/ep/`). A
    /// failing file is logged and skipped; cancellation stops the whole folder.
    pub async fn run_folder(&self, input_dir: &Path, output_dir: &Path) -> Result<Vec<RunReport>, AppError> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(AppError::MissingInput(input_dir.to_path_buf()));
        }

        let subtitle_files = FileManager::find_files(input_dir, "srt")?;
        if subtitle_files.is_empty() {
            warn!("No subtitle files found in directory: {:?}", input_dir);
            return Ok(Vec::new());
        }

        let multi_progress = MultiProgress::new();
        let folder_pb = if self.show_progress {
            let bar = multi_progress.add(ProgressBar::new(subtitle_files.len() as u64));
            bar.set_style(Self::bar_style("files"));
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut reports = Vec::new();
        let mut error_count = 0;
        let mut claimed_dirs = HashSet::new();

        for subtitle_file in &subtitle_files {
            let stem = subtitle_file.file_stem().unwrap_or_default().to_string_lossy().to_string();
            folder_pb.set_message(format!("Processing: {}", stem));

            let file_output_dir = FileManager::mirrored_output_dir(input_dir, subtitle_file, output_dir);
            // ep.srt and ep.SRT in one folder would share a directory
            if !claimed_dirs.insert(file_output_dir.clone()) {
                error!(
                    "Skipping {:?}: output directory {:?} is already used by another file",
                    subtitle_file, file_output_dir
                );
                error_count += 1;
                folder_pb.inc(1);
                continue;
            }

            match self.run_with_progress(subtitle_file, &file_output_dir, &multi_progress).await {
                Ok(report) => reports.push(report),
                Err(AppError::Cancelled) => {
                    folder_pb.abandon();
                    return Err(AppError::Cancelled);
                }
                Err(e) => {
                    error!("Error processing {:?}: {}", subtitle_file, e);
                    error_count += 1;
                }
            }
            folder_pb.inc(1);
        }

        folder_pb.finish_and_clear();
        info!(
            "Finished {} file(s), {} failed, in {}",
            reports.len(),
            error_count,
            Self::format_duration(start_time.elapsed())
        );

        Ok(reports)
    }

    fn cue_progress_bar(&self, total: u64, multi_progress: &MultiProgress) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = multi_progress.add(ProgressBar::new(total));
        bar.set_style(Self::bar_style("cues"));
        bar
    }

    fn bar_style(unit: &str) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
                unit
            ))
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░")
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
