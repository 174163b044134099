/*!
 * Timeline assembly.
 *
 * Walks cues in source order and builds one continuous audio track: for each
 * cue the silence since the previous cue's end is emitted first, then the
 * synthesized speech (if the cue has text). Every `chunk_size` cues the running
 * buffer is handed to the caller and reset.
 *
 * The cursor follows declared end times, not the length of the generated
 * speech. Long speech therefore makes the track run behind the subtitle
 * timing for the rest of the file. `TimingMode::DriftCorrected` keeps the
 * cursor from ever falling behind the audio already emitted instead.
 */

use indicatif::ProgressBar;
use log::{debug, warn};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, FailurePolicy, TimingMode};
use crate::audio::{silence, AudioBuffer};
use crate::errors::{AppError, SynthesisError};
use crate::providers::{ensure_sample_rate, Synthesizer};
use crate::subtitle_processor::Cue;

// @const: Upper bound for a single retry wait
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(300);

/// Shared flag checked between cues
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tuning for one assembly run
#[derive(Debug, Clone)]
pub struct AssemblerOptions {
    /// Cues per emitted chunk, at least 1
    pub chunk_size: usize,
    /// Rate of every buffer in the timeline
    pub sample_rate: u32,
    /// Upper bound for a single synthesis call
    pub timeout: Option<Duration>,
    /// Additional attempts after a failed call
    pub retry_count: u32,
    /// Base backoff, doubled on each retry
    pub retry_backoff: Duration,
    pub on_failure: FailurePolicy,
    pub timing_mode: TimingMode,
}

impl AssemblerOptions {
    pub fn from_config(config: &Config) -> Self {
        let synthesis = &config.synthesis;
        Self {
            chunk_size: config.chunk_size,
            sample_rate: synthesis.sample_rate,
            timeout: (synthesis.timeout_secs > 0).then(|| Duration::from_secs(synthesis.timeout_secs)),
            retry_count: synthesis.retry_count,
            retry_backoff: Duration::from_millis(synthesis.retry_backoff_ms),
            on_failure: synthesis.on_failure,
            timing_mode: config.timing_mode,
        }
    }
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A run of consecutive cues ready for export
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// 1-based, strictly increasing
    pub part_number: usize,
    pub buffer: AudioBuffer,
    /// Positions (not index labels) of the cues this chunk covers
    pub cues: Range<usize>,
}

impl AudioChunk {
    pub fn cue_count(&self) -> usize {
        self.cues.len()
    }
}

/// Counters reported once the timeline is done
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblySummary {
    pub cues_processed: usize,
    pub cues_synthesized: usize,
    /// Cues whose speech was replaced by silence after synthesis failed
    pub cues_substituted: usize,
    pub chunks_emitted: usize,
    pub total_samples: u64,
}

/// Wait before retry number `attempt` (0-based): `base * 2^attempt`, capped
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base.checked_mul(2u32.saturating_pow(attempt.min(16)))
        .unwrap_or(MAX_RETRY_BACKOFF)
        .min(MAX_RETRY_BACKOFF)
}

/// Silence to insert before a cue, clamped at zero
pub fn gap_ms(start_time_ms: u64, previous_end_ms: u64) -> i64 {
    (start_time_ms as i64 - previous_end_ms as i64).max(0)
}

/// Builds the audio timeline from cues and a synthesis engine
pub struct TimelineAssembler<'a> {
    synthesizer: &'a dyn Synthesizer,
    options: AssemblerOptions,
    cancellation: CancellationFlag,
    progress: Option<ProgressBar>,
}

impl<'a> TimelineAssembler<'a> {
    pub fn new(synthesizer: &'a dyn Synthesizer, options: AssemblerOptions) -> Self {
        Self {
            synthesizer,
            options,
            cancellation: CancellationFlag::new(),
            progress: None,
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Advance `progress` once per processed cue
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn options(&self) -> &AssemblerOptions {
        &self.options
    }

    /// Assemble `cues` and hand every finished chunk to `on_chunk_ready`
    ///
    /// Chunk `k` (1-based) holds exactly the cues at positions
    /// `[(k-1)*chunk_size, k*chunk_size)`; a final, possibly smaller chunk is
    /// emitted if audio remains. Cancellation is checked before every cue and
    /// drops the partial chunk.
    pub async fn assemble<F>(&self, cues: &[Cue], voice: &str, mut on_chunk_ready: F) -> Result<AssemblySummary, AppError>
    where
        F: FnMut(AudioChunk) -> Result<(), AppError>,
    {
        if self.options.chunk_size == 0 {
            return Err(AppError::Config("Chunk size must be at least 1 cue".to_string()));
        }
        if self.options.sample_rate == 0 {
            return Err(AppError::Config("Sample rate must be greater than zero".to_string()));
        }

        let sample_rate = self.options.sample_rate;
        let mut summary = AssemblySummary::default();
        let mut running = AudioBuffer::empty(sample_rate);
        let mut previous_end_ms: u64 = 0;
        let mut part_number = 1;
        let mut chunk_start = 0;

        for (position, cue) in cues.iter().enumerate() {
            if self.cancellation.is_cancelled() {
                warn!("Cancelled before cue {}, dropping {} unexported cue(s)", cue.index, position - chunk_start);
                return Err(AppError::Cancelled);
            }

            let cursor_ms = match self.options.timing_mode {
                TimingMode::Nominal => previous_end_ms,
                TimingMode::DriftCorrected => previous_end_ms.max(summary.total_samples * 1000 / sample_rate as u64),
            };

            let gap = gap_ms(cue.start_time_ms, cursor_ms);
            let gap_audio = silence(gap, sample_rate);
            summary.total_samples += gap_audio.len() as u64;
            running.append(&gap_audio);

            if cue.has_speech() {
                let speech = match self.synthesize_with_retry(cue, voice).await {
                    Ok(speech) => {
                        summary.cues_synthesized += 1;
                        speech
                    }
                    Err(source) => match self.options.on_failure {
                        FailurePolicy::Abort => {
                            return Err(AppError::Synthesis {
                                cue_index: cue.index.clone(),
                                source,
                            });
                        }
                        FailurePolicy::Silence => {
                            warn!("Synthesis failed for cue {}, substituting silence: {}", cue.index, source);
                            summary.cues_substituted += 1;
                            silence(cue.nominal_duration_ms() as i64, sample_rate)
                        }
                    },
                };
                summary.total_samples += speech.len() as u64;
                running.append(&speech);
            }

            debug!("Cue {}: {} ms gap, cursor {} ms -> {} ms", cue.index, gap, cursor_ms, cue.end_time_ms);
            previous_end_ms = cue.end_time_ms;
            summary.cues_processed += 1;

            if let Some(progress) = &self.progress {
                progress.inc(1);
            }

            if (position + 1) % self.options.chunk_size == 0 {
                on_chunk_ready(AudioChunk {
                    part_number,
                    buffer: running.take(),
                    cues: chunk_start..position + 1,
                })?;
                summary.chunks_emitted += 1;
                part_number += 1;
                chunk_start = position + 1;
            }
        }

        if !running.is_empty() {
            // Cancelled during the last cue: the tail is a partial chunk
            if self.cancellation.is_cancelled() {
                warn!("Cancelled after the last cue, dropping {} unexported cue(s)", cues.len() - chunk_start);
                return Err(AppError::Cancelled);
            }
            on_chunk_ready(AudioChunk {
                part_number,
                buffer: running.take(),
                cues: chunk_start..cues.len(),
            })?;
            summary.chunks_emitted += 1;
        }

        Ok(summary)
    }

    async fn synthesize_with_retry(&self, cue: &Cue, voice: &str) -> Result<AudioBuffer, SynthesisError> {
        let mut attempt: u32 = 0;
        loop {
            match self.synthesize_once(&cue.text, voice).await {
                Ok(buffer) => return Ok(buffer),
                Err(e) if attempt < self.options.retry_count => {
                    let backoff = retry_delay(self.options.retry_backoff, attempt);
                    warn!(
                        "Synthesis attempt {}/{} for cue {} failed: {}. Retrying in {:?}",
                        attempt + 1,
                        self.options.retry_count + 1,
                        cue.index,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn synthesize_once(&self, text: &str, voice: &str) -> Result<AudioBuffer, SynthesisError> {
        let call = self.synthesizer.synthesize(text, voice);
        let buffer = match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SynthesisError::Timeout(limit))??,
            None => call.await?,
        };
        ensure_sample_rate(&buffer, self.options.sample_rate)?;
        Ok(buffer)
    }
}
