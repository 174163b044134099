/*!
 * Integration tests from parsed cues to exported chunks
 */

use anyhow::Result;
use std::time::Duration;

use srtvoice::app_config::{FailurePolicy, TimingMode};
use srtvoice::errors::{AppError, SynthesisError};
use srtvoice::exporter::ChunkExporter;
use srtvoice::providers::mock::{MockSynthesizer, MOCK_AMPLITUDE};
use srtvoice::subtitle_processor::{parse_srt_string, Cue};
use srtvoice::timeline::{AssemblerOptions, AudioChunk, CancellationFlag, TimelineAssembler};
use crate::common;

fn options(chunk_size: usize) -> AssemblerOptions {
    AssemblerOptions {
        chunk_size,
        sample_rate: 24_000,
        timeout: None,
        retry_count: 0,
        retry_backoff: Duration::from_millis(1),
        on_failure: FailurePolicy::Abort,
        timing_mode: TimingMode::Nominal,
    }
}

async fn collect_chunks(assembler: &TimelineAssembler<'_>, cues: &[Cue]) -> Result<Vec<AudioChunk>, AppError> {
    let mut chunks = Vec::new();
    assembler
        .assemble(cues, "v2/en_speaker_6", |chunk| {
            chunks.push(chunk);
            Ok(())
        })
        .await?;
    Ok(chunks)
}

/// 250 cues at 100 per chunk give three parts of 100, 100 and 50 cues
#[tokio::test]
async fn test_assemble_with250Cues_shouldEmitThreeChunks() -> Result<()> {
    let cues = parse_srt_string(&common::generate_srt(250));
    assert_eq!(cues.len(), 250);

    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(100));
    let chunks = collect_chunks(&assembler, &cues).await?;

    let parts: Vec<usize> = chunks.iter().map(|c| c.part_number).collect();
    let counts: Vec<usize> = chunks.iter().map(|c| c.cue_count()).collect();
    assert_eq!(parts, vec![1, 2, 3]);
    assert_eq!(counts, vec![100, 100, 50]);
    assert_eq!(chunks[2].cues, 200..250);
    assert_eq!(synth.call_count(), 250);
    Ok(())
}

/// Exact multiples of the chunk size produce no trailing empty part
#[tokio::test]
async fn test_assemble_withExactMultiple_shouldNotEmitEmptyTail() -> Result<()> {
    let cues = parse_srt_string(&common::generate_srt(20));
    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(10));

    let chunks = collect_chunks(&assembler, &cues).await?;
    assert_eq!(chunks.len(), 2);
    assert!(chunks.iter().all(|c| !c.buffer.is_empty()));
    Ok(())
}

/// Two cues: speech at 0 ms, then a 2 s pause before an empty cue
#[tokio::test]
async fn test_assemble_withSpeechThenEmptyCue_shouldInsertPause() -> Result<()> {
    let cues = vec![Cue::new("1", 0, 1000, "hi"), Cue::new("2", 3000, 4000, "")];

    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(100));
    let chunks = collect_chunks(&assembler, &cues).await?;

    assert_eq!(chunks.len(), 1);
    let samples = chunks[0].buffer.samples();
    let speech = MockSynthesizer::expected_len("hi");
    assert_eq!(samples.len(), speech + 48_000);
    assert!(samples[..speech].iter().all(|&s| s == MOCK_AMPLITUDE));
    assert!(samples[speech..].iter().all(|&s| s == 0.0));
    assert_eq!(synth.calls(), vec![("hi".to_string(), "v2/en_speaker_6".to_string())]);
    Ok(())
}

/// A file of silent cues still produces audio, without calling the engine
#[tokio::test]
async fn test_assemble_withOnlySilentCues_shouldNotCallEngine() -> Result<()> {
    let cues = vec![Cue::new("1", 1000, 2000, ""), Cue::new("2", 2500, 3000, "   ")];
    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(100));

    let chunks = collect_chunks(&assembler, &cues).await?;
    assert_eq!(synth.call_count(), 0);
    assert_eq!(chunks[0].buffer.len(), 24_000 + 12_000);
    Ok(())
}

/// Overlapping cues get no gap at all
#[tokio::test]
async fn test_assemble_withOverlap_shouldClampGapToZero() -> Result<()> {
    let cues = vec![Cue::new("1", 0, 2000, "a"), Cue::new("2", 1500, 2500, "b")];
    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(100));

    let chunks = collect_chunks(&assembler, &cues).await?;
    assert_eq!(chunks[0].buffer.len(), 2 * MockSynthesizer::expected_len("a"));
    Ok(())
}

/// Empty input produces no chunks
#[tokio::test]
async fn test_assemble_withNoCues_shouldEmitNothing() -> Result<()> {
    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(100));
    let summary = assembler.assemble(&[], "v", |_| Ok(())).await?;
    assert_eq!(summary.chunks_emitted, 0);
    assert_eq!(summary.cues_processed, 0);
    Ok(())
}

/// Retries recover from intermittent failures
#[tokio::test]
async fn test_assemble_withRetries_shouldRecoverFromIntermittentFailures() -> Result<()> {
    let cues = parse_srt_string(&common::generate_srt(6));
    let synth = MockSynthesizer::intermittent(2);
    let mut opts = options(100);
    opts.retry_count = 1;

    let assembler = TimelineAssembler::new(&synth, opts);
    let mut chunks = Vec::new();
    let summary = assembler
        .assemble(&cues, "v", |chunk| {
            chunks.push(chunk);
            Ok(())
        })
        .await?;
    assert_eq!(summary.cues_synthesized, 6);
    assert_eq!(summary.cues_substituted, 0);
    assert_eq!(chunks.len(), 1);
    // Every second call fails: 6 successes need 11 calls
    assert_eq!(synth.call_count(), 11);
    Ok(())
}

/// Without retries the first failure aborts and nothing is emitted
#[tokio::test]
async fn test_assemble_withFailingEngine_shouldAbortWithCueIndex() {
    let cues = parse_srt_string(&common::generate_srt(3));
    let synth = MockSynthesizer::failing();
    let assembler = TimelineAssembler::new(&synth, options(1));

    let mut emitted = 0;
    let result = assembler
        .assemble(&cues, "v", |_| {
            emitted += 1;
            Ok(())
        })
        .await;

    match result {
        Err(AppError::Synthesis { cue_index, source }) => {
            assert_eq!(cue_index, "1");
            assert!(matches!(source, SynthesisError::ApiError { status_code: 500, .. }));
        }
        other => panic!("expected synthesis error, got {:?}", other),
    }
    assert_eq!(emitted, 0);
}

/// The silence policy replaces failed speech with the cue's own duration
#[tokio::test]
async fn test_assemble_withSilencePolicy_shouldSubstituteNominalDuration() -> Result<()> {
    let cues = vec![Cue::new("1", 0, 1500, "unlucky"), Cue::new("2", 2000, 2500, "also")];
    let synth = MockSynthesizer::failing();
    let mut opts = options(100);
    opts.on_failure = FailurePolicy::Silence;

    let assembler = TimelineAssembler::new(&synth, opts);
    let mut len = 0;
    let summary = assembler
        .assemble(&cues, "v", |chunk| {
            len = chunk.buffer.len();
            Ok(())
        })
        .await?;

    assert_eq!(summary.cues_substituted, 2);
    assert_eq!(summary.cues_synthesized, 0);
    // 1500 ms + 500 ms gap + 500 ms
    assert_eq!(len, 36_000 + 12_000 + 12_000);
    Ok(())
}

/// A slow engine trips the per-call timeout
#[tokio::test]
async fn test_assemble_withSlowEngine_shouldTimeOut() {
    let synth = MockSynthesizer::slow(2_000);
    let mut opts = options(100);
    opts.timeout = Some(Duration::from_millis(50));

    let assembler = TimelineAssembler::new(&synth, opts);
    let result = assembler.assemble(&[Cue::new("4", 0, 1000, "slow")], "v", |_| Ok(())).await;

    match result {
        Err(AppError::Synthesis { cue_index, source: SynthesisError::Timeout(limit) }) => {
            assert_eq!(cue_index, "4");
            assert_eq!(limit, Duration::from_millis(50));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

/// Cancelling mid-run keeps the finished parts and drops the partial one
#[tokio::test]
async fn test_assemble_withCancelAfterFirstChunk_shouldStopBetweenCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let cues = parse_srt_string(&common::generate_srt(25));
    let synth = MockSynthesizer::working();
    let flag = CancellationFlag::new();

    let assembler = TimelineAssembler::new(&synth, options(10)).with_cancellation(flag.clone());
    let mut exporter = ChunkExporter::new(temp_dir.path());

    let result = assembler
        .assemble(&cues, "v", |chunk| {
            exporter.export(&chunk.buffer, chunk.part_number)?;
            flag.cancel();
            Ok(())
        })
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(common::list_file_names(temp_dir.path())?, vec!["output_part_1.wav"]);
    assert_eq!(synth.call_count(), 10);
    Ok(())
}

/// Export failures stop the run with the export error
#[tokio::test]
async fn test_assemble_withFailingExport_shouldPropagate() {
    let cues = parse_srt_string(&common::generate_srt(2));
    let synth = MockSynthesizer::working();
    let assembler = TimelineAssembler::new(&synth, options(1));

    let result = assembler
        .assemble(&cues, "v", |chunk| {
            Err(srtvoice::errors::ExportError::PartOutOfOrder {
                part_number: chunk.part_number,
                last: chunk.part_number,
            }
            .into())
        })
        .await;

    assert!(matches!(result, Err(AppError::Export(_))));
    assert_eq!(synth.call_count(), 1);
}
