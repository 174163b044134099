/*!
 * Tests for sample buffers and silence generation
 */

use srtvoice::audio::{silence, AudioBuffer};

/// Silence length follows round(ms * rate / 1000)
#[test]
fn test_silence_withPositiveDuration_shouldMatchRate() {
    assert_eq!(silence(2000, 24_000).len(), 48_000);
    assert_eq!(silence(1000, 22_050).len(), 22_050);
    assert_eq!(silence(1, 22_050).len(), 22);
    assert!(silence(500, 16_000).samples().iter().all(|&s| s == 0.0));
}

/// Zero and negative durations are empty, never an error
#[test]
fn test_silence_withNonPositiveDuration_shouldBeEmpty() {
    assert!(silence(0, 24_000).is_empty());
    assert!(silence(-1500, 24_000).is_empty());
    assert_eq!(silence(-1, 8_000).sample_rate(), 8_000);
}

/// Appending keeps samples in order
#[test]
fn test_append_withTwoBuffers_shouldConcatenate() {
    let mut buffer = AudioBuffer::empty(8_000);
    buffer.append(&silence(1, 8_000));
    buffer.append(&AudioBuffer::from_samples(vec![0.25, -0.25], 8_000));

    assert_eq!(buffer.samples(), &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.25, -0.25]);
}

/// Duration is derived from sample count and rate
#[test]
fn test_duration_ms_withKnownLength_shouldRoundDown() {
    assert_eq!(silence(1500, 24_000).duration_ms(), 1500);
    assert_eq!(AudioBuffer::from_samples(vec![0.0; 23], 24_000).duration_ms(), 0);
}

/// PCM conversion maps full scale and clamps overshoot
#[test]
fn test_to_pcm16_withFullScale_shouldMapToI16Range() {
    let buffer = AudioBuffer::from_samples(vec![1.0, -1.0, 0.0, 2.0], 24_000);
    let pcm: Vec<i16> = buffer.to_pcm16().collect();
    assert_eq!(pcm, vec![i16::MAX, -i16::MAX, 0, i16::MAX]);
}
