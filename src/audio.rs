/*!
 * Audio buffers and the silence generator.
 *
 * Samples are mono `f32` in the range [-1, 1] at a fixed sample rate.
 * WAV decoding for synthesis responses also lives here so every adapter
 * produces buffers the same way.
 */

use std::io::Read;

use crate::errors::SynthesisError;

/// Append-only mono sample buffer
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create an empty buffer at the given rate
    pub fn empty(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    pub fn from_samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in milliseconds, rounded down
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.samples.len() as u64 * 1000 / self.sample_rate as u64
    }

    /// Append another buffer recorded at the same rate
    ///
    /// Callers are responsible for rate agreement; the assembler checks it
    /// before appending synthesized audio.
    pub fn append(&mut self, other: &AudioBuffer) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Take the accumulated samples, leaving this buffer empty
    pub fn take(&mut self) -> AudioBuffer {
        AudioBuffer {
            samples: std::mem::take(&mut self.samples),
            sample_rate: self.sample_rate,
        }
    }

    /// Samples converted to 16-bit PCM, clamped to full scale
    pub fn to_pcm16(&self) -> impl Iterator<Item = i16> + '_ {
        self.samples
            .iter()
            .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
    }
}

/// Zero-amplitude buffer of `duration_ms` at `sample_rate`
///
/// Non-positive durations give an empty buffer; contiguous and overlapping
/// cues hit this case all the time.
pub fn silence(duration_ms: i64, sample_rate: u32) -> AudioBuffer {
    if duration_ms <= 0 {
        return AudioBuffer::empty(sample_rate);
    }

    // round(duration_ms * rate / 1000) in integer arithmetic
    let count = (duration_ms as u64 * sample_rate as u64 + 500) / 1000;
    AudioBuffer::from_samples(vec![0.0; count as usize], sample_rate)
}

/// Decode a WAV stream into a mono buffer
///
/// Stereo input is averaged down to mono. No resampling happens here.
pub fn decode_wav<R: Read>(reader: R) -> Result<AudioBuffer, SynthesisError> {
    let wav_reader = hound::WavReader::new(reader)
        .map_err(|e| SynthesisError::InvalidAudio(format!("Failed to parse WAV data: {}", e)))?;

    let spec = wav_reader.spec();
    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => wav_reader
            .into_samples::<i16>()
            .map(|s| s.map(|v| v as f32 / 32768.0))
            .collect::<Result<Vec<_>, _>>(),
        (hound::SampleFormat::Int, 24) => wav_reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 8_388_608.0))
            .collect::<Result<Vec<_>, _>>(),
        (hound::SampleFormat::Int, 32) => wav_reader
            .into_samples::<i32>()
            .map(|s| s.map(|v| v as f32 / 2_147_483_648.0))
            .collect::<Result<Vec<_>, _>>(),
        (hound::SampleFormat::Float, 32) => wav_reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>(),
        (format, bits) => {
            return Err(SynthesisError::InvalidAudio(format!(
                "Unsupported WAV format: {:?} {}bit",
                format, bits
            )));
        }
    }
    .map_err(|e| SynthesisError::InvalidAudio(format!("Failed to read WAV samples: {}", e)))?;

    let mono = match spec.channels {
        1 => samples,
        channels => samples
            .chunks(channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect(),
    };

    Ok(AudioBuffer::from_samples(mono, spec.sample_rate))
}
