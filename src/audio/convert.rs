//! Sample conversion between the fixed PCM format and device formats
//! Resamples with rubato when the rates differ

use super::format::PCM_FORMAT;
use crate::{Result, SpeakpadError};
use hound::WavReader;
use rubato::{FftFixedIn, Resampler};
use std::io::Cursor;

/// Full scale of a signed 16-bit sample
const I16_SCALE: f32 = 32768.0;

/// s16le bytes to normalized f32 samples
pub fn pcm_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / I16_SCALE
        })
        .collect()
}

/// Normalized f32 samples to s16le bytes, clamping out-of-range values
pub fn f32_to_pcm(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * I16_SCALE)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Resample a mono signal from `source_rate` to `target_rate`
///
/// The output is aligned with the input: the resampler's delay is trimmed
/// from the front and its buffered tail is flushed with zero padding, so the
/// result holds `len * target_rate / source_rate` samples of the whole signal.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let chunk_size = 1024;
    let mut resampler =
        FftFixedIn::<f32>::new(source_rate as usize, target_rate as usize, chunk_size, 2, 1)
            .map_err(|e| SpeakpadError::Other(format!("Failed to create resampler: {:?}", e)))?;

    let delay = resampler.output_delay();
    let expected = (samples.len() as u64 * target_rate as u64 / source_rate as u64) as usize;
    let wanted = delay + expected;

    let mut output = Vec::with_capacity(wanted + chunk_size);
    let mut pos = 0;

    // Past the end of the input this keeps feeding silence until the delayed
    // tail has come out
    while output.len() < wanted {
        let frames_needed = resampler.input_frames_next();
        let end = (pos + frames_needed).min(samples.len());

        let mut input_chunk = samples[pos..end].to_vec();
        input_chunk.resize(frames_needed, 0.0);

        let input = vec![input_chunk];
        let resampled = resampler
            .process(&input, None)
            .map_err(|e| SpeakpadError::Other(format!("Resampling failed: {:?}", e)))?;
        if let Some(chunk) = resampled.into_iter().next() {
            output.extend(chunk);
        }

        pos = end;
    }

    output.drain(..delay);
    output.truncate(expected);

    Ok(output)
}

/// Duplicate each mono sample across `channels` interleaved channels
pub fn expand_to_channels(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let mut output = Vec::with_capacity(samples.len() * channels);
    for &sample in samples {
        for _ in 0..channels {
            output.push(sample);
        }
    }
    output
}

/// Decode a 16-bit integer WAV into [`PCM_FORMAT`] bytes
///
/// Multi-channel audio is mixed down to mono and resampled to 16 kHz.
/// Streamed WAVs often carry a placeholder data length, so reading stops at
/// the first short read instead of failing.
pub fn wav_to_pcm(wav: &[u8]) -> Result<Vec<u8>> {
    let mut reader = WavReader::new(Cursor::new(wav))
        .map_err(|e| SpeakpadError::SynthesisFailed(format!("invalid WAV audio: {}", e)))?;

    let spec = reader.spec();
    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(SpeakpadError::SynthesisFailed(format!(
            "unsupported WAV sample format: {:?} {}-bit",
            spec.sample_format, spec.bits_per_sample
        )));
    }

    let channels = spec.channels.max(1) as usize;
    let samples: Vec<i16> = reader.samples::<i16>().map_while(|s| s.ok()).collect();
    let mono: Vec<f32> = samples
        .chunks(channels)
        .map(|frame| {
            let sum: f32 = frame.iter().map(|&s| s as f32 / I16_SCALE).sum();
            sum / frame.len() as f32
        })
        .collect();

    let resampled = resample(&mono, spec.sample_rate, PCM_FORMAT.sample_rate)?;
    Ok(f32_to_pcm(&resampled))
}
