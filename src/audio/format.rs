//! The fixed PCM format every synthesized buffer is played under

use std::time::Duration;

/// Byte order of multi-byte samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Interpretation of sample bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    SignedInt,
    UnsignedInt,
    Float,
}

/// Describes how raw PCM bytes are laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_type: SampleType,
    pub byte_order: ByteOrder,
}

/// 16 kHz mono signed 16-bit little-endian PCM.
///
/// Engines must produce this and sinks are always built against it; there is
/// no per-request negotiation.
pub const PCM_FORMAT: AudioFormat = AudioFormat {
    sample_rate: 16_000,
    channels: 1,
    bits_per_sample: 16,
    sample_type: SampleType::SignedInt,
    byte_order: ByteOrder::LittleEndian,
};

impl AudioFormat {
    /// Bytes in one frame (one sample per channel)
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * (self.bits_per_sample as usize / 8)
    }

    /// Bytes consumed per second of playback
    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// Whether `len` bytes hold a whole number of frames
    pub fn is_frame_aligned(&self, len: usize) -> bool {
        len % self.bytes_per_frame() == 0
    }

    /// Playback time of `len` bytes in this format
    pub fn duration_of(&self, len: usize) -> Duration {
        let frames = len / self.bytes_per_frame();
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}
