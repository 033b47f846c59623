//! PCM buffer ownership and hand-off to the active sink

use super::format::{AudioFormat, PCM_FORMAT};
use super::sink::OutputSink;
use crate::speech::EngineOutput;
use crate::{Result, SpeakpadError};
use log::{debug, info};
use std::time::Duration;

/// Synthesized speech in [`PCM_FORMAT`], owned by the playback side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    data: Box<[u8]>,
}

impl PcmBuffer {
    /// Copy an engine result into playback-owned storage, then free it
    ///
    /// The engine output is freed exactly once, after the copy, whether or not
    /// the bytes turn out to be usable.
    pub fn copy_from(output: Box<dyn EngineOutput>) -> Result<Self> {
        let copied = match output.bytes() {
            Some(bytes) => Self::from_bytes(bytes),
            None => Err(SpeakpadError::SynthesisFailed(
                "engine returned no audio buffer".to_string(),
            )),
        };
        output.free();
        copied
    }

    /// Copy raw bytes, rejecting empty or misaligned input
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(SpeakpadError::SynthesisFailed(
                "engine returned an empty audio buffer".to_string(),
            ));
        }
        if !PCM_FORMAT.is_frame_aligned(bytes.len()) {
            return Err(SpeakpadError::SynthesisFailed(format!(
                "audio buffer of {} bytes is not 16-bit aligned",
                bytes.len()
            )));
        }
        Ok(Self { data: bytes.into() })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes, always positive
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn format(&self) -> AudioFormat {
        PCM_FORMAT
    }

    pub fn duration(&self) -> Duration {
        PCM_FORMAT.duration_of(self.len())
    }
}

/// Refers to one installed buffer generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHandle {
    generation: u64,
    len: usize,
}

impl BufferHandle {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Owns the current PCM buffer and the active output sink
///
/// Both are mutated only through [`replace`](Self::replace) and
/// [`swap_sink`](Self::swap_sink). At most one buffer and one sink exist at a
/// time.
#[derive(Default)]
pub struct PlaybackBufferManager {
    current: Option<PcmBuffer>,
    generation: u64,
    sink: Option<Box<dyn OutputSink>>,
}

impl PlaybackBufferManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release the previous buffer and install `buffer`, ready to read from 0
    pub fn replace(&mut self, buffer: PcmBuffer) -> BufferHandle {
        if let Some(sink) = self.sink.as_mut() {
            sink.release();
        }
        if let Some(old) = self.current.take() {
            debug!("Released previous audio buffer ({} bytes)", old.len());
        }

        self.generation += 1;
        let handle = BufferHandle {
            generation: self.generation,
            len: buffer.len(),
        };
        self.current = Some(buffer);
        debug!(
            "Installed audio buffer #{} ({} bytes)",
            handle.generation, handle.len
        );
        handle
    }

    /// Start streaming the buffer behind `handle` through the active sink
    ///
    /// Returns as soon as the sink has started; playback finishes on its own.
    pub fn play(&mut self, handle: &BufferHandle) -> Result<()> {
        let buffer = match &self.current {
            Some(buffer) if handle.generation == self.generation => buffer,
            _ => return Err(SpeakpadError::StaleBuffer),
        };
        let sink = self.sink.as_mut().ok_or_else(|| {
            SpeakpadError::DeviceUnavailable("no output device is selected".to_string())
        })?;

        sink.start(buffer)?;
        debug!(
            "Playback started: {} bytes, ~{:.1}s",
            buffer.len(),
            buffer.duration().as_secs_f32()
        );
        Ok(())
    }

    /// Destroy the active sink and construct a new one against [`PCM_FORMAT`]
    ///
    /// Playback on the old sink is abandoned. If `open` fails no sink is
    /// active until the next successful swap.
    pub fn swap_sink<F>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce(AudioFormat) -> Result<Box<dyn OutputSink>>,
    {
        if let Some(old) = self.sink.take() {
            drop(old);
            debug!("Previous output sink destroyed");
        }

        let sink = open(PCM_FORMAT)?;
        if sink.format() != PCM_FORMAT {
            return Err(SpeakpadError::DeviceUnavailable(format!(
                "sink was built for {:?}, expected {:?}",
                sink.format(),
                PCM_FORMAT
            )));
        }

        self.sink = Some(sink);
        info!("Output sink installed");
        Ok(())
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn current(&self) -> Option<&PcmBuffer> {
        self.current.as_ref()
    }
}
