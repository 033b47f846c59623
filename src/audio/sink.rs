//! Output sinks and the registry that opens them

use super::buffer::PcmBuffer;
use super::format::AudioFormat;
use crate::Result;
use std::fmt;

/// A playback destination bound to one [`AudioFormat`]
///
/// Dropping the sink destroys it; whatever it was playing is abandoned.
pub trait OutputSink: Send {
    /// Format this sink was constructed against
    fn format(&self) -> AudioFormat;

    /// Start draining `pcm` from offset 0 and return without waiting for it
    /// to finish. Replaces anything the sink was already playing.
    fn start(&mut self, pcm: &PcmBuffer) -> Result<()>;

    /// Stop playing and drop every sample taken from the current buffer
    fn release(&mut self);
}

/// An output device as listed by the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceHandle {
    pub name: String,
    /// Whether this is the system default output
    pub is_default: bool,
}

impl DeviceHandle {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_default: false,
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default {
            write!(f, "{} (default)", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Enumerates output devices and opens sinks on them
pub trait OutputDeviceRegistry: Send + Sync {
    fn list_output_devices(&self) -> Result<Vec<DeviceHandle>>;

    /// The device used when nothing has been selected
    fn default_device(&self) -> Option<DeviceHandle>;

    /// Construct a sink for `device` bound to `format`
    fn open_sink(&self, device: &DeviceHandle, format: AudioFormat) -> Result<Box<dyn OutputSink>>;
}
