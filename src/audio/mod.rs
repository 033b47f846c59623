//! Audio playback: the fixed PCM format, buffer ownership, and output sinks

pub mod buffer;
pub mod convert;
pub mod cpal_sink;
pub mod format;
pub mod sink;

pub use buffer::{BufferHandle, PcmBuffer, PlaybackBufferManager};
pub use cpal_sink::{CpalRegistry, CpalSink};
pub use format::{AudioFormat, PCM_FORMAT};
pub use sink::{DeviceHandle, OutputDeviceRegistry, OutputSink};
