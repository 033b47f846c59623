//! Output devices and sinks backed by cpal
//!
//! Each sink owns an output stream on its own thread; the stream stays alive
//! until the sink is dropped. PCM handed to [`CpalSink::start`] is converted
//! to the device's native rate and channel count up front, and the stream
//! callback drains it.

use super::buffer::PcmBuffer;
use super::convert::{expand_to_channels, pcm_to_f32, resample};
use super::format::AudioFormat;
use super::sink::{DeviceHandle, OutputDeviceRegistry, OutputSink};
use crate::{Result, SpeakpadError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use log::{debug, error, info, warn};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

/// Enumerates output devices on the default cpal host
#[derive(Debug, Default)]
pub struct CpalRegistry;

impl CpalRegistry {
    pub fn new() -> Self {
        Self
    }
}

impl OutputDeviceRegistry for CpalRegistry {
    fn list_output_devices(&self) -> Result<Vec<DeviceHandle>> {
        let host = cpal::default_host();
        let default_name = host
            .default_output_device()
            .and_then(|device| device.name().ok());

        let devices = host.output_devices().map_err(|e| {
            SpeakpadError::DeviceUnavailable(format!("Failed to list output devices: {}", e))
        })?;

        let mut handles = Vec::new();
        for device in devices {
            match device.name() {
                Ok(name) => {
                    let is_default = default_name.as_deref() == Some(name.as_str());
                    handles.push(DeviceHandle { name, is_default });
                }
                Err(e) => warn!("Skipping output device without a name: {}", e),
            }
        }

        debug!("Found {} output devices", handles.len());
        Ok(handles)
    }

    fn default_device(&self) -> Option<DeviceHandle> {
        let name = cpal::default_host().default_output_device()?.name().ok()?;
        Some(DeviceHandle {
            name,
            is_default: true,
        })
    }

    fn open_sink(&self, device: &DeviceHandle, format: AudioFormat) -> Result<Box<dyn OutputSink>> {
        let sink = CpalSink::open(&device.name, format)?;
        info!("Audio output selected: {}", device.name);
        Ok(Box::new(sink))
    }
}

/// Samples queued on the stream and how far the callback has read
struct Playhead {
    samples: Vec<f32>,
    position: usize,
}

impl Playhead {
    /// Queue `samples` to be read from offset 0
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: 0,
        }
    }
}

/// Copy the next samples of `current` into `data`
///
/// Whatever the playhead cannot cover is filled with silence. The playhead is
/// cleared once every sample has been read.
fn fill<T>(current: &mut Option<Playhead>, data: &mut [T])
where
    T: SizedSample + FromSample<f32> + Default,
{
    let Some(head) = current.as_mut() else {
        data.fill(T::default());
        return;
    };

    let remaining = &head.samples[head.position..];
    let to_copy = remaining.len().min(data.len());
    for (out, &sample) in data.iter_mut().zip(remaining) {
        *out = T::from_sample(sample);
    }
    data[to_copy..].fill(T::default());

    head.position += to_copy;
    if head.position >= head.samples.len() {
        *current = None;
    }
}

type SharedPlayhead = Arc<Mutex<Option<Playhead>>>;

fn lock(playhead: &SharedPlayhead) -> MutexGuard<'_, Option<Playhead>> {
    playhead
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A running cpal output stream on one device
pub struct CpalSink {
    format: AudioFormat,
    device_name: String,
    native_rate: u32,
    native_channels: usize,
    playhead: SharedPlayhead,
    /// Dropping this wakes the stream thread so it can tear the stream down
    shutdown: Option<mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl CpalSink {
    /// Open an output stream on the device called `device_name`
    pub fn open(device_name: &str, format: AudioFormat) -> Result<Self> {
        let playhead: SharedPlayhead = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(u32, usize)>>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let thread = {
            let name = device_name.to_string();
            let playhead = playhead.clone();
            thread::Builder::new()
                .name("audio-sink".into())
                .spawn(move || {
                    let stream = match open_stream(&name, playhead) {
                        Ok((stream, rate, channels)) => {
                            let _ = ready_tx.send(Ok((rate, channels)));
                            stream
                        }
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };

                    // Keep the stream alive until the sink goes away
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    debug!("Output stream on '{}' closed", name);
                })?
        };

        let (native_rate, native_channels) = match ready_rx.recv() {
            Ok(Ok(params)) => params,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(SpeakpadError::DeviceUnavailable(format!(
                    "audio thread for '{}' exited during setup",
                    device_name
                )));
            }
        };

        info!(
            "Output sink on '{}': {} Hz, {} ch (source {} Hz, {} ch)",
            device_name, native_rate, native_channels, format.sample_rate, format.channels
        );

        Ok(Self {
            format,
            device_name: device_name.to_string(),
            native_rate,
            native_channels,
            playhead,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Convert fixed-format PCM into interleaved device samples
    fn to_device_samples(&self, pcm: &PcmBuffer) -> Result<Vec<f32>> {
        let mono = pcm_to_f32(pcm.as_bytes());
        let resampled = resample(&mono, self.format.sample_rate, self.native_rate)?;
        Ok(expand_to_channels(&resampled, self.native_channels))
    }
}

impl OutputSink for CpalSink {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn start(&mut self, pcm: &PcmBuffer) -> Result<()> {
        let samples = self.to_device_samples(pcm)?;
        debug!(
            "Queued {} device samples on '{}'",
            samples.len(),
            self.device_name
        );
        *lock(&self.playhead) = Some(Playhead::new(samples));
        Ok(())
    }

    fn release(&mut self) {
        if lock(&self.playhead).take().is_some() {
            debug!("Abandoned playback on '{}'", self.device_name);
        }
    }
}

impl Drop for CpalSink {
    fn drop(&mut self) {
        self.shutdown.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Audio thread for '{}' panicked", self.device_name);
            }
        }
    }
}

fn find_device(name: &str) -> Result<Device> {
    let host = cpal::default_host();
    let mut devices = host.output_devices().map_err(|e| {
        SpeakpadError::DeviceUnavailable(format!("Failed to list output devices: {}", e))
    })?;

    devices
        .find(|device| device.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| SpeakpadError::DeviceUnavailable(format!("no output device named '{}'", name)))
}

fn open_stream(name: &str, playhead: SharedPlayhead) -> Result<(Stream, u32, usize)> {
    let device = find_device(name)?;
    let supported = device.default_output_config().map_err(|e| {
        SpeakpadError::DeviceUnavailable(format!("Failed to get output config: {}", e))
    })?;

    let rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config = supported.config();

    let stream = match supported.sample_format() {
        SampleFormat::F32 => build_stream::<f32>(&device, &config, playhead)?,
        SampleFormat::I16 => build_stream::<i16>(&device, &config, playhead)?,
        other => {
            return Err(SpeakpadError::DeviceUnavailable(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.play().map_err(|e| {
        SpeakpadError::DeviceUnavailable(format!("Failed to start output stream: {}", e))
    })?;

    Ok((stream, rate, channels))
}

fn build_stream<T>(device: &Device, config: &StreamConfig, playhead: SharedPlayhead) -> Result<Stream>
where
    T: SizedSample + FromSample<f32> + Default + Send + 'static,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                fill(&mut lock(&playhead), data);
            },
            move |err| {
                error!("Output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| SpeakpadError::DeviceUnavailable(format!("Failed to build output stream: {}", e)))
}
