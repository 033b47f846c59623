//! Synthesis engine abstraction
//!
//! An engine turns text plus an optional voice id into 16 kHz mono PCM. The
//! memory it returns belongs to the engine: callers copy it out and hand it
//! back through [`EngineOutput::free`] exactly once.

use super::voices::VoiceDirectory;
use crate::platform::Platform;
use crate::{Result, SpeakpadError};
use log::{debug, info};
use std::str::FromStr;

/// PCM produced by an engine, still owned by that engine
pub trait EngineOutput: Send {
    /// The synthesized bytes, or `None` when the engine returned a null buffer
    fn bytes(&self) -> Option<&[u8]>;

    /// Give the memory back to the engine
    fn free(self: Box<Self>);
}

/// Text-to-PCM engine
///
/// Implementations block until synthesis finishes. `voice` is `None` for the
/// engine's default voice; an empty id is never passed.
pub trait SynthesisEngine: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Render `text` as 16 kHz mono s16le PCM
    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Box<dyn EngineOutput>>;
}

/// Engine output backed by a plain heap allocation
///
/// Used by engines that run an external process and collect its output.
pub struct OwnedOutput {
    data: Vec<u8>,
}

impl OwnedOutput {
    pub fn new(data: Vec<u8>) -> Box<Self> {
        Box::new(Self { data })
    }
}

impl EngineOutput for OwnedOutput {
    fn bytes(&self) -> Option<&[u8]> {
        Some(&self.data)
    }

    fn free(self: Box<Self>) {
        debug!("Releasing {} bytes of engine output", self.data.len());
    }
}

/// Which backend to use, as named in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// Probe the platform and use the first backend that works
    Auto,
    Espeak,
    Sapi,
    VoiceSynth,
}

impl FromStr for EngineKind {
    type Err = SpeakpadError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(EngineKind::Auto),
            "espeak" | "espeak-ng" => Ok(EngineKind::Espeak),
            "sapi" => Ok(EngineKind::Sapi),
            "voice-synth" | "voice_synth" => Ok(EngineKind::VoiceSynth),
            other => Err(SpeakpadError::Config(format!(
                "Unknown speech engine '{}' (expected auto, espeak, sapi or voice-synth)",
                other
            ))),
        }
    }
}

/// Options the backends read from configuration
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Explicit espeak-ng executable
    pub espeak_path: Option<String>,
}

/// A synthesis engine together with the voice list that goes with it
pub struct SpeechBackend {
    pub engine: Box<dyn SynthesisEngine>,
    pub voices: Box<dyn VoiceDirectory>,
}

impl SpeechBackend {
    pub fn name(&self) -> &'static str {
        self.engine.name()
    }
}

/// Create the speech backend for `kind`
///
/// With [`EngineKind::Auto`] the environment is probed:
///
/// **WSL:**
/// 1. Windows SAPI via PowerShell (Windows voices, registry voice list)
/// 2. espeak-ng
///
/// **Native Linux and others:**
/// - espeak-ng
///
/// **Windows:**
/// 1. Native voice_synth library (when built with the `voice-synth` feature)
/// 2. Windows SAPI via PowerShell
pub fn create_backend(kind: EngineKind, options: &BackendOptions) -> Result<SpeechBackend> {
    match kind {
        EngineKind::Espeak => espeak_backend(options),
        EngineKind::Sapi => sapi_backend(),
        EngineKind::VoiceSynth => voice_synth_backend(),
        EngineKind::Auto => probe_backend(Platform::detect(), options),
    }
}

fn probe_backend(platform: Platform, options: &BackendOptions) -> Result<SpeechBackend> {
    info!("Probing speech backends for {:?}", platform);
    let mut tried = Vec::new();

    if platform == Platform::Windows {
        info!("Trying native voice_synth library...");
        match voice_synth_backend() {
            Ok(backend) => {
                info!("✓ Using native voice_synth library");
                return Ok(backend);
            }
            Err(e) => {
                info!("✗ voice_synth library unavailable: {}", e);
                tried.push(format!("voice_synth: {}", e));
            }
        }
    }

    if platform.has_windows_speech() {
        info!("Trying Windows SAPI backend...");
        match sapi_backend() {
            Ok(backend) => {
                info!("✓ Using Windows SAPI backend");
                return Ok(backend);
            }
            Err(e) => {
                info!("✗ Windows SAPI backend unavailable: {}", e);
                tried.push(format!("SAPI: {}", e));
            }
        }
    }

    if platform != Platform::Windows {
        info!("Trying espeak-ng backend...");
        match espeak_backend(options) {
            Ok(backend) => {
                info!("✓ Using espeak-ng backend");
                return Ok(backend);
            }
            Err(e) => {
                info!("✗ espeak-ng backend unavailable: {}", e);
                tried.push(format!("espeak-ng: {}", e));
            }
        }
    }

    Err(SpeakpadError::Speech(format!(
        "No speech backend available on {:?}. Tried:\n  {}",
        platform,
        tried.join("\n  ")
    )))
}

fn espeak_backend(options: &BackendOptions) -> Result<SpeechBackend> {
    use super::backends::espeak::{EspeakEngine, EspeakVoices};

    let engine = EspeakEngine::new(options.espeak_path.as_deref())?;
    let voices = EspeakVoices::new(engine.path());
    Ok(SpeechBackend {
        engine: Box::new(engine),
        voices: Box::new(voices),
    })
}

fn sapi_backend() -> Result<SpeechBackend> {
    use super::backends::sapi::{RegistryVoices, SapiEngine};

    let engine = SapiEngine::new()?;
    let voices = RegistryVoices::new(engine.powershell_path());
    Ok(SpeechBackend {
        engine: Box::new(engine),
        voices: Box::new(voices),
    })
}

#[cfg(all(windows, feature = "voice-synth"))]
fn voice_synth_backend() -> Result<SpeechBackend> {
    use super::backends::sapi::{find_powershell, RegistryVoices};
    use super::backends::voice_synth::VoiceSynthLibrary;

    let powershell = find_powershell()?;
    Ok(SpeechBackend {
        engine: Box::new(VoiceSynthLibrary),
        voices: Box::new(RegistryVoices::new(&powershell)),
    })
}

#[cfg(not(all(windows, feature = "voice-synth")))]
fn voice_synth_backend() -> Result<SpeechBackend> {
    Err(SpeakpadError::Speech(
        "speakpad was built without the voice-synth feature (Windows only)".to_string(),
    ))
}
