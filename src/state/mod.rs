//! Application state management
//!
//! The State struct ties the snippet list and the voice and device choices
//! to the speak controller. It is what the prompt operates on.

pub mod config;
pub mod snippets;

use crate::audio::{DeviceHandle, OutputDeviceRegistry};
use crate::notify::Notifier;
use crate::speech::{
    SpeakController, SpeakOutcome, SpeakRequest, SpeechBackend, VoiceDirectory, VoiceEntry,
    VoiceSelection,
};
use crate::{Result, SpeakpadError};
use config::Config;
use log::{info, warn};
use snippets::SnippetList;

/// Main application state
pub struct State {
    /// Configuration loaded from ~/.speakpad.cfg
    pub config: Config,

    /// Snippets and the edit field the speak action reads
    pub snippets: SnippetList,

    /// Voice list source for the active backend
    voice_directory: Box<dyn VoiceDirectory>,

    /// Voices as last listed, Standard first
    voices: Vec<VoiceEntry>,

    /// Voice passed to the engine on the next speak
    voice: VoiceSelection,

    /// Output devices as last listed
    devices: Vec<DeviceHandle>,

    /// Device the active sink was opened on
    device: Option<DeviceHandle>,

    controller: SpeakController,
}

impl State {
    /// Build the state and open the configured (or default) output device
    pub fn new(
        config: Config,
        backend: SpeechBackend,
        registry: Box<dyn OutputDeviceRegistry>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self> {
        info!("Speech backend: {}", backend.name());
        let SpeechBackend { engine, voices } = backend;

        let controller = SpeakController::new(engine, registry, notifier);
        let mut state = Self {
            voice: VoiceSelection::from_id(config.voice()),
            config,
            snippets: SnippetList::new(),
            voice_directory: voices,
            voices: Vec::new(),
            devices: Vec::new(),
            device: None,
            controller,
        };

        state.refresh_voices();
        if let Err(e) = state.refresh_devices() {
            warn!("Could not list output devices: {}", e);
        }
        state.open_initial_device();

        Ok(state)
    }

    fn open_initial_device(&mut self) {
        let wanted = self.config.device();
        let device = wanted
            .as_deref()
            .and_then(|name| self.devices.iter().find(|d| d.name == name).cloned())
            .or_else(|| {
                if let Some(name) = &wanted {
                    warn!("Configured output device '{}' not found, using default", name);
                }
                self.controller.registry().default_device()
            });

        match device {
            Some(device) => {
                if self.controller.select_device(&device).is_ok() {
                    self.device = Some(device);
                }
            }
            None => warn!("No output device available"),
        }
    }

    /// Speak the edit field with the selected voice
    pub fn speak(&self) -> SpeakOutcome {
        let request = SpeakRequest::new(self.snippets.edit(), self.voice.id());
        self.controller.speak(request)
    }

    /// Whether the speak action is currently accepted
    pub fn can_speak(&self) -> bool {
        self.controller.is_ready()
    }

    pub fn engine_name(&self) -> &'static str {
        self.controller.engine_name()
    }

    /// Re-read the voice list, keeping the current selection's label in sync
    pub fn refresh_voices(&mut self) -> &[VoiceEntry] {
        self.voices = match self.voice_directory.list_voices() {
            Ok(voices) => voices,
            Err(e) => {
                warn!("Could not list voices: {}", e);
                Vec::new()
            }
        };
        info!("{} voices available", self.voices.len());

        if let Some(entry) = self.voices.iter().find(|v| v.id == self.voice.id()) {
            self.voice = VoiceSelection::from_entry(entry);
        }
        &self.voices
    }

    pub fn voices(&self) -> &[VoiceEntry] {
        &self.voices
    }

    pub fn voice(&self) -> &VoiceSelection {
        &self.voice
    }

    /// Select voice `index` from the last listing, or the default voice
    /// with `None`, and remember it in the config file
    pub fn choose_voice(&mut self, index: Option<usize>) -> Result<&VoiceSelection> {
        self.voice = match index {
            None => VoiceSelection::default_voice(),
            Some(i) => {
                let entry = self
                    .voices
                    .get(i)
                    .ok_or_else(|| SpeakpadError::Other(format!("No voice number {}", i + 1)))?;
                VoiceSelection::from_entry(entry)
            }
        };
        info!("Voice selected: {}", self.voice.label());

        self.config.set_voice(self.voice.id());
        if let Err(e) = self.config.save() {
            warn!("Could not save voice choice: {}", e);
        }
        Ok(&self.voice)
    }

    /// Re-read the output device list
    pub fn refresh_devices(&mut self) -> Result<&[DeviceHandle]> {
        self.devices = self.controller.registry().list_output_devices()?;
        Ok(&self.devices)
    }

    pub fn devices(&self) -> &[DeviceHandle] {
        &self.devices
    }

    pub fn device(&self) -> Option<&DeviceHandle> {
        self.device.as_ref()
    }

    /// Switch output to device `index` from the last listing
    pub fn choose_device(&mut self, index: usize) -> Result<()> {
        let device = self
            .devices
            .get(index)
            .cloned()
            .ok_or_else(|| SpeakpadError::Other(format!("No device number {}", index + 1)))?;

        self.device = None;
        self.controller.select_device(&device)?;

        self.config.set_device(&device.name);
        if let Err(e) = self.config.save() {
            warn!("Could not save device choice: {}", e);
        }
        self.device = Some(device);
        Ok(())
    }
}
