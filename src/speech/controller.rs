//! Speak controller
//!
//! Drives one synthesis-and-playback cycle per speak action:
//!
//! 1. disable the speak trigger (reject the call if it is already disabled)
//! 2. skip empty text
//! 3. synthesize, copy the engine's PCM into a [`PcmBuffer`] and free it
//! 4. replace the previous buffer and start it on the active sink
//! 5. report failures to the user, then re-enable the trigger
//!
//! Nothing fails past [`SpeakController::speak`]; every outcome is reported
//! through [`SpeakOutcome`].

use super::synth::SynthesisEngine;
use super::trigger::SpeakTrigger;
use crate::audio::{DeviceHandle, OutputDeviceRegistry, PcmBuffer, PlaybackBufferManager};
use crate::notify::Notifier;
use crate::{Result, SpeakpadError};
use log::{debug, error, info};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Text and voice captured when a speak action begins
///
/// Owned copies, so later edits in the UI cannot reach an in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakRequest {
    pub text: String,
    /// Voice id; empty selects the engine's default voice
    pub voice_id: String,
}

impl SpeakRequest {
    pub fn new(text: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
        }
    }

    /// Voice to pass to the engine: `None` for the default voice
    pub fn engine_voice(&self) -> Option<&str> {
        if self.voice_id.is_empty() {
            None
        } else {
            Some(&self.voice_id)
        }
    }
}

/// What a call to [`SpeakController::speak`] did
#[derive(Debug)]
pub enum SpeakOutcome {
    /// Text was empty; nothing happened
    Skipped,
    /// Another request was in flight; nothing happened
    Rejected,
    /// The user has been notified of this error
    Failed(SpeakpadError),
    /// Playback started
    Playing { bytes: usize, duration: Duration },
}

impl SpeakOutcome {
    pub fn is_playing(&self) -> bool {
        matches!(self, SpeakOutcome::Playing { .. })
    }
}

/// Orchestrates speak requests against one engine and one output device
pub struct SpeakController {
    engine: Box<dyn SynthesisEngine>,
    registry: Box<dyn OutputDeviceRegistry>,
    notifier: Box<dyn Notifier>,
    trigger: SpeakTrigger,
    playback: Mutex<PlaybackBufferManager>,
}

impl SpeakController {
    pub fn new(
        engine: Box<dyn SynthesisEngine>,
        registry: Box<dyn OutputDeviceRegistry>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            engine,
            registry,
            notifier,
            trigger: SpeakTrigger::new(),
            playback: Mutex::new(PlaybackBufferManager::new()),
        }
    }

    /// Whether a speak action would be accepted right now
    pub fn is_ready(&self) -> bool {
        self.trigger.is_enabled()
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    pub fn registry(&self) -> &dyn OutputDeviceRegistry {
        self.registry.as_ref()
    }

    /// Run one speak request end to end
    pub fn speak(&self, request: SpeakRequest) -> SpeakOutcome {
        let Some(_guard) = self.trigger.try_disable() else {
            debug!("Speak rejected: a request is already in flight");
            return SpeakOutcome::Rejected;
        };

        match self.synthesize_and_play(&request) {
            Ok(outcome) => outcome,
            Err(SpeakpadError::EmptyInput) => {
                debug!("Nothing to speak");
                SpeakOutcome::Skipped
            }
            Err(e) => {
                error!("Speak failed: {}", e);
                self.notifier.notify_error(e.title(), &e.to_string());
                SpeakOutcome::Failed(e)
            }
        }
    }

    fn synthesize_and_play(&self, request: &SpeakRequest) -> Result<SpeakOutcome> {
        if request.text.is_empty() {
            return Err(SpeakpadError::EmptyInput);
        }

        let output = self
            .engine
            .synthesize(&request.text, request.engine_voice())
            .map_err(|e| match e {
                SpeakpadError::SynthesisFailed(_) => e,
                other => SpeakpadError::SynthesisFailed(other.to_string()),
            })?;
        let buffer = PcmBuffer::copy_from(output)?;

        let bytes = buffer.len();
        let duration = buffer.duration();
        debug!("Audio size: {} bytes", bytes);
        debug!("Duration approx: {:.1} seconds", duration.as_secs_f32());

        let mut playback = self.lock_playback();
        let handle = playback.replace(buffer);
        playback.play(&handle)?;

        Ok(SpeakOutcome::Playing { bytes, duration })
    }

    /// Switch playback to `device`
    ///
    /// The current sink is destroyed first and whatever it was playing is
    /// abandoned. On failure the user is notified and no device is active.
    pub fn select_device(&self, device: &DeviceHandle) -> Result<()> {
        let result = self
            .lock_playback()
            .swap_sink(|format| self.registry.open_sink(device, format));

        match &result {
            Ok(()) => info!("Output device: {}", device.name),
            Err(e) => {
                error!("Failed to select output device '{}': {}", device.name, e);
                self.notifier.notify_error("Failed to open audio output", &e.to_string());
            }
        }
        result
    }

    fn lock_playback(&self) -> MutexGuard<'_, PlaybackBufferManager> {
        self.playback
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_voice_means_default() {
        assert_eq!(SpeakRequest::new("Hello", "").engine_voice(), None);
        assert_eq!(
            SpeakRequest::new("Hello", "en-us").engine_voice(),
            Some("en-us")
        );
    }

    #[test]
    fn test_request_is_a_snapshot() {
        let mut text = String::from("Hello");
        let request = SpeakRequest::new(text.clone(), "");
        text.push_str(" world");
        assert_eq!(request.text, "Hello");
    }
}
