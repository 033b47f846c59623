//! Speech synthesis and the speak pipeline

pub mod backends;
pub mod controller;
pub mod synth;
pub mod trigger;
pub mod voices;

pub use controller::{SpeakController, SpeakOutcome, SpeakRequest};
pub use synth::{
    create_backend, BackendOptions, EngineKind, EngineOutput, OwnedOutput, SpeechBackend,
    SynthesisEngine,
};
pub use trigger::{SpeakTrigger, TriggerGuard};
pub use voices::{Provenance, VoiceDirectory, VoiceEntry, VoiceSelection};
