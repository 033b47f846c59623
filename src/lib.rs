//! speakpad - speak saved text snippets
//!
//! Keeps a list of text snippets and plays any of them back through a chosen
//! speech voice and audio output device. The interesting part is the
//! synthesis-to-playback pipeline in [`speech::SpeakController`] and
//! [`audio::PlaybackBufferManager`].

pub mod audio;
pub mod error;
pub mod input;
pub mod notify;
pub mod platform;
pub mod speech;
pub mod state;

pub use error::{Result, SpeakpadError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "speakpad";
