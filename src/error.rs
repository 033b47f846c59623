//! Error types for speakpad

use std::io;
use thiserror::Error;

/// Main error type for speakpad
#[derive(Error, Debug)]
pub enum SpeakpadError {
    /// Nothing to say; skipped without telling the user
    #[error("Nothing to speak")]
    EmptyInput,

    /// A speak request is already in flight
    #[error("Speak is already in progress")]
    Busy,

    #[error("Failed to synthesize voice: {0}")]
    SynthesisFailed(String),

    #[error("Audio output unavailable: {0}")]
    DeviceUnavailable(String),

    /// Playback was requested for a buffer that has since been replaced
    #[error("Audio buffer is no longer installed")]
    StaleBuffer,

    #[error("Speech backend error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl SpeakpadError {
    /// Title shown on the blocking notification for this error
    pub fn title(&self) -> &'static str {
        match self {
            SpeakpadError::SynthesisFailed(_) => "Failed to create speech",
            SpeakpadError::DeviceUnavailable(_) | SpeakpadError::StaleBuffer => {
                "Failed to play speech"
            }
            _ => "Error",
        }
    }
}

/// Result type alias for speakpad operations
pub type Result<T> = std::result::Result<T, SpeakpadError>;

impl From<String> for SpeakpadError {
    fn from(s: String) -> Self {
        SpeakpadError::Other(s)
    }
}

impl From<&str> for SpeakpadError {
    fn from(s: &str) -> Self {
        SpeakpadError::Other(s.to_string())
    }
}
