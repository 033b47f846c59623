//! Platform-specific synthesis backends

// espeak-ng subprocess (Linux, WSL fallback)
pub mod espeak;

// Windows SAPI via PowerShell (Windows and WSL)
pub mod sapi;

// Native voice_synth library
#[cfg(all(windows, feature = "voice-synth"))]
pub mod voice_synth;
