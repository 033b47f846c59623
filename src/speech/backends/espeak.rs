//! espeak-ng backend
//!
//! Runs `espeak-ng --stdout` once per request and converts the WAV it
//! writes into 16 kHz mono PCM. Voices come from `espeak-ng --voices`.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use crate::audio::convert::wav_to_pcm;
use crate::speech::voices::{order_by_provenance, Provenance, VoiceDirectory, VoiceEntry};
use crate::speech::{EngineOutput, OwnedOutput, SynthesisEngine};
use crate::{Result, SpeakpadError};
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

/// One row of `espeak-ng --voices`: priority, language, age/gender, name, file
static VOICE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\s+(\S+)\s+\S+\s+(\S+)\s+\S+").expect("voice line pattern is valid")
});

/// espeak-ng synthesis engine
pub struct EspeakEngine {
    /// Path to espeak-ng
    espeak_path: String,
}

impl EspeakEngine {
    /// Locate espeak-ng, preferring an explicitly configured path
    pub fn new(explicit_path: Option<&str>) -> Result<Self> {
        debug!("Creating espeak-ng backend");
        let espeak_path = Self::find_espeak(explicit_path)?;
        debug!("Found espeak-ng at: {}", espeak_path);
        Ok(Self { espeak_path })
    }

    pub fn path(&self) -> &str {
        &self.espeak_path
    }

    /// Find espeak-ng executable
    fn find_espeak(explicit_path: Option<&str>) -> Result<String> {
        let mut paths = Vec::new();
        if let Some(path) = explicit_path.filter(|p| !p.is_empty()) {
            paths.push(path);
        }
        paths.extend(["espeak-ng", "/usr/bin/espeak-ng"]);

        for path in paths {
            if let Ok(status) = Command::new(path)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
            {
                if status.success() {
                    return Ok(path.to_string());
                }
            }
        }

        Err(SpeakpadError::Speech(
            "espeak-ng not found. Install with: sudo apt install espeak-ng".to_string(),
        ))
    }
}

impl SynthesisEngine for EspeakEngine {
    fn name(&self) -> &'static str {
        "espeak-ng"
    }

    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Box<dyn EngineOutput>> {
        let mut cmd = Command::new(&self.espeak_path);
        // UTF-8 text on stdin, WAV on stdout
        cmd.args(["--stdout", "--stdin", "-b", "1"]);
        if let Some(voice) = voice {
            cmd.arg("-v").arg(voice);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn espeak-ng: {}", e);
            SpeakpadError::SynthesisFailed(format!("Failed to start espeak-ng: {}", e))
        })?;

        let writer = child.stdin.take().map(|mut stdin| {
            let text = text.to_string();
            thread::spawn(move || stdin.write_all(text.as_bytes()))
        });

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.join() {
                debug!("espeak-ng closed stdin early: {}", e);
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SpeakpadError::SynthesisFailed(format!(
                "espeak-ng exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let pcm = wav_to_pcm(&output.stdout)?;
        debug!("espeak-ng produced {} bytes of PCM", pcm.len());
        Ok(OwnedOutput::new(pcm))
    }
}

/// Voices reported by `espeak-ng --voices`
///
/// espeak-ng has a single registry, so every voice is Standard.
pub struct EspeakVoices {
    espeak_path: String,
}

impl EspeakVoices {
    pub fn new(espeak_path: &str) -> Self {
        Self {
            espeak_path: espeak_path.to_string(),
        }
    }

    fn parse_voice_list(listing: &str) -> Vec<VoiceEntry> {
        let voices = listing
            .lines()
            .filter_map(|line| VOICE_LINE.captures(line))
            .map(|caps| {
                let name = caps[2].replace('_', " ");
                VoiceEntry::new(&caps[1], name, Provenance::Standard)
            })
            .collect();
        order_by_provenance(voices)
    }
}

impl VoiceDirectory for EspeakVoices {
    fn list_voices(&self) -> Result<Vec<VoiceEntry>> {
        let output = Command::new(&self.espeak_path)
            .arg("--voices")
            .stderr(Stdio::null())
            .output()
            .map_err(|e| SpeakpadError::Speech(format!("Failed to list espeak-ng voices: {}", e)))?;

        if !output.status.success() {
            return Err(SpeakpadError::Speech(format!(
                "espeak-ng --voices exited with {}",
                output.status
            )));
        }

        let voices = Self::parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!("espeak-ng reports {} voices", voices.len());
        Ok(voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-gb           --/M      English_(Great_Britain) gmw/en            (en 2)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";

    #[test]
    fn test_parse_voice_list() {
        let voices = EspeakVoices::parse_voice_list(VOICES);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0].id, "af");
        assert_eq!(voices[1].id, "en-gb");
        assert_eq!(voices[1].name, "English (Great Britain)");
        assert_eq!(voices[2].label(), "English (America) (Standard)");
        assert!(voices.iter().all(|v| v.provenance == Provenance::Standard));
    }

    #[test]
    fn test_parse_empty_listing() {
        assert!(EspeakVoices::parse_voice_list("").is_empty());
    }

    #[test]
    fn test_create_espeak_engine() {
        match EspeakEngine::new(None) {
            Ok(engine) => println!("✓ espeak-ng available at {}", engine.path()),
            Err(e) => println!("⚠ espeak-ng not available: {}", e),
        }
    }
}
