//! Native voice_synth library backend (Windows, `voice-synth` feature)
//!
//! The library hands back PCM allocated on its own heap. It is copied out
//! through [`EngineOutput::bytes`] and returned with `free_voice_data` exactly
//! once, so the pointer never crosses into playback storage.

use crate::speech::{EngineOutput, SynthesisEngine};
use crate::{Result, SpeakpadError};
use log::debug;
use std::ffi::c_int;
use std::iter;
use std::ptr;
use std::slice;

#[repr(C)]
struct VoiceData {
    data: *const u8,
    size: c_int,
}

#[link(name = "voice_synth")]
extern "C" {
    fn synthesize_text(text: *const u16, voice_name: *const u16, out_voice: *mut VoiceData) -> bool;
    fn free_voice_data(voice: *const VoiceData);
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(iter::once(0)).collect()
}

/// PCM still owned by the voice_synth library
struct NativeOutput {
    voice: VoiceData,
}

// The library allocation is not tied to the thread that requested it.
unsafe impl Send for NativeOutput {}

impl EngineOutput for NativeOutput {
    fn bytes(&self) -> Option<&[u8]> {
        if self.voice.data.is_null() || self.voice.size <= 0 {
            return None;
        }
        // SAFETY: the library guarantees `size` readable bytes at `data`
        // until free_voice_data is called, which needs `self` by value.
        Some(unsafe { slice::from_raw_parts(self.voice.data, self.voice.size as usize) })
    }

    fn free(self: Box<Self>) {
        if self.voice.data.is_null() {
            return;
        }
        debug!("Returning {} bytes to voice_synth", self.voice.size);
        // SAFETY: called once per successful synthesize_text result.
        unsafe { free_voice_data(&self.voice) };
    }
}

/// Engine backed by the native voice_synth library
pub struct VoiceSynthLibrary;

impl SynthesisEngine for VoiceSynthLibrary {
    fn name(&self) -> &'static str {
        "voice-synth"
    }

    fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<Box<dyn EngineOutput>> {
        let wide_text = to_wide(text);
        let wide_voice = voice.map(to_wide);
        let voice_ptr = wide_voice.as_ref().map_or(ptr::null(), |v| v.as_ptr());

        let mut out = VoiceData {
            data: ptr::null(),
            size: 0,
        };
        // SAFETY: both strings are NUL-terminated and outlive the call.
        let ok = unsafe { synthesize_text(wide_text.as_ptr(), voice_ptr, &mut out) };
        if !ok {
            return Err(SpeakpadError::SynthesisFailed(
                "voice_synth reported failure".to_string(),
            ));
        }

        Ok(Box::new(NativeOutput { voice: out }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_wide_is_nul_terminated() {
        assert_eq!(to_wide("Hi"), vec![0x48, 0x69, 0]);
        assert_eq!(to_wide(""), vec![0]);
    }
}
