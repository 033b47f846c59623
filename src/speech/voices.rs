//! Installed voice enumeration

use crate::Result;
use std::fmt;

/// Which platform subsystem registered a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    Standard,
    LegacyCompatible,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Standard => write!(f, "Standard"),
            Provenance::LegacyCompatible => write!(f, "Legacy"),
        }
    }
}

/// One installed voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceEntry {
    /// Identifier handed to the synthesis engine
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub provenance: Provenance,
}

impl VoiceEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provenance,
        }
    }

    /// Display label annotated with provenance, e.g. "Microsoft Zira (Standard)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.provenance)
    }
}

/// Enumerates installed voices
///
/// Order is stable within a run and lists every Standard voice before any
/// LegacyCompatible one. A voice registered under both classes appears twice.
pub trait VoiceDirectory: Send + Sync {
    fn list_voices(&self) -> Result<Vec<VoiceEntry>>;
}

/// Stable partition: Standard entries first, each class in its original order
pub fn order_by_provenance(mut voices: Vec<VoiceEntry>) -> Vec<VoiceEntry> {
    // sort_by_key is stable
    voices.sort_by_key(|voice| voice.provenance);
    voices
}

/// The voice the user has picked
///
/// An empty id means "engine default" and is distinct from having no voice
/// directory at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSelection {
    id: String,
    label: String,
}

impl VoiceSelection {
    pub fn from_entry(entry: &VoiceEntry) -> Self {
        Self {
            id: entry.id.clone(),
            label: entry.label(),
        }
    }

    /// Selection restored from configuration, before the voice list is known
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            return Self::default_voice();
        }
        Self {
            label: id.clone(),
            id,
        }
    }

    pub fn default_voice() -> Self {
        Self {
            id: String::new(),
            label: "Default voice".to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_default(&self) -> bool {
        self.id.is_empty()
    }
}

impl Default for VoiceSelection {
    fn default() -> Self {
        Self::default_voice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_before_legacy() {
        let voices = vec![
            VoiceEntry::new("L1", "Legacy One", Provenance::LegacyCompatible),
            VoiceEntry::new("S1", "Standard One", Provenance::Standard),
            VoiceEntry::new("L2", "Legacy Two", Provenance::LegacyCompatible),
            VoiceEntry::new("S2", "Standard Two", Provenance::Standard),
        ];

        let ids: Vec<_> = order_by_provenance(voices)
            .into_iter()
            .map(|v| v.id)
            .collect();
        assert_eq!(ids, vec!["S1", "S2", "L1", "L2"]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let voices = vec![
            VoiceEntry::new("Zira", "Zira", Provenance::LegacyCompatible),
            VoiceEntry::new("Zira", "Zira", Provenance::Standard),
        ];
        let ordered = order_by_provenance(voices);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[0].provenance, Provenance::Standard);
        assert_eq!(ordered[1].provenance, Provenance::LegacyCompatible);
    }

    #[test]
    fn test_labels() {
        let entry = VoiceEntry::new("MSTTS_V110_enUS_ZiraM", "Microsoft Zira", Provenance::Standard);
        assert_eq!(entry.label(), "Microsoft Zira (Standard)");

        let selection = VoiceSelection::from_entry(&entry);
        assert_eq!(selection.id(), "MSTTS_V110_enUS_ZiraM");
        assert_eq!(selection.label(), "Microsoft Zira (Standard)");
        assert!(!selection.is_default());
    }

    #[test]
    fn test_empty_id_is_default() {
        assert!(VoiceSelection::from_id("").is_default());
        assert_eq!(VoiceSelection::from_id("en-us").id(), "en-us");
    }
}
