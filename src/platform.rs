//! Platform detection utilities

use std::fs;

/// Environment the speech backends are probed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Linux running under WSL, with Windows interop available
    Wsl,
    Linux,
    Windows,
    Other,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "linux" if is_wsl() => Platform::Wsl,
            "linux" => Platform::Linux,
            _ => Platform::Other,
        }
    }

    /// Whether Windows speech voices can be reached from here
    pub fn has_windows_speech(self) -> bool {
        matches!(self, Platform::Wsl | Platform::Windows)
    }
}

/// Detect if running in WSL (Windows Subsystem for Linux)
///
/// Checks /proc/version for a Microsoft kernel and falls back to the
/// `WSL_DISTRO_NAME` variable set by the WSL launcher.
pub fn is_wsl() -> bool {
    if let Ok(contents) = fs::read_to_string("/proc/version") {
        if looks_like_wsl_kernel(&contents) {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

fn looks_like_wsl_kernel(version: &str) -> bool {
    let lower = version.to_lowercase();
    lower.contains("microsoft") || lower.contains("wsl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wsl_kernel_detection() {
        assert!(looks_like_wsl_kernel(
            "Linux version 5.15.153.1-microsoft-standard-WSL2"
        ));
        assert!(!looks_like_wsl_kernel("Linux version 6.8.0-45-generic"));
    }

    #[test]
    fn test_windows_speech_platforms() {
        assert!(Platform::Wsl.has_windows_speech());
        assert!(Platform::Windows.has_windows_speech());
        assert!(!Platform::Linux.has_windows_speech());
        assert!(!Platform::Other.has_windows_speech());
    }

    #[test]
    fn test_detect() {
        // Result depends on the host; only verify it doesn't panic
        let _ = Platform::detect();
    }
}
