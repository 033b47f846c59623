//! Re-entrancy guard for the speak action

use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};

/// The control that starts a speak request
///
/// Disabled while a request is in flight. Disabling hands out a
/// [`TriggerGuard`]; the trigger is enabled again when the guard goes out of
/// scope, on every path out of the request including `?` and panics.
#[derive(Debug)]
pub struct SpeakTrigger {
    enabled: AtomicBool,
}

impl SpeakTrigger {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Disable the trigger, or return `None` if it is already disabled
    pub fn try_disable(&self) -> Option<TriggerGuard<'_>> {
        self.enabled
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        debug!("Speak trigger disabled");
        Some(TriggerGuard { trigger: self })
    }
}

impl Default for SpeakTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the trigger disabled; enables it on drop
#[derive(Debug)]
pub struct TriggerGuard<'a> {
    trigger: &'a SpeakTrigger,
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.trigger.enabled.store(true, Ordering::SeqCst);
        debug!("Speak trigger enabled");
    }
}
