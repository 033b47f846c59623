//! User-facing error notifications

use log::debug;
use std::io::{self, BufRead, Write};

/// Shows errors the user has to acknowledge
pub trait Notifier: Send + Sync {
    /// Show `message` and block until the user acknowledges it
    fn notify_error(&self, title: &str, message: &str);
}

/// Prints to stderr and waits for Enter on stdin
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl TerminalNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for TerminalNotifier {
    fn notify_error(&self, title: &str, message: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "\n*** {} ***\n{}", title, message);
        let _ = write!(stderr, "Press Enter to continue...");
        let _ = stderr.flush();
        drop(stderr);

        let mut line = String::new();
        if let Err(e) = io::stdin().lock().read_line(&mut line) {
            debug!("Could not wait for acknowledgement: {}", e);
        }
    }
}
