//! Terminal notification sink.

use std::io::Write;

use tracing::warn;

use crate::application::host::NotificationSink;

/// Prints user-facing errors on stderr, one per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl NotificationSink for StderrNotifier {
    fn show_error(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        if writeln!(stderr, "error: {message}").is_err() {
            warn!(target = "infra::notify", message, "Failed to show notification");
        }
    }
}
