//! Fire-and-forget surface for transient UI notifications. The application
//! plugs its own toast/message implementation in; nothing here consumes a
//! return value.

use tracing::{
    error,
    info,
};

pub trait Notifier {
    /// Shows a loading indicator. Dismissed on both success and failure.
    fn loading(&self, message: &str);

    fn dismiss_loading(&self);

    fn success(&self, message: &str);

    fn error(&self, message: &str);
}

/// Default surface that reports through the log instead of a UI.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn loading(&self, message: &str) {
        info!(target: "pocketcoin::ui", "{message}");
    }

    fn dismiss_loading(&self) {}

    fn success(&self, message: &str) {
        info!(target: "pocketcoin::ui", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "pocketcoin::ui", "{message}");
    }
}
