//! Side effects the request pipeline asks the application to perform.
//!
//! The pipeline never talks to a router or a UI directly. It emits
//! [`Effect`] values on a channel and the application decides how to show a
//! notification or commit a navigation.
//!
//! The channel is unbounded: the application usually drains it only after
//! the request that produced the effects has returned, so emitting must
//! never wait on the receiver.

use tokio::sync::mpsc;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Show `message` to the user
    Notify { message: String, severity: Severity },
    /// Move the user to `path`
    Navigate { path: String },
}

/// Sending half of the effect channel. Clone is cheap.
#[derive(Debug, Clone)]
pub struct EffectSender {
    tx: mpsc::UnboundedSender<Effect>,
}

/// Create a connected sender/receiver pair
pub fn effect_channel() -> (EffectSender, mpsc::UnboundedReceiver<Effect>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EffectSender { tx }, rx)
}

impl EffectSender {
    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        self.emit(Effect::Notify {
            message: message.into(),
            severity,
        });
    }

    pub fn navigate(&self, path: impl Into<String>) {
        self.emit(Effect::Navigate { path: path.into() });
    }

    /// Send an effect, logging if nobody is listening anymore
    fn emit(&self, effect: Effect) {
        if let Err(e) = self.tx.send(effect) {
            error!(effect = ?e.0, "Failed to emit effect - channel closed");
        }
    }
}
