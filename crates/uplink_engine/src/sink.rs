use std::sync::mpsc;

/// Callbacks the poller surfaces its results through.
///
/// Passed in explicitly at construction rather than discovered from ambient
/// state, so integrators hand the poller exactly the capabilities it needs.
/// None of these are ever invoked twice for the same distinct event.
pub trait StatusSink: Send + Sync {
    /// An upload is confirmed in progress.
    fn on_loading(&self);
    /// An upload finished; `link` is the shareable URL.
    fn on_complete(&self, link: &str);
    /// The server reported an upload failure.
    fn on_error(&self, message: &str);
    /// The session ended, by any route: success, stop, failure limit or
    /// timeout. Lets callers distinguish "timed out quietly" from "still
    /// waiting". Optional to implement.
    fn on_session_end(&self) {}
}

/// Sink events as plain values, for integrators that prefer draining a
/// channel over implementing [`StatusSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Loading,
    Complete { link: String },
    Error { message: String },
    SessionEnded,
}

pub struct ChannelStatusSink {
    tx: mpsc::Sender<StatusEvent>,
}

impl ChannelStatusSink {
    pub fn new(tx: mpsc::Sender<StatusEvent>) -> Self {
        Self { tx }
    }
}

impl StatusSink for ChannelStatusSink {
    fn on_loading(&self) {
        let _ = self.tx.send(StatusEvent::Loading);
    }

    fn on_complete(&self, link: &str) {
        let _ = self.tx.send(StatusEvent::Complete {
            link: link.to_string(),
        });
    }

    fn on_error(&self, message: &str) {
        let _ = self.tx.send(StatusEvent::Error {
            message: message.to_string(),
        });
    }

    fn on_session_end(&self) {
        let _ = self.tx.send(StatusEvent::SessionEnded);
    }
}
