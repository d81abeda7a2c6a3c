use chrono::{DateTime, Utc};

use crate::UploadStatus;

/// Inputs to the poller state machine. The driver translates commands,
/// timer expiry and probe results into these.
#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// `start()` was called.
    Started,
    /// `stop()` was called.
    StopRequested,
    /// The overall session timer expired.
    SessionTimedOut,
    /// A probe cycle reached the status server. `status` is `None` when the
    /// payload was well-formed but carried nothing actionable (for example
    /// the `{}` the server returns before any upload has happened).
    PollSucceeded {
        port: u16,
        status: Option<UploadStatus>,
        now: DateTime<Utc>,
    },
    /// A probe cycle failed. `responding_port` is set when some port answered
    /// HTTP but its body was undecodable; that port stays sticky.
    PollFailed { responding_port: Option<u16> },
}
