use std::time::Duration;

/// Side effects requested by `update`; the driver executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Probe the status endpoint after `delay`, trying `preferred_port` first.
    Poll {
        delay: Duration,
        preferred_port: Option<u16>,
    },
    /// Arm the overall session timer; on expiry the driver feeds back
    /// `Msg::SessionTimedOut`.
    ArmSessionTimer { timeout: Duration },
    /// The server confirmed an upload is in progress.
    NotifyLoading,
    /// The upload finished and produced a share link.
    NotifyComplete { link: String },
    /// The server reported an upload failure.
    NotifyError { message: String },
    /// Session over: cancel all timers, stop probing.
    Halt,
}
