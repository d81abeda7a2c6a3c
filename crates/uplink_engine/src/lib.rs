//! Uplink engine: HTTP probing and the timer-driven session loop.
mod decode;
mod probe;
mod session;
mod sink;

pub use decode::{decode_status, DecodeError};
pub use probe::{PollOutcome, ProbeError, ProbeSettings, Prober, ReqwestProber};
pub use session::PollerHandle;
pub use sink::{ChannelStatusSink, StatusEvent, StatusSink};
