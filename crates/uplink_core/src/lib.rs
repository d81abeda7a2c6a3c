//! Uplink core: pure poller state machine, no IO.
mod config;
mod effect;
mod msg;
mod state;
mod status;
mod update;

pub use config::PollerConfig;
pub use effect::Effect;
pub use msg::Msg;
pub use state::PollerState;
pub use status::{StatusKind, UploadStatus};
pub use update::update;
