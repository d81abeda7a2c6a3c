use std::time::Duration;

/// Tuning knobs for one polling session.
///
/// The candidate port list is injected rather than hardcoded: deployments of
/// the status server have been observed on any of the default ports below,
/// and only one of them is live in a given run.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    /// Delay before the second poll, and the floor the interval recovers to.
    pub initial_interval: Duration,
    /// Upper bound the backoff never exceeds.
    pub max_interval: Duration,
    /// Multiplier applied on failure, divisor applied on success.
    pub backoff_multiplier: f64,
    /// Back-to-back connection failures tolerated before the session ends.
    pub max_consecutive_failures: u32,
    /// Hard bound on session length; the poller never runs past this.
    pub session_timeout: Duration,
    /// Status events older than this are ignored rather than reported.
    pub freshness_window: Duration,
    /// Ports probed in order when the status server must be (re)discovered.
    pub candidate_ports: Vec<u16>,
    /// Whether a server-reported upload error ends the session.
    pub stop_on_error: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(500),
            max_interval: Duration::from_secs(10),
            backoff_multiplier: 1.5,
            max_consecutive_failures: 3,
            session_timeout: Duration::from_secs(120),
            freshness_window: Duration::from_secs(60),
            candidate_ports: vec![8888, 8889, 8890, 8891, 8892],
            stop_on_error: false,
        }
    }
}
