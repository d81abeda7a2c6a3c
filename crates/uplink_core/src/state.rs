use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{PollerConfig, UploadStatus};

/// Process-local state of one polling session.
///
/// Owned exclusively by one driver; the design assumes a single live poller
/// per session ("one active upload flow at a time"). All fields reset on
/// session start, so a `start()` after `stop()` never resumes stale counters.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerState {
    config: PollerConfig,
    is_active: bool,
    current_interval: Duration,
    discovered_port: Option<u16>,
    consecutive_failures: u32,
    seen_event_keys: HashSet<String>,
}

impl PollerState {
    pub fn new(config: PollerConfig) -> Self {
        let current_interval = config.initial_interval;
        Self {
            config,
            is_active: false,
            current_interval,
            discovered_port: None,
            consecutive_failures: 0,
            seen_event_keys: HashSet::new(),
        }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Delay before the next poll cycle.
    pub fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Last port that answered successfully; sticky until it fails.
    pub fn discovered_port(&self) -> Option<u16> {
        self.discovered_port
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub(crate) fn begin_session(&mut self) {
        self.is_active = true;
        self.current_interval = self.config.initial_interval;
        self.discovered_port = None;
        self.consecutive_failures = 0;
        self.seen_event_keys.clear();
    }

    pub(crate) fn end_session(&mut self) {
        self.is_active = false;
    }

    /// Lengthen the interval by the backoff multiplier, capped at the max.
    pub(crate) fn back_off(&mut self) {
        let next = self.current_interval.mul_f64(self.config.backoff_multiplier);
        self.current_interval = next.min(self.config.max_interval);
    }

    /// Shorten the interval by the backoff multiplier, floored at the initial.
    pub(crate) fn speed_up(&mut self) {
        let next = self.current_interval.div_f64(self.config.backoff_multiplier);
        self.current_interval = next.max(self.config.initial_interval);
    }

    /// Drop straight back to the fastest cadence (used while an upload is
    /// actively in progress).
    pub(crate) fn reset_interval(&mut self) {
        self.current_interval = self.config.initial_interval;
    }

    pub(crate) fn record_failure(&mut self, responding_port: Option<u16>) -> u32 {
        self.discovered_port = responding_port;
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    pub(crate) fn record_success(&mut self, port: u16) {
        self.discovered_port = Some(port);
        self.consecutive_failures = 0;
    }

    /// True when the event is fresh and has not been reported yet.
    /// Stale events are not marked seen; they are simply ignored.
    pub(crate) fn should_report(&self, status: &UploadStatus, now: DateTime<Utc>) -> bool {
        if self.seen_event_keys.contains(&status.event_key()) {
            return false;
        }
        status.age_at(now) < self.config.freshness_window
    }

    pub(crate) fn mark_seen(&mut self, key: String) {
        self.seen_event_keys.insert(key);
    }
}
