use chrono::{DateTime, Utc};
use std::time::Duration;

/// One decoded snapshot of the `/latest_upload.json` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStatus {
    /// Timestamp string exactly as the server sent it; used for dedup keys.
    pub raw_timestamp: String,
    /// The same timestamp, parsed, for freshness checks.
    pub timestamp: DateTime<Utc>,
    pub kind: StatusKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusKind {
    /// Upload in progress; no link yet.
    Loading,
    /// Upload finished; the share link is available.
    Complete { link: String },
    /// The server reported the upload failed.
    Failed { message: String },
}

impl UploadStatus {
    /// Dedup key: `{timestamp}_{link}` once a link exists, `{timestamp}_loading`
    /// otherwise. A loading and a completed event for the same timestamp are
    /// distinct events and both get reported.
    pub fn event_key(&self) -> String {
        match &self.kind {
            StatusKind::Complete { link } => format!("{}_{}", self.raw_timestamp, link),
            StatusKind::Loading | StatusKind::Failed { .. } => {
                format!("{}_loading", self.raw_timestamp)
            }
        }
    }

    /// Age of the event at `now`. Timestamps in the future count as age zero
    /// rather than an error; server and client clocks are not the same clock.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        (now - self.timestamp).to_std().unwrap_or(Duration::ZERO)
    }
}
