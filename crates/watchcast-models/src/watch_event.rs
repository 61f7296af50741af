use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::{MediaKind, MediaRef};

/// A single watch action reported by the tracking service.
///
/// `event_id` comes from the upstream history entry, so two watches of the same
/// title carry different ids while re-fetching the same watch yields the same id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchEvent {
    pub event_id: String,
    pub media_type: MediaKind,
    pub media: MediaRef,
    pub watched_at: DateTime<Utc>,
}

impl WatchEvent {
    pub fn new(
        event_id: impl Into<String>,
        media_type: MediaKind,
        media: MediaRef,
        watched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            media_type,
            media,
            watched_at,
        }
    }

    /// Short human label used in log lines, e.g. `Dune (2021)` or `Severance S02E03`
    pub fn label(&self) -> String {
        match self.media_type {
            MediaKind::Movie => match self.media.year {
                Some(year) => format!("{} ({})", self.media.title, year),
                None => self.media.title.clone(),
            },
            MediaKind::Episode => format!(
                "{} S{:02}E{:02}",
                self.media.title,
                self.media.season.unwrap_or(0),
                self.media.episode.unwrap_or(0)
            ),
        }
    }
}
