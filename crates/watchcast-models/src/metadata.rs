use serde::{Deserialize, Serialize};
use crate::watch_event::WatchEvent;

/// Supplementary details from the metadata service. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    /// Poster path relative to the image CDN (show poster for episodes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    /// Backdrop for movies, still frame for episodes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

/// A watch event joined with whatever metadata could be found for it
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEvent {
    pub event: WatchEvent,
    pub metadata: Option<Metadata>,
}

impl EnrichedEvent {
    pub fn new(event: WatchEvent, metadata: Option<Metadata>) -> Self {
        Self { event, metadata }
    }

    pub fn degraded(event: WatchEvent) -> Self {
        Self { event, metadata: None }
    }

    pub fn is_degraded(&self) -> bool {
        self.metadata.is_none()
    }
}
