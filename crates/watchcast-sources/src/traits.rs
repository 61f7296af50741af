use async_trait::async_trait;
use chrono::{DateTime, Utc};
use watchcast_models::{MediaKind, MediaRef, Metadata, WatchEvent, WebhookMessage};
use crate::error::SourceError;

/// Source of watch events.
///
/// Implementations return events oldest-first. A failed fetch must be an `Err`,
/// never an empty list, so callers can tell "nothing new" from "could not look".
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    fn source_name(&self) -> &str;

    async fn fetch_history(&self, since: DateTime<Utc>) -> Result<Vec<WatchEvent>, SourceError>;
}

/// Source of supplementary metadata.
///
/// `Ok(None)` means the service has nothing for this item (no usable id, or not found).
#[async_trait]
pub trait Enricher: Send + Sync {
    fn source_name(&self) -> &str;

    async fn enrich(&self, kind: MediaKind, media: &MediaRef) -> Result<Option<Metadata>, SourceError>;
}

/// Destination for formatted notifications. `Ok(())` means the endpoint confirmed receipt.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn destination_name(&self) -> &str;

    async fn deliver(&self, message: &WebhookMessage) -> Result<(), SourceError>;
}
