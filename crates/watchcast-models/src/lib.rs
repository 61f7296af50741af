pub mod media;
pub mod metadata;
pub mod notification;
pub mod seen_record;
pub mod watch_event;

pub use media::{MediaIds, MediaKind, MediaRef};
pub use metadata::{EnrichedEvent, Metadata};
pub use notification::{Embed, EmbedField, EmbedFooter, EmbedImage, WebhookMessage};
pub use seen_record::SeenRecord;
pub use watch_event::WatchEvent;
