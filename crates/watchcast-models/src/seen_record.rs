use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persistent marker that an event has been delivered.
///
/// `recorded_at` is when delivery was committed, not when the watch happened;
/// retention is measured against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeenRecord {
    pub event_id: String,
    pub recorded_at: DateTime<Utc>,
}
