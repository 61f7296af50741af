pub mod cycle;
pub mod dedup;
pub mod delivery;
pub mod error;
pub mod format;
pub mod history_store;
pub mod retention;

#[cfg(test)]
pub(crate) mod testing;

pub use cycle::{CycleOptions, CycleReport, CycleRunner, CycleSettings};
pub use dedup::{partition_new, Partition};
pub use delivery::{DeliveryCoordinator, DeliveryOutcome, DeliveryReport, DeliveryState, EventReport};
pub use error::{CycleError, StoreError};
pub use format::{Formatter, RatingColor};
pub use history_store::{HistoryStore, JsonHistoryStore, JsonStoreProvider, StoreProvider};
pub use retention::RetentionSweeper;
