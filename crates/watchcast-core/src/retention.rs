use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use crate::error::StoreError;
use crate::history_store::HistoryStore;

/// Drops delivery records older than the retention horizon.
///
/// With no horizon records are kept forever.
#[derive(Debug, Clone, Copy)]
pub struct RetentionSweeper {
    horizon: Option<Duration>,
}

impl RetentionSweeper {
    pub fn new(horizon: Option<Duration>) -> Self {
        Self { horizon }
    }

    pub fn horizon(&self) -> Option<Duration> {
        self.horizon
    }

    /// Returns the number of records removed
    pub fn run<S>(&self, store: &mut S, now: DateTime<Utc>) -> Result<usize, StoreError>
    where
        S: HistoryStore + ?Sized,
    {
        let Some(horizon) = self.horizon else {
            debug!("Retention disabled, keeping all history records");
            return Ok(0);
        };

        // Nothing can be older than the earliest representable time
        let Some(cutoff) = now.checked_sub_signed(horizon) else {
            debug!(horizon_days = horizon.num_days(), "Retention horizon reaches past the earliest representable time, nothing to prune");
            return Ok(0);
        };
        let removed = store.prune(cutoff)?;
        if removed > 0 {
            info!(
                operation = "history_pruned",
                removed,
                cutoff = %cutoff.to_rfc3339(),
                "Pruned expired history records"
            );
        }
        Ok(removed)
    }
}
