use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};
use watchcast_config::Config;
use watchcast_models::WebhookMessage;
use watchcast_sources::SourceSet;
use crate::dedup::partition_new;
use crate::delivery::{DeliveryCoordinator, DeliveryReport};
use crate::error::CycleError;
use crate::format::Formatter;
use crate::history_store::StoreProvider;
use crate::retention::RetentionSweeper;

/// The parts of the configuration a cycle depends on
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub lookback: chrono::Duration,
    pub retention: Option<chrono::Duration>,
    /// Upper bound for each enrichment and delivery call
    pub call_timeout: Duration,
    pub post_delay: Duration,
}

impl CycleSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lookback: config.lookback(),
            retention: config.retention_horizon(),
            call_timeout: config.http_timeout(),
            post_delay: config.post_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    /// Fetch, dedup and format only. Nothing is delivered, recorded or pruned.
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub since: DateTime<Utc>,
    pub fetched: usize,
    pub already_delivered: usize,
    pub duplicates_in_batch: usize,
    pub unreadable: Vec<String>,
    pub delivery: DeliveryReport,
    /// `None` when pruning was skipped or failed
    pub pruned: Option<usize>,
    /// Messages that would have been sent, filled only on dry runs
    pub previews: Vec<WebhookMessage>,
}

/// Runs one fetch, dedup, deliver, prune pass.
///
/// The history store is opened at the start of each cycle and dropped when the
/// cycle returns, whatever the exit path.
pub struct CycleRunner<P: StoreProvider> {
    sources: SourceSet,
    formatter: Formatter,
    provider: P,
    settings: CycleSettings,
}

impl<P: StoreProvider> CycleRunner<P> {
    pub fn new(sources: SourceSet, formatter: Formatter, provider: P, settings: CycleSettings) -> Self {
        Self {
            sources,
            formatter,
            provider,
            settings,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    pub async fn run_cycle(&self, options: CycleOptions) -> Result<CycleReport, CycleError> {
        let started_at = Utc::now();
        let since = started_at
            .checked_sub_signed(self.settings.lookback)
            .ok_or(CycleError::LookbackOutOfRange {
                hours: self.settings.lookback.num_hours(),
            })?;
        info!(
            operation = "cycle_started",
            since = %since.to_rfc3339(),
            dry_run = options.dry_run,
            "Checking watch history"
        );

        let events = self
            .sources
            .fetcher
            .fetch_history(since)
            .await
            .map_err(|e| {
                error!(
                    stage = "fetch",
                    source = self.sources.fetcher.source_name(),
                    error = %e,
                    "Could not fetch watch history; nothing delivered this cycle"
                );
                e
            })?;
        let fetched = events.len();

        let opened = if options.dry_run {
            self.provider.open_read_only()
        } else {
            self.provider.open()
        };
        let mut store = opened.map_err(|e| {
            error!(stage = "store", error = %e, "Could not open history store; nothing delivered this cycle");
            e
        })?;

        let partition = partition_new(events, &store);
        info!(
            operation = "history_checked",
            fetched,
            new = partition.fresh.len(),
            already_delivered = partition.already_delivered,
            duplicates = partition.duplicates_in_batch,
            unreadable = partition.unreadable.len(),
            "Deduplicated watch history"
        );

        let coordinator = DeliveryCoordinator::new(
            self.sources.enricher.as_deref(),
            &*self.sources.notifier,
            &self.formatter,
            self.settings.call_timeout,
        )
        .with_post_delay(self.settings.post_delay);

        let mut report = CycleReport {
            started_at,
            since,
            fetched,
            already_delivered: partition.already_delivered,
            duplicates_in_batch: partition.duplicates_in_batch,
            unreadable: partition.unreadable,
            delivery: DeliveryReport::default(),
            pruned: None,
            previews: Vec::new(),
        };

        if options.dry_run {
            for event in partition.fresh {
                let enriched = coordinator.enrich(event).await;
                report.previews.push(self.formatter.format(&enriched));
            }
            return Ok(report);
        }

        report.delivery = coordinator.deliver_all(partition.fresh, &mut store).await;

        let sweeper = RetentionSweeper::new(self.settings.retention);
        report.pruned = match sweeper.run(&mut store, Utc::now()) {
            Ok(removed) => Some(removed),
            Err(e) => {
                warn!(stage = "retention", error = %e, "Pruning history failed, will retry next cycle");
                None
            }
        };

        info!(
            operation = "cycle_finished",
            delivered = report.delivery.committed(),
            failed = report.delivery.failed(),
            unrecorded = report.delivery.unrecorded(),
            pruned = report.pruned.unwrap_or(0),
            "Check complete"
        );
        Ok(report)
    }
}
