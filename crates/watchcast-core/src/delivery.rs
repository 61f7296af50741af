use chrono::Utc;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use watchcast_models::{EnrichedEvent, WatchEvent, WebhookMessage};
use watchcast_sources::{Enricher, Notifier};
use crate::format::Formatter;
use crate::history_store::HistoryStore;

/// Where an event is in its delivery lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Pending,
    Enriching,
    Formatting,
    Delivering,
    Committed,
    Failed,
}

impl fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryState::Pending => "pending",
            DeliveryState::Enriching => "enriching",
            DeliveryState::Formatting => "formatting",
            DeliveryState::Delivering => "delivering",
            DeliveryState::Committed => "committed",
            DeliveryState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Delivered and recorded
    Committed,
    /// Delivered, but the history write failed. A later cycle may deliver it again.
    DeliveredUnrecorded { error: String },
    /// Not delivered and not recorded, so the next cycle retries it
    Failed { error: String },
}

impl DeliveryOutcome {
    pub fn was_delivered(&self) -> bool {
        !matches!(self, DeliveryOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct EventReport {
    pub event_id: String,
    pub label: String,
    pub outcome: DeliveryOutcome,
    /// Whether metadata was attached
    pub enriched: bool,
    /// Every state the event passed through, in order
    pub states: Vec<DeliveryState>,
}

impl EventReport {
    pub fn final_state(&self) -> DeliveryState {
        self.states.last().copied().unwrap_or(DeliveryState::Pending)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub events: Vec<EventReport>,
}

impl DeliveryReport {
    pub fn committed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Committed))
    }

    pub fn unrecorded(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::DeliveredUnrecorded { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, DeliveryOutcome::Failed { .. }))
    }

    pub fn degraded(&self) -> usize {
        self.events.iter().filter(|e| !e.enriched).count()
    }

    fn count(&self, pred: impl Fn(&DeliveryOutcome) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Drives each new event through enrich, format, deliver and commit.
///
/// Events are handled one at a time in the order given. A record is written
/// only after the notifier confirms delivery.
pub struct DeliveryCoordinator<'a> {
    enricher: Option<&'a dyn Enricher>,
    notifier: &'a dyn Notifier,
    formatter: &'a Formatter,
    call_timeout: Duration,
    post_delay: Duration,
}

impl<'a> DeliveryCoordinator<'a> {
    pub fn new(
        enricher: Option<&'a dyn Enricher>,
        notifier: &'a dyn Notifier,
        formatter: &'a Formatter,
        call_timeout: Duration,
    ) -> Self {
        Self {
            enricher,
            notifier,
            formatter,
            call_timeout,
            post_delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive deliveries, to stay clear of webhook rate limits
    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = delay;
        self
    }

    pub async fn deliver_all<S>(&self, events: Vec<WatchEvent>, store: &mut S) -> DeliveryReport
    where
        S: HistoryStore + ?Sized,
    {
        let mut report = DeliveryReport::default();

        for (index, event) in events.into_iter().enumerate() {
            if index > 0 && !self.post_delay.is_zero() {
                tokio::time::sleep(self.post_delay).await;
            }
            report.events.push(self.deliver_one(event, &mut *store).await);
        }

        report
    }

    pub async fn deliver_one<S>(&self, event: WatchEvent, store: &mut S) -> EventReport
    where
        S: HistoryStore + ?Sized,
    {
        let mut states = vec![DeliveryState::Pending];
        let event_id = event.event_id.clone();
        let label = event.label();

        states.push(DeliveryState::Enriching);
        let enriched = self.enrich(event).await;
        let has_metadata = !enriched.is_degraded();

        states.push(DeliveryState::Formatting);
        let message = self.formatter.format(&enriched);

        states.push(DeliveryState::Delivering);
        if let Err(reason) = self.send(&event_id, &message).await {
            states.push(DeliveryState::Failed);
            return EventReport {
                event_id,
                label,
                outcome: DeliveryOutcome::Failed { error: reason },
                enriched: has_metadata,
                states,
            };
        }

        let outcome = match store.commit(&event_id, Utc::now()) {
            Ok(()) => {
                info!(
                    operation = "event_delivered",
                    event_id = %event_id,
                    title = %label,
                    enriched = has_metadata,
                    "Posted watch event"
                );
                states.push(DeliveryState::Committed);
                DeliveryOutcome::Committed
            }
            Err(e) => {
                error!(
                    event_id = %event_id,
                    stage = "commit",
                    error = %e,
                    "Delivered but could not record event; it may be posted again"
                );
                states.push(DeliveryState::Failed);
                DeliveryOutcome::DeliveredUnrecorded { error: e.to_string() }
            }
        };

        EventReport {
            event_id,
            label,
            outcome,
            enriched: has_metadata,
            states,
        }
    }

    /// Look up metadata for the event. Never fails: any problem yields a degraded event.
    pub async fn enrich(&self, event: WatchEvent) -> EnrichedEvent {
        let Some(enricher) = self.enricher else {
            return EnrichedEvent::degraded(event);
        };

        let result = tokio::time::timeout(
            self.call_timeout,
            enricher.enrich(event.media_type, &event.media),
        )
        .await;
        match result {
            Ok(Ok(Some(metadata))) => EnrichedEvent::new(event, Some(metadata)),
            Ok(Ok(None)) => {
                debug!(
                    event_id = %event.event_id,
                    source = enricher.source_name(),
                    "No metadata found"
                );
                EnrichedEvent::degraded(event)
            }
            Ok(Err(e)) => {
                warn!(
                    event_id = %event.event_id,
                    stage = "enrich",
                    error = %e,
                    "Metadata lookup failed, posting without it"
                );
                EnrichedEvent::degraded(event)
            }
            Err(_) => {
                warn!(
                    event_id = %event.event_id,
                    stage = "enrich",
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Metadata lookup timed out, posting without it"
                );
                EnrichedEvent::degraded(event)
            }
        }
    }

    async fn send(&self, event_id: &str, message: &WebhookMessage) -> Result<(), String> {
        match tokio::time::timeout(self.call_timeout, self.notifier.deliver(message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(
                    event_id = %event_id,
                    stage = "deliver",
                    destination = self.notifier.destination_name(),
                    error = %e,
                    "Delivery failed, will retry next check"
                );
                Err(e.to_string())
            }
            Err(_) => {
                warn!(
                    event_id = %event_id,
                    stage = "deliver",
                    destination = self.notifier.destination_name(),
                    timeout_ms = self.call_timeout.as_millis() as u64,
                    "Delivery timed out, will retry next check"
                );
                Err(format!(
                    "{} did not answer within {:?}",
                    self.notifier.destination_name(),
                    self.call_timeout
                ))
            }
        }
    }
}
