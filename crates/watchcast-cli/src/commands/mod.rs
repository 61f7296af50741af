pub mod check;
pub mod config;
pub mod history;
pub mod run;

use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::{json, Value};
use tracing::error;
use watchcast_config::{Config, PathManager};
use watchcast_core::{CycleReport, CycleRunner, CycleSettings, DeliveryOutcome, Formatter, JsonStoreProvider};
use watchcast_sources::SourceSet;

/// Load the configuration file (if any) with environment overrides applied
pub(crate) fn load_config(paths: &PathManager) -> Result<Config> {
    let config_file = paths.config_file();
    Config::load(&config_file).map_err(|e| eyre!("{}", e))
}

/// Validate the configuration and wire up everything a cycle needs
pub(crate) fn build_runner(config: &Config, paths: &PathManager) -> Result<CycleRunner<JsonStoreProvider>> {
    if let Err(e) = config.validate() {
        error!(operation = "config_invalid", error = %e, "Refusing to start: configuration is incomplete");
        return Err(eyre!("Invalid configuration: {}", e));
    }

    let sources = SourceSet::from_config(config).map_err(|e| eyre!("Failed to create clients: {}", e))?;
    let formatter = Formatter::from_config(config).map_err(|e| eyre!("{}", e))?;
    let provider = JsonStoreProvider::new(paths.history_file());

    Ok(CycleRunner::new(
        sources,
        formatter,
        provider,
        CycleSettings::from_config(config),
    ))
}

pub(crate) fn report_json(report: &CycleReport) -> Value {
    let events: Vec<Value> = report
        .delivery
        .events
        .iter()
        .map(|e| {
            let (outcome, error) = match &e.outcome {
                DeliveryOutcome::Committed => ("committed", None),
                DeliveryOutcome::DeliveredUnrecorded { error } => ("delivered_unrecorded", Some(error)),
                DeliveryOutcome::Failed { error } => ("failed", Some(error)),
            };
            json!({
                "event_id": e.event_id,
                "title": e.label,
                "outcome": outcome,
                "enriched": e.enriched,
                "error": error,
            })
        })
        .collect();

    json!({
        "type": "check",
        "since": report.since.to_rfc3339(),
        "fetched": report.fetched,
        "already_delivered": report.already_delivered,
        "duplicates_in_batch": report.duplicates_in_batch,
        "unreadable": report.unreadable,
        "delivered": report.delivery.committed(),
        "failed": report.delivery.failed(),
        "unrecorded": report.delivery.unrecorded(),
        "pruned": report.pruned,
        "events": events,
    })
}

pub(crate) fn print_report(report: &CycleReport, output: &Output) {
    if !output.is_human() {
        output.json(&report_json(report));
        return;
    }

    for event in &report.delivery.events {
        match &event.outcome {
            DeliveryOutcome::Committed => output.success(format!("Posted {}", event.label)),
            DeliveryOutcome::DeliveredUnrecorded { error } => {
                output.warn(format!("Posted {} but could not record it: {}", event.label, error))
            }
            DeliveryOutcome::Failed { error } => {
                output.error(format!("Failed to post {}: {}", event.label, error))
            }
        }
    }

    let delivery = &report.delivery;
    if report.fetched == 0 {
        output.info("No watches in the lookback window");
    } else if delivery.events.is_empty() {
        output.info(format!("No new watches ({} already posted)", report.already_delivered));
    } else {
        output.info(format!(
            "{} posted, {} failed, {} already posted",
            delivery.committed() + delivery.unrecorded(),
            delivery.failed(),
            report.already_delivered
        ));
    }
    if !report.unreadable.is_empty() {
        output.warn(format!(
            "{} event(s) skipped because the history could not be read",
            report.unreadable.len()
        ));
    }
}
