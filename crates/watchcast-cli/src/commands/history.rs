use crate::output::Output;
use crate::HistoryCommands;
use chrono::Utc;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use watchcast_config::PathManager;
use watchcast_core::{HistoryStore, JsonHistoryStore, RetentionSweeper};
use super::load_config;

pub fn run_history(cmd: HistoryCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let history_file = paths.history_file();
    let mut store = JsonHistoryStore::open(&history_file)
        .map_err(|e| eyre!("Failed to open history: {}", e))?;

    match cmd {
        HistoryCommands::Stats => show_stats(&store, output),
        HistoryCommands::Prune { days } => {
            let horizon = match days {
                Some(days) => Some(chrono::Duration::days(i64::from(days))),
                None => load_config(&paths)?.retention_horizon(),
            };
            prune(&mut store, RetentionSweeper::new(horizon), output)
        }
        HistoryCommands::Forget { event_id } => forget(&mut store, &event_id, output),
    }
}

fn show_stats(store: &JsonHistoryStore, output: &Output) -> Result<()> {
    let records = store.records().map_err(|e| eyre!("{}", e))?;
    let oldest = records.iter().map(|r| r.recorded_at).min();
    let newest = records.iter().map(|r| r.recorded_at).max();

    output.json(&json!({
        "type": "history_stats",
        "path": store.path().display().to_string(),
        "records": records.len(),
        "oldest": oldest.map(|t| t.to_rfc3339()),
        "newest": newest.map(|t| t.to_rfc3339()),
    }));

    output.heading("Delivery history");
    output.field("File", store.path().display());
    output.field("Records", records.len());
    let fmt = |t: Option<chrono::DateTime<Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    output.field("Oldest", fmt(oldest));
    output.field("Newest", fmt(newest));
    Ok(())
}

fn prune(store: &mut JsonHistoryStore, sweeper: RetentionSweeper, output: &Output) -> Result<()> {
    let Some(horizon) = sweeper.horizon() else {
        output.warn("Retention is disabled; pass --days to prune anyway");
        return Ok(());
    };

    let removed = sweeper
        .run(store, Utc::now())
        .map_err(|e| eyre!("Pruning failed: {}", e))?;

    output.json(&json!({
        "type": "history_prune",
        "horizon_days": horizon.num_days(),
        "removed": removed,
        "remaining": store.len(),
    }));
    if output.is_human() {
        output.success(format!(
            "Removed {} record(s) older than {} days, {} remaining",
            removed,
            horizon.num_days(),
            store.len()
        ));
    }
    Ok(())
}

fn forget(store: &mut JsonHistoryStore, event_id: &str, output: &Output) -> Result<()> {
    let removed = store
        .forget(event_id)
        .map_err(|e| eyre!("Failed to update history: {}", e))?;

    output.json(&json!({ "type": "history_forget", "event_id": event_id, "removed": removed }));
    if output.is_human() {
        if removed {
            output.success(format!("Forgot {}; it will be posted again if still in the lookback window", event_id));
        } else {
            output.warn(format!("No record for {}", event_id));
        }
    }
    Ok(())
}
