use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde_json::json;
use watchcast_config::PathManager;
use watchcast_core::CycleOptions;
use super::{build_runner, load_config, print_report};

pub async fn run_check(dry_run: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config = load_config(&paths)?;
    let runner = build_runner(&config, &paths)?;

    let report = runner
        .run_cycle(CycleOptions { dry_run })
        .await
        .map_err(|e| eyre!("Check failed: {}", e))?;

    if !dry_run {
        print_report(&report, output);
        return Ok(());
    }

    if !output.is_human() {
        output.json(&json!({
            "type": "dry_run",
            "fetched": report.fetched,
            "already_delivered": report.already_delivered,
            "messages": report.previews,
        }));
        return Ok(());
    }

    if report.previews.is_empty() {
        output.info(format!(
            "Dry run: nothing new ({} fetched, {} already posted)",
            report.fetched, report.already_delivered
        ));
        return Ok(());
    }

    output.heading(&format!("Dry run: {} message(s) would be posted", report.previews.len()));
    for message in &report.previews {
        for embed in &message.embeds {
            output.info("");
            output.info(&embed.title);
            output.info(&embed.description);
            for field in &embed.fields {
                output.field(&field.name, &field.value);
            }
        }
    }
    Ok(())
}
