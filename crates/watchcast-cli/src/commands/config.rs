use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use owo_colors::OwoColorize;
use serde_json::json;
use watchcast_config::{Config, PathManager};
use super::load_config;

pub fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    match cmd {
        ConfigCommands::Show => show_config(&paths, output),
        ConfigCommands::Init { force } => init_config(&paths, force, output),
    }
}

fn show_config(paths: &PathManager, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    let config = load_config(paths)?;
    let masked = config.masked();
    let problems = config.validate().err().map(|e| e.to_string());

    output.json(&json!({
        "type": "config",
        "path": config_file.display().to_string(),
        "file_exists": config_file.exists(),
        "valid": problems.is_none(),
        "problem": problems,
        "config": masked,
    }));
    if !output.is_human() {
        return Ok(());
    }

    if !config_file.exists() {
        output.warn(format!(
            "No configuration file at {}; showing defaults and environment overrides",
            config_file.display()
        ));
    }

    output.heading("Trakt");
    output.field("Client ID", or_unset(&masked.trakt.client_id));
    output.field("Access token", or_unset(&masked.trakt.access_token));
    output.field("API URL", &masked.trakt.api_url);

    output.heading("TMDB");
    output.field("Enrichment", enabled(config.is_tmdb_configured()));
    output.field("API key", or_unset(&masked.tmdb.api_key));

    output.heading("Discord");
    output.field("Webhook", or_unset(&masked.discord.webhook_url));
    output.field("Footer", &masked.discord.footer_text);
    output.field("Post delay", format!("{}ms", masked.discord.post_delay_ms));

    output.heading("Schedule");
    output.field("Interval", format!("{}s", masked.scheduler.check_interval_secs));
    output.field("Lookback", format!("{}h", masked.scheduler.lookback_hours));
    output.field("Run on startup", enabled(masked.scheduler.run_on_startup));
    output.field(
        "Retention",
        match config.retention_horizon() {
            Some(h) => format!("{} days", h.num_days()),
            None => "keep forever".to_string(),
        },
    );
    output.field("Timezone", &masked.display.timezone);
    output.field("History file", paths.history_file().display());

    match problems {
        None => output.success("Configuration is complete"),
        Some(problem) => output.warn(problem),
    }
    Ok(())
}

fn init_config(paths: &PathManager, force: bool, output: &Output) -> Result<()> {
    let config_file = paths.config_file();
    if config_file.exists() && !force {
        return Err(eyre!(
            "{} already exists (use --force to overwrite)",
            config_file.display()
        ));
    }

    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;

    output.json(&json!({ "type": "config_init", "path": config_file.display().to_string() }));
    if output.is_human() {
        output.success(format!("Wrote default configuration to {}", config_file.display()));
        output.info("Fill in the Trakt credentials and Discord webhook URL, or set TRAKT_CLIENT_ID, TRAKT_ACCESS_TOKEN and DISCORD_WEBHOOK_URL.");
    }
    Ok(())
}

fn or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".red().to_string()
    } else {
        value.to_string()
    }
}

fn enabled(on: bool) -> String {
    if on {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}
