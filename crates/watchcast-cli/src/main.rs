use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{check, config, history, run};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchcast")]
#[command(about = "Watchcast - Post what you watch on Trakt to Discord")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check for new watches on a fixed interval until stopped
    #[command(long_about = "Run the scheduler loop. Every interval the watch history is fetched, new events are posted to the webhook and recorded, and old records are pruned. A check always finishes before the next one starts. Stops on Ctrl-C or SIGTERM.")]
    Run {
        /// Seconds between checks (overrides configuration)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,

        /// Wait a full interval before the first check
        #[arg(long, action = ArgAction::SetTrue)]
        no_startup_check: bool,

        /// Also write logs to the rotating daemon log file
        #[arg(long, action = ArgAction::SetTrue)]
        log_file: bool,
    },
    /// Run a single check and exit
    Check {
        /// Fetch, deduplicate and format only; print the messages instead of posting them
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Inspect or maintain the delivered-event history
    History {
        #[command(subcommand)]
        cmd: HistoryCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Record count and age range
    Stats,
    /// Remove records older than the retention horizon
    Prune {
        /// Horizon in days (defaults to the configured retention)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(watchcast_config::MAX_RETENTION_DAYS)))]
        days: Option<u32>,
    },
    /// Remove one record so the event is posted again on the next check
    Forget {
        event_id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration with secrets masked
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Run { log_file: true, .. } => {
            Some(watchcast_config::PathManager::default().daemon_log_file())
        }
        _ => None,
    };
    logging::init_logging_with_file(cli.verbose, cli.quiet, log_file)
        .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Run {
            interval,
            no_startup_check,
            log_file: _,
        } => run::run_scheduler(interval, no_startup_check, &output).await,
        Commands::Check { dry_run } => check::run_check(dry_run, &output).await,
        Commands::History { cmd } => history::run_history(cmd, &output),
        Commands::Config { cmd } => config::run_config(cmd, &output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_days_is_bounded() {
        let parsed = Cli::try_parse_from(["watchcast", "history", "prune", "--days", "30"]).unwrap();
        assert!(matches!(
            parsed.command,
            Commands::History {
                cmd: HistoryCommands::Prune { days: Some(30) }
            }
        ));

        assert!(Cli::try_parse_from(["watchcast", "history", "prune", "--days", "4000000000"]).is_err());
        assert!(Cli::try_parse_from(["watchcast", "history", "prune", "--days", "0"]).is_err());
    }
}
