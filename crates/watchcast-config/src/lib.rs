pub mod config;
pub mod paths;

pub use config::{
    Config, DiscordConfig, DisplayConfig, HistoryConfig, HttpConfig, SchedulerConfig, TmdbConfig, TraktConfig,
    MAX_CHECK_INTERVAL_SECS, MAX_LOOKBACK_HOURS, MAX_RETENTION_DAYS,
};
pub use paths::{PathManager, container_base_path};
