use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// One year
pub const MAX_CHECK_INTERVAL_SECS: u64 = 365 * 24 * 60 * 60;
pub const MAX_LOOKBACK_HOURS: u32 = 365 * 24;
/// About a century
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trakt: TraktConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraktConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_trakt_api_url")]
    pub api_url: String,
    /// Items requested per history page
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_tmdb_api_url")]
    pub api_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_footer_text")]
    pub footer_text: String,
    /// Pause between consecutive posts within one check
    #[serde(default = "default_post_delay_ms")]
    pub post_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u32,
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Records older than this many days are pruned. `None` or 0 keeps them forever.
    #[serde(default = "default_retention_days")]
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA timezone name used when rendering watch times
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_trakt_api_url() -> String {
    "https://api.trakt.tv".to_string()
}

fn default_page_limit() -> u32 {
    50
}

fn default_max_pages() -> u32 {
    5
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}

fn default_footer_text() -> String {
    "Trakt".to_string()
}

fn default_post_delay_ms() -> u64 {
    500
}

fn default_check_interval_secs() -> u64 {
    3600 // 1 hour
}

fn default_lookback_hours() -> u32 {
    12
}

fn default_retention_days() -> Option<u32> {
    Some(90)
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for TraktConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            access_token: String::new(),
            api_url: default_trakt_api_url(),
            page_limit: default_page_limit(),
            max_pages: default_max_pages(),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            api_key: String::new(),
            api_url: default_tmdb_api_url(),
            image_base_url: default_tmdb_image_base_url(),
        }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            footer_text: default_footer_text(),
            post_delay_ms: default_post_delay_ms(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            lookback_hours: default_lookback_hours(),
            run_on_startup: default_true(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, fall back to defaults otherwise, then apply
    /// environment overrides. Container deployments often have no file at all.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)
                .map_err(|e| anyhow!("Failed to load config from {}: {}", path.display(), e))?
        } else {
            Self::default()
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps an environment variable name to its value
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TRAKT_CLIENT_ID") {
            self.trakt.client_id = v;
        }
        if let Some(v) = get("TRAKT_ACCESS_TOKEN") {
            self.trakt.access_token = v;
        }
        if let Some(v) = get("DISCORD_WEBHOOK_URL") {
            self.discord.webhook_url = v;
        }
        if let Some(v) = get("TMDB_API_KEY") {
            self.tmdb.api_key = v;
        }
        if let Some(v) = get("CHECK_INTERVAL") {
            self.scheduler.check_interval_secs = v
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid CHECK_INTERVAL '{}': {}", v, e))?;
        }
        if let Some(v) = get("LOOKBACK_HOURS") {
            self.scheduler.lookback_hours = v
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid LOOKBACK_HOURS '{}': {}", v, e))?;
        }
        if let Some(v) = get("RETENTION_DAYS") {
            let days: u32 = v
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid RETENTION_DAYS '{}': {}", v, e))?;
            self.history.retention_days = Some(days);
        }
        if let Some(v) = get("TZ") {
            self.display.timezone = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.trakt.client_id.is_empty() || self.trakt.access_token.is_empty() {
            return Err(anyhow!("Trakt credentials are not configured (client_id and access_token are required)"));
        }
        if self.discord.webhook_url.is_empty() {
            return Err(anyhow!("Discord webhook_url is not configured"));
        }
        if self.scheduler.check_interval_secs == 0 {
            return Err(anyhow!("check_interval_secs must be greater than zero"));
        }
        if self.scheduler.check_interval_secs > MAX_CHECK_INTERVAL_SECS {
            return Err(anyhow!(
                "check_interval_secs must be at most {} (one year)",
                MAX_CHECK_INTERVAL_SECS
            ));
        }
        if self.scheduler.lookback_hours == 0 {
            return Err(anyhow!("lookback_hours must be greater than zero"));
        }
        if self.scheduler.lookback_hours > MAX_LOOKBACK_HOURS {
            return Err(anyhow!("lookback_hours must be at most {}", MAX_LOOKBACK_HOURS));
        }
        if matches!(self.history.retention_days, Some(days) if days > MAX_RETENTION_DAYS) {
            return Err(anyhow!(
                "retention_days must be at most {} (use 0 to keep records forever)",
                MAX_RETENTION_DAYS
            ));
        }
        if self.trakt.page_limit == 0 || self.trakt.max_pages == 0 {
            return Err(anyhow!("page_limit and max_pages must be greater than zero"));
        }
        self.display_timezone()?;
        Ok(())
    }

    pub fn is_tmdb_configured(&self) -> bool {
        self.tmdb.enabled && !self.tmdb.api_key.is_empty()
    }

    pub fn check_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.scheduler.check_interval_secs)
    }

    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.scheduler.lookback_hours))
    }

    /// `None` means records are kept forever
    pub fn retention_horizon(&self) -> Option<chrono::Duration> {
        match self.history.retention_days {
            Some(days) if days > 0 => Some(chrono::Duration::days(i64::from(days))),
            _ => None,
        }
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http.timeout_secs)
    }

    pub fn post_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.discord.post_delay_ms)
    }

    pub fn display_timezone(&self) -> Result<Tz> {
        Tz::from_str(self.display.timezone.trim())
            .map_err(|_| anyhow!("Unknown timezone: {}", self.display.timezone))
    }

    /// Copy with secrets replaced, for display
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.trakt.client_id = mask(&copy.trakt.client_id);
        copy.trakt.access_token = mask(&copy.trakt.access_token);
        copy.tmdb.api_key = mask(&copy.tmdb.api_key);
        copy.discord.webhook_url = mask_url(&copy.discord.webhook_url);
        copy
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}

// Keep scheme and host so the destination stays recognisable
fn mask_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    match url.find("://") {
        Some(scheme_end) => {
            let rest = &url[scheme_end + 3..];
            let host_end = rest.find('/').unwrap_or(rest.len());
            format!("{}/****", &url[..scheme_end + 3 + host_end])
        }
        None => mask(url),
    }
}
