//! Builds the fetcher, enricher and notifier from configuration.
//!
//! All three share one HTTP client so the configured timeout applies everywhere.

use tracing::info;
use watchcast_config::Config;
use crate::discord::DiscordWebhook;
use crate::error::SourceError;
use crate::http::create_http_client;
use crate::tmdb::TmdbClient;
use crate::traits::{Enricher, HistoryFetcher, Notifier};
use crate::trakt::TraktClient;

pub struct SourceSet {
    pub fetcher: Box<dyn HistoryFetcher>,
    /// `None` when enrichment is disabled or has no API key
    pub enricher: Option<Box<dyn Enricher>>,
    pub notifier: Box<dyn Notifier>,
}

impl SourceSet {
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = create_http_client(config.http_timeout())?;

        let fetcher = TraktClient::new(client.clone(), &config.trakt)?;
        let notifier = DiscordWebhook::new(client.clone(), &config.discord)?;

        let enricher: Option<Box<dyn Enricher>> = if config.is_tmdb_configured() {
            Some(Box::new(TmdbClient::new(client, &config.tmdb)?))
        } else {
            info!(
                operation = "enrichment_disabled",
                "TMDB enrichment is disabled or has no API key; notifications will carry no metadata"
            );
            None
        };

        Ok(Self {
            fetcher: Box::new(fetcher),
            enricher,
            notifier: Box::new(notifier),
        })
    }
}
