use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use tracing::{debug, info};
use watchcast_config::TraktConfig;
use watchcast_models::WatchEvent;
use crate::error::SourceError;
use crate::traits::HistoryFetcher;
use crate::trakt::api::TraktHistoryItem;

const SERVICE: &str = "trakt";

#[derive(Clone)]
pub struct TraktClient {
    client: Client,
    api_url: String,
    client_id: String,
    access_token: String,
    page_limit: u32,
    max_pages: u32,
}

impl TraktClient {
    pub fn new(client: Client, config: &TraktConfig) -> Result<Self, SourceError> {
        if config.client_id.is_empty() || config.access_token.is_empty() {
            return Err(SourceError::NotConfigured("Trakt"));
        }
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone(),
            access_token: config.access_token.clone(),
            page_limit: config.page_limit.max(1),
            max_pages: config.max_pages.max(1),
        })
    }

    async fn fetch_page(
        &self,
        start_at: &str,
        page: u32,
    ) -> Result<(Vec<TraktHistoryItem>, u32), SourceError> {
        let url = format!("{}/users/me/history", self.api_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("start_at", start_at.to_string()),
                ("limit", self.page_limit.to_string()),
                ("page", page.to_string()),
            ])
            .header("Authorization", format!("Bearer {}", self.access_token))
            .header("trakt-api-version", "2")
            .header("trakt-api-key", &self.client_id)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::http(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(SourceError::from_response(SERVICE, response).await);
        }

        let total_pages: u32 = response
            .headers()
            .get("X-Pagination-Page-Count")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(1);

        let items: Vec<TraktHistoryItem> = response
            .json()
            .await
            .map_err(|e| SourceError::http(SERVICE, e))?;

        Ok((items, total_pages))
    }
}

#[async_trait]
impl HistoryFetcher for TraktClient {
    fn source_name(&self) -> &str {
        SERVICE
    }

    /// Fetch everything watched since `since`. Trakt lists newest-first, so pages are
    /// collected in order and the whole window is reversed at the end.
    async fn fetch_history(&self, since: DateTime<Utc>) -> Result<Vec<WatchEvent>, SourceError> {
        let start_at = since.to_rfc3339_opts(SecondsFormat::Secs, true);
        info!(operation = "trakt_fetch", start_at = %start_at, "Fetching Trakt history");

        let mut newest_first = Vec::new();
        let mut page = 1;
        let mut skipped = 0;

        loop {
            let (items, total_pages) = self.fetch_page(&start_at, page).await?;
            let received = items.len();

            for item in items {
                match item.into_watch_event() {
                    Some(event) => newest_first.push(event),
                    None => skipped += 1,
                }
            }

            debug!(page, total_pages, received, "Fetched Trakt history page");

            if page >= total_pages || page >= self.max_pages || received == 0 {
                break;
            }
            page += 1;
        }

        newest_first.reverse();

        info!(
            operation = "trakt_fetch_complete",
            events = newest_first.len(),
            skipped,
            "Fetched Trakt history"
        );
        Ok(newest_first)
    }
}
