use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use watchcast_config::DiscordConfig;
use watchcast_models::WebhookMessage;
use crate::error::SourceError;
use crate::traits::Notifier;

const SERVICE: &str = "discord";

#[derive(Clone)]
pub struct DiscordWebhook {
    client: Client,
    webhook_url: String,
}

impl DiscordWebhook {
    pub fn new(client: Client, config: &DiscordConfig) -> Result<Self, SourceError> {
        if config.webhook_url.is_empty() {
            return Err(SourceError::NotConfigured("Discord webhook"));
        }
        Ok(Self {
            client,
            webhook_url: config.webhook_url.clone(),
        })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    fn destination_name(&self) -> &str {
        SERVICE
    }

    /// Execute the webhook. Any 2xx (Discord answers 204) is a confirmed delivery.
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), SourceError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|e| SourceError::http(SERVICE, e))?;

        if !response.status().is_success() {
            return Err(SourceError::from_response(SERVICE, response).await);
        }

        debug!(status = response.status().as_u16(), "Discord accepted webhook");
        Ok(())
    }
}
