use reqwest::Client;
use std::time::Duration;
use crate::error::SourceError;

const USER_AGENT: &str = concat!("watchcast/", env!("CARGO_PKG_VERSION"));

/// Shared client settings for all outbound calls. The timeout bounds every request
/// so a hung upstream cannot stall the scheduler.
pub fn create_http_client(timeout: Duration) -> Result<Client, SourceError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| SourceError::http("http-client", e))
}
