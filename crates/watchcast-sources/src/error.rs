use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request timed out")]
    Timeout { service: &'static str },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl SourceError {
    /// Classify a transport error, keeping timeouts distinguishable in logs
    pub fn http(service: &'static str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            SourceError::Timeout { service }
        } else if source.is_decode() {
            SourceError::Decode {
                service,
                message: source.to_string(),
            }
        } else {
            SourceError::Http { service, source }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, SourceError::Timeout { .. })
    }

    /// Build a `Status` error from a non-success response, consuming its body
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        SourceError::Status {
            service,
            status,
            body: truncate(&body, 300),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}
