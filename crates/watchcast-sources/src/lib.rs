pub mod discord;
pub mod error;
pub mod factory;
pub mod http;
pub mod tmdb;
pub mod traits;
pub mod trakt;

pub use discord::DiscordWebhook;
pub use error::SourceError;
pub use factory::SourceSet;
pub use http::create_http_client;
pub use tmdb::TmdbClient;
pub use traits::{Enricher, HistoryFetcher, Notifier};
pub use trakt::TraktClient;
