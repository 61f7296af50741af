use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use watchcast_config::TmdbConfig;
use watchcast_models::{MediaKind, MediaRef, Metadata};
use crate::error::SourceError;
use crate::tmdb::api::{TmdbEpisode, TmdbMovie, TmdbShow};
use crate::traits::Enricher;

const SERVICE: &str = "tmdb";

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(client: Client, config: &TmdbConfig) -> Result<Self, SourceError> {
        if config.api_key.is_empty() {
            return Err(SourceError::NotConfigured("TMDB"));
        }
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// GET a TMDB resource. 404 maps to `Ok(None)`.
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SourceError> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| SourceError::http(SERVICE, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(path, "TMDB has no entry");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(SourceError::from_response(SERVICE, response).await);
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| SourceError::http(SERVICE, e))
    }

    pub async fn movie(&self, tmdb_id: u32) -> Result<Option<Metadata>, SourceError> {
        let movie: Option<TmdbMovie> = self.get(&format!("/movie/{}", tmdb_id)).await?;
        Ok(movie.map(Metadata::from))
    }

    /// Episode details plus the show poster. A failed poster lookup only loses the poster.
    pub async fn episode(
        &self,
        show_id: u32,
        season: u32,
        episode: u32,
    ) -> Result<Option<Metadata>, SourceError> {
        let details: Option<TmdbEpisode> = self
            .get(&format!("/tv/{}/season/{}/episode/{}", show_id, season, episode))
            .await?;
        let Some(details) = details else {
            return Ok(None);
        };

        let show_poster = match self.get::<TmdbShow>(&format!("/tv/{}", show_id)).await {
            Ok(show) => show.and_then(|s| s.poster_path),
            Err(e) => {
                debug!(show_id, error = %e, "TMDB show lookup failed, continuing without poster");
                None
            }
        };

        Ok(Some(details.into_metadata(show_poster)))
    }
}

#[async_trait]
impl Enricher for TmdbClient {
    fn source_name(&self) -> &str {
        SERVICE
    }

    async fn enrich(&self, kind: MediaKind, media: &MediaRef) -> Result<Option<Metadata>, SourceError> {
        let Some(tmdb_id) = media.ids.tmdb else {
            return Ok(None);
        };
        match kind {
            MediaKind::Movie => self.movie(tmdb_id).await,
            MediaKind::Episode => match (media.season, media.episode) {
                (Some(season), Some(episode)) => self.episode(tmdb_id, season, episode).await,
                _ => Ok(None),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::create_http_client;
    use httpmock::prelude::*;
    use std::time::Duration;
    use watchcast_models::MediaIds;

    fn client(server: &MockServer) -> TmdbClient {
        let config = TmdbConfig {
            enabled: true,
            api_key: "key".to_string(),
            api_url: server.base_url(),
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
        };
        TmdbClient::new(create_http_client(Duration::from_secs(5)).unwrap(), &config).unwrap()
    }

    fn with_tmdb(media: MediaRef, id: u32) -> MediaRef {
        media.with_ids(MediaIds { tmdb: Some(id), ..MediaIds::default() })
    }

    #[tokio::test]
    async fn test_movie_metadata() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/movie/438631").query_param("api_key", "key");
                then.status(200).body(
                    r#"{"overview":"Spice.","poster_path":"/dune.jpg","backdrop_path":"/sand.jpg",
                        "vote_average":7.8,"runtime":155,"genres":[{"id":1,"name":"Science Fiction"}]}"#,
                );
            })
            .await;

        let media = with_tmdb(MediaRef::movie("Dune", Some(2021)), 438631);
        let metadata = client(&server).enrich(MediaKind::Movie, &media).await.unwrap().unwrap();

        mock.assert_async().await;
        assert_eq!(metadata.overview.as_deref(), Some("Spice."));
        assert_eq!(metadata.image_path.as_deref(), Some("/sand.jpg"));
        assert_eq!(metadata.runtime_minutes, Some(155));
        assert_eq!(metadata.rating, Some(7.8));
    }

    #[tokio::test]
    async fn test_episode_metadata_survives_show_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tv/95396/season/1/episode/4");
                then.status(200)
                    .body(r#"{"overview":"Mark goes to a party.","still_path":"/still.jpg","vote_average":8.4,"runtime":54}"#);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/tv/95396");
                then.status(500);
            })
            .await;

        let media = with_tmdb(MediaRef::episode("Severance", 1, 4), 95396);
        let metadata = client(&server).enrich(MediaKind::Episode, &media).await.unwrap().unwrap();

        assert_eq!(metadata.poster_path, None);
        assert_eq!(metadata.image_path.as_deref(), Some("/still.jpg"));
        assert_eq!(metadata.runtime_minutes, Some(54));
    }

    #[tokio::test]
    async fn test_not_found_and_missing_id_are_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/movie/1");
                then.status(404);
            })
            .await;

        let tmdb = client(&server);
        let missing = with_tmdb(MediaRef::movie("Gone", None), 1);
        assert!(tmdb.enrich(MediaKind::Movie, &missing).await.unwrap().is_none());

        let no_id = MediaRef::movie("Unknown", None);
        assert!(tmdb.enrich(MediaKind::Movie, &no_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_err() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/movie/2");
                then.status(503);
            })
            .await;

        let media = with_tmdb(MediaRef::movie("Busy", None), 2);
        assert!(client(&server).enrich(MediaKind::Movie, &media).await.is_err());
    }
}
