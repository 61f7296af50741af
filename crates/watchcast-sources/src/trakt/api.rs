use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use watchcast_models::{MediaIds, MediaKind, MediaRef, WatchEvent};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TraktIds {
    pub trakt: Option<u64>,
    pub slug: Option<String>,
    pub imdb: Option<String>,
    pub tmdb: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct TraktMovie {
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: TraktIds,
}

#[derive(Debug, Deserialize)]
pub struct TraktShow {
    pub title: String,
    pub year: Option<u32>,
    #[serde(default)]
    pub ids: TraktIds,
}

#[derive(Debug, Deserialize)]
pub struct TraktEpisode {
    pub season: u32,
    pub number: u32,
    pub title: Option<String>,
}

/// One entry of `/users/{id}/history`. `id` is the history id, unique per watch.
#[derive(Debug, Deserialize)]
pub struct TraktHistoryItem {
    pub id: u64,
    pub watched_at: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub movie: Option<TraktMovie>,
    pub show: Option<TraktShow>,
    pub episode: Option<TraktEpisode>,
}

/// Remove slashes from IMDB ID (Trakt sometimes includes them)
fn clean_imdb_id(imdb: Option<String>) -> Option<String> {
    imdb.map(|s| s.replace('/', "")).filter(|s| !s.is_empty())
}

fn media_ids(ids: TraktIds) -> MediaIds {
    MediaIds {
        trakt: ids.trakt,
        slug: ids.slug,
        imdb: clean_imdb_id(ids.imdb),
        tmdb: ids.tmdb,
    }
}

impl TraktHistoryItem {
    /// Convert to a watch event. Returns `None` for entries we cannot describe
    /// (unknown type, missing payload, unparseable timestamp).
    pub fn into_watch_event(self) -> Option<WatchEvent> {
        let watched_at = match DateTime::parse_from_rfc3339(&self.watched_at) {
            Ok(at) => at.with_timezone(&Utc),
            Err(e) => {
                warn!(
                    history_id = self.id,
                    watched_at = %self.watched_at,
                    "Skipping Trakt history entry with unparseable watched_at: {}",
                    e
                );
                return None;
            }
        };

        match self.item_type.as_str() {
            "movie" => {
                let Some(movie) = self.movie else {
                    debug!(history_id = self.id, "Skipping movie history entry without movie data");
                    return None;
                };
                let media = MediaRef::movie(movie.title, movie.year).with_ids(media_ids(movie.ids));
                Some(WatchEvent::new(self.id.to_string(), MediaKind::Movie, media, watched_at))
            }
            "episode" => {
                let (Some(show), Some(episode)) = (self.show, self.episode) else {
                    debug!(history_id = self.id, "Skipping episode history entry without show or episode data");
                    return None;
                };
                let mut media = MediaRef::episode(show.title, episode.season, episode.number)
                    .with_ids(media_ids(show.ids));
                media.year = show.year;
                media.episode_title = episode.title.filter(|t| !t.is_empty());
                Some(WatchEvent::new(self.id.to_string(), MediaKind::Episode, media, watched_at))
            }
            other => {
                debug!(history_id = self.id, item_type = other, "Skipping unsupported Trakt history type");
                None
            }
        }
    }
}
