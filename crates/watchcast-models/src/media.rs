use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Episode,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Episode => "episode",
        }
    }
}

/// External identifiers reported by the tracking service for a movie or show
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaIds {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trakt: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<u32>,
}

impl MediaIds {
    pub fn is_empty(&self) -> bool {
        self.trakt.is_none() && self.slug.is_none() && self.imdb.is_none() && self.tmdb.is_none()
    }
}

/// What was watched.
///
/// For movies `title` is the movie title. For episodes `title` is the show title, the
/// episode-specific parts live in `season`, `episode` and `episode_title`, and `ids`
/// carries the show's identifiers (TMDB episode lookups are keyed by show id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaRef {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    #[serde(default)]
    pub ids: MediaIds,
}

impl MediaRef {
    pub fn movie(title: impl Into<String>, year: Option<u32>) -> Self {
        Self {
            title: title.into(),
            year,
            season: None,
            episode: None,
            episode_title: None,
            ids: MediaIds::default(),
        }
    }

    pub fn episode(show_title: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            title: show_title.into(),
            year: None,
            season: Some(season),
            episode: Some(episode),
            episode_title: None,
            ids: MediaIds::default(),
        }
    }

    pub fn with_ids(mut self, ids: MediaIds) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_episode_title(mut self, episode_title: impl Into<String>) -> Self {
        self.episode_title = Some(episode_title.into());
        self
    }
}
