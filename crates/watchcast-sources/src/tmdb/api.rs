use serde::Deserialize;
use watchcast_models::Metadata;

#[derive(Debug, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub runtime: Option<u32>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbShow {
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbEpisode {
    pub overview: Option<String>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
    pub runtime: Option<u32>,
}

// TMDB uses empty strings and zeros for "unknown"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn positive_rating(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

fn positive_runtime(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v > 0)
}

impl From<TmdbMovie> for Metadata {
    fn from(movie: TmdbMovie) -> Self {
        Metadata {
            overview: non_empty(movie.overview),
            poster_path: non_empty(movie.poster_path),
            image_path: non_empty(movie.backdrop_path),
            rating: positive_rating(movie.vote_average),
            runtime_minutes: positive_runtime(movie.runtime),
            genres: movie.genres.into_iter().map(|g| g.name).collect(),
        }
    }
}

impl TmdbEpisode {
    pub fn into_metadata(self, show_poster: Option<String>) -> Metadata {
        Metadata {
            overview: non_empty(self.overview),
            poster_path: non_empty(show_poster),
            image_path: non_empty(self.still_path),
            rating: positive_rating(self.vote_average),
            runtime_minutes: positive_runtime(self.runtime),
            genres: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_conversion_drops_placeholders() {
        let movie: TmdbMovie = serde_json::from_str(
            r#"{"overview":"","poster_path":"/p.jpg","backdrop_path":null,"vote_average":0.0,"runtime":0,
                "genres":[{"id":1,"name":"Drama"},{"id":2,"name":"Sci-Fi"}]}"#,
        )
        .unwrap();
        let metadata = Metadata::from(movie);
        assert_eq!(metadata.overview, None);
        assert_eq!(metadata.poster_path.as_deref(), Some("/p.jpg"));
        assert_eq!(metadata.rating, None);
        assert_eq!(metadata.runtime_minutes, None);
        assert_eq!(metadata.genres, vec!["Drama", "Sci-Fi"]);
    }
}
