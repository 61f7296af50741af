use chrono::{DateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use watchcast_config::Config;
use watchcast_models::{
    Embed, EmbedField, EmbedFooter, EmbedImage, EnrichedEvent, MediaKind, Metadata, WatchEvent,
    WebhookMessage,
};

const TRAKT_WEB_URL: &str = "https://trakt.tv";
const FOOTER_ICON_URL: &str = "https://walter.trakt.tv/hotlink-ok/public/favicon.ico";
const WATCHED_FORMAT: &str = "%b %d, %Y at %I:%M %p";
const MAX_GENRES: usize = 4;

/// Embed accent color derived from the metadata rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingColor {
    Unrated,
    Excellent,
    Good,
    Fair,
    Poor,
}

impl RatingColor {
    /// A rating of exactly zero is how the metadata service reports "no votes"
    pub fn from_rating(rating: Option<f64>) -> Self {
        match rating {
            None => RatingColor::Unrated,
            Some(r) if r == 0.0 || r.is_nan() => RatingColor::Unrated,
            Some(r) if r >= 8.0 => RatingColor::Excellent,
            Some(r) if r >= 7.0 => RatingColor::Good,
            Some(r) if r >= 6.0 => RatingColor::Fair,
            Some(_) => RatingColor::Poor,
        }
    }

    pub fn value(self) -> u32 {
        match self {
            RatingColor::Unrated => 0x5865F2,
            RatingColor::Excellent => 0x57F287,
            RatingColor::Good => 0xFEE75C,
            RatingColor::Fair => 0xEB459E,
            RatingColor::Poor => 0xED4245,
        }
    }
}

/// Turns enriched events into webhook messages. Pure: no I/O and no failure path.
#[derive(Debug, Clone)]
pub struct Formatter {
    timezone: Tz,
    footer_text: String,
    image_base_url: String,
}

impl Formatter {
    pub fn new(timezone: Tz, footer_text: impl Into<String>, image_base_url: impl Into<String>) -> Self {
        Self {
            timezone,
            footer_text: footer_text.into(),
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.display_timezone()?,
            config.discord.footer_text.clone(),
            config.tmdb.image_base_url.clone(),
        ))
    }

    pub fn format(&self, enriched: &EnrichedEvent) -> WebhookMessage {
        let embed = match enriched.event.media_type {
            MediaKind::Movie => self.movie_embed(&enriched.event, enriched.metadata.as_ref()),
            MediaKind::Episode => self.episode_embed(&enriched.event, enriched.metadata.as_ref()),
        };
        WebhookMessage::single(embed)
    }

    fn movie_embed(&self, event: &WatchEvent, metadata: Option<&Metadata>) -> Embed {
        let media = &event.media;
        let year = media
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());

        let description = match metadata {
            Some(m) => m
                .overview
                .clone()
                .unwrap_or_else(|| "Just finished watching this movie!".to_string()),
            None => "Just finished watching!".to_string(),
        };

        let mut fields = vec![self.watched_field(event.watched_at)];
        let mut thumbnail = None;
        let mut image = None;

        if let Some(m) = metadata {
            thumbnail = m.poster_path.as_deref().map(|p| self.image("w500", p));
            image = m.image_path.as_deref().map(|p| self.image("original", p));

            if let Some(runtime) = m.runtime_minutes.filter(|r| *r > 0) {
                fields.push(EmbedField::inline(
                    "⏱️ Runtime",
                    format!("{}h {}m", runtime / 60, runtime % 60),
                ));
            }
            if let Some(field) = rating_field(m.rating) {
                fields.push(field);
            }
            if !m.genres.is_empty() {
                let genres: Vec<&str> = m.genres.iter().take(MAX_GENRES).map(String::as_str).collect();
                fields.push(EmbedField::block("🎭 Genres", genres.join(", ")));
            }
        }

        Embed {
            title: format!("🎬 {} ({})", media.title, year),
            description,
            color: RatingColor::from_rating(metadata.and_then(|m| m.rating)).value(),
            url: media
                .ids
                .slug
                .as_ref()
                .map(|slug| format!("{}/movies/{}", TRAKT_WEB_URL, slug)),
            fields,
            footer: Some(self.footer()),
            thumbnail,
            image,
            timestamp: Some(timestamp(event.watched_at)),
        }
    }

    fn episode_embed(&self, event: &WatchEvent, metadata: Option<&Metadata>) -> Embed {
        let media = &event.media;
        let season = media.season.unwrap_or_default();
        let number = media.episode.unwrap_or_default();

        let mut description = format!("**Season {}, Episode {}**", season, number);
        if let Some(title) = media.episode_title.as_deref().filter(|t| !t.is_empty()) {
            description.push_str(" - ");
            description.push_str(title);
        }
        description.push_str("\n\n");
        match metadata.and_then(|m| m.overview.as_deref()) {
            Some(overview) => description.push_str(overview),
            None => description.push_str("Just finished watching this episode!"),
        }

        let mut fields = vec![self.watched_field(event.watched_at)];
        let mut thumbnail = None;
        let mut image = None;

        if let Some(m) = metadata {
            thumbnail = m.poster_path.as_deref().map(|p| self.image("w500", p));
            image = m.image_path.as_deref().map(|p| self.image("w500", p));

            if let Some(runtime) = m.runtime_minutes.filter(|r| *r > 0) {
                fields.push(EmbedField::inline("⏱️ Runtime", format!("{} min", runtime)));
            }
            if let Some(field) = rating_field(m.rating) {
                fields.push(field);
            }
        }

        Embed {
            title: format!("📺 {}", media.title),
            description,
            // Episodes keep the neutral color whatever their rating
            color: RatingColor::Unrated.value(),
            url: media.ids.slug.as_ref().map(|slug| {
                format!(
                    "{}/shows/{}/seasons/{}/episodes/{}",
                    TRAKT_WEB_URL, slug, season, number
                )
            }),
            fields,
            footer: Some(self.footer()),
            thumbnail,
            image,
            timestamp: Some(timestamp(event.watched_at)),
        }
    }

    fn watched_field(&self, watched_at: DateTime<Utc>) -> EmbedField {
        let local = watched_at.with_timezone(&self.timezone);
        EmbedField::inline("🕐 Watched", local.format(WATCHED_FORMAT).to_string())
    }

    fn footer(&self) -> EmbedFooter {
        EmbedFooter {
            text: self.footer_text.clone(),
            icon_url: Some(FOOTER_ICON_URL.to_string()),
        }
    }

    fn image(&self, size: &str, path: &str) -> EmbedImage {
        EmbedImage {
            url: format!("{}/{}{}", self.image_base_url, size, path),
        }
    }
}

fn rating_field(rating: Option<f64>) -> Option<EmbedField> {
    rating
        .filter(|r| *r > 0.0)
        .map(|r| EmbedField::inline("⭐ Rating", format!("{:.1}/10", r)))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{episode_event, movie_event};

    fn formatter() -> Formatter {
        Formatter::new(chrono_tz::UTC, "Trakt", "https://image.tmdb.org/t/p/")
    }

    fn metadata() -> Metadata {
        Metadata {
            overview: Some("Spice must flow.".to_string()),
            poster_path: Some("/p.jpg".to_string()),
            image_path: Some("/b.jpg".to_string()),
            rating: Some(7.84),
            runtime_minutes: Some(155),
            genres: ["Sci-Fi", "Adventure", "Drama", "Action", "War"]
                .iter()
                .map(|g| g.to_string())
                .collect(),
        }
    }

    fn embed(message: WebhookMessage) -> Embed {
        assert_eq!(message.embeds.len(), 1);
        message.embeds.into_iter().next().unwrap()
    }

    #[test]
    fn test_rating_colors() {
        assert_eq!(RatingColor::from_rating(None), RatingColor::Unrated);
        assert_eq!(RatingColor::from_rating(Some(0.0)), RatingColor::Unrated);
        assert_eq!(RatingColor::from_rating(Some(8.0)), RatingColor::Excellent);
        assert_eq!(RatingColor::from_rating(Some(7.99)), RatingColor::Good);
        assert_eq!(RatingColor::from_rating(Some(6.0)), RatingColor::Fair);
        assert_eq!(RatingColor::from_rating(Some(5.9)), RatingColor::Poor);
        assert_eq!(RatingColor::Excellent.value(), 0x57F287);
        assert_eq!(RatingColor::Poor.value(), 0xED4245);
    }

    #[test]
    fn test_enriched_movie() {
        let event = movie_event("42", 3);
        let embed = embed(formatter().format(&EnrichedEvent::new(event, Some(metadata()))));

        assert_eq!(embed.title, "🎬 Movie 42 (2020)");
        assert_eq!(embed.description, "Spice must flow.");
        assert_eq!(embed.color, RatingColor::Good.value());
        assert_eq!(embed.url.as_deref(), Some("https://trakt.tv/movies/movie-42"));
        assert_eq!(
            embed.thumbnail.unwrap().url,
            "https://image.tmdb.org/t/p/w500/p.jpg"
        );
        assert_eq!(
            embed.image.unwrap().url,
            "https://image.tmdb.org/t/p/original/b.jpg"
        );

        let values: Vec<(&str, &str, bool)> = embed
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str(), f.inline))
            .collect();
        assert_eq!(
            values,
            vec![
                ("🕐 Watched", "May 03, 2024 at 08:00 PM", true),
                ("⏱️ Runtime", "2h 35m", true),
                ("⭐ Rating", "7.8/10", true),
                ("🎭 Genres", "Sci-Fi, Adventure, Drama, Action", false),
            ]
        );
        assert_eq!(embed.timestamp.as_deref(), Some("2024-05-03T20:00:00Z"));
        assert_eq!(embed.footer.unwrap().text, "Trakt");
    }

    #[test]
    fn test_degraded_movie() {
        let mut event = movie_event("7", 1);
        event.media.year = None;
        event.media.ids.slug = None;
        let embed = embed(formatter().format(&EnrichedEvent::degraded(event)));

        assert_eq!(embed.title, "🎬 Movie 7 (N/A)");
        assert_eq!(embed.description, "Just finished watching!");
        assert_eq!(embed.color, RatingColor::Unrated.value());
        assert!(embed.url.is_none());
        assert!(embed.thumbnail.is_none());
        assert!(embed.image.is_none());
        assert_eq!(embed.fields.len(), 1);
    }

    #[test]
    fn test_movie_metadata_without_overview() {
        let event = movie_event("7", 1);
        let embed = embed(formatter().format(&EnrichedEvent::new(event, Some(Metadata::default()))));
        assert_eq!(embed.description, "Just finished watching this movie!");
        assert_eq!(embed.fields.len(), 1);
    }

    #[test]
    fn test_episode() {
        let mut event = episode_event("900", 2, 3);
        event.media.episode_title = Some("Who Is Alive?".to_string());
        let mut meta = metadata();
        meta.runtime_minutes = Some(48);
        meta.rating = Some(9.1);

        let embed = embed(formatter().format(&EnrichedEvent::new(event, Some(meta))));
        assert_eq!(embed.title, "📺 Show");
        assert_eq!(
            embed.description,
            "**Season 2, Episode 3** - Who Is Alive?\n\nSpice must flow."
        );
        assert_eq!(embed.color, RatingColor::Unrated.value());
        assert_eq!(
            embed.url.as_deref(),
            Some("https://trakt.tv/shows/show/seasons/2/episodes/3")
        );
        assert_eq!(embed.image.unwrap().url, "https://image.tmdb.org/t/p/w500/b.jpg");
        assert!(embed.fields.iter().any(|f| f.value == "48 min"));
        assert!(embed.fields.iter().any(|f| f.value == "9.1/10"));
        assert!(!embed.fields.iter().any(|f| f.name.contains("Genres")));
    }

    #[test]
    fn test_degraded_episode() {
        let event = episode_event("901", 1, 1);
        let embed = embed(formatter().format(&EnrichedEvent::degraded(event)));
        assert_eq!(
            embed.description,
            "**Season 1, Episode 1**\n\nJust finished watching this episode!"
        );
        assert_eq!(embed.fields.len(), 1);
    }

    #[test]
    fn test_watched_uses_display_timezone() {
        let formatter = Formatter::new(chrono_tz::America::New_York, "Trakt", "https://img");
        let embed = embed(formatter.format(&EnrichedEvent::degraded(movie_event("1", 3))));
        assert_eq!(embed.fields[0].value, "May 03, 2024 at 04:00 PM");
        // The machine-readable timestamp stays in UTC
        assert_eq!(embed.timestamp.as_deref(), Some("2024-05-03T20:00:00Z"));
    }
}
