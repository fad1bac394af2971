use cinelist_models::movie::parse_release_date;
use cinelist_models::{Movie, MovieCredits};
use serde::Serialize;
use tracing::warn;

pub const TITLE_DISPLAY_LIMIT: usize = 16;
const BILLED_CAST_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserScore {
    pub percent: u8,
    pub band: ScoreBand,
}

impl UserScore {
    /// `vote_average` is on a 0-10 scale
    pub fn from_vote_average(vote_average: f64) -> Self {
        let percent = (vote_average * 10.0).round().clamp(0.0, 100.0) as u8;
        let band = if percent >= 70 {
            ScoreBand::High
        } else if percent >= 50 {
            ScoreBand::Medium
        } else {
            ScoreBand::Low
        };
        Self { percent, band }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BilledCast {
    pub name: String,
    pub character: String,
}

/// Display-ready view of one movie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    pub display_title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub genres: String,
    pub language: String,
    pub release_date: String,
    pub director: Option<String>,
    pub writer: Option<String>,
    pub cast: Vec<BilledCast>,
    pub collection: Option<String>,
    pub score: UserScore,
    pub vote_count: u64,
}

impl MovieSummary {
    pub fn new(movie: &Movie, credits: Option<&MovieCredits>, image_base_url: &str) -> Self {
        let crew_name = |department: &str| {
            credits
                .and_then(|c| c.first_in_department(department))
                .map(|member| member.name.clone())
        };
        let cast = credits
            .map(|c| {
                c.billed_cast()
                    .into_iter()
                    .take(BILLED_CAST_LIMIT)
                    .map(|member| BilledCast {
                        name: member.name.clone(),
                        character: member.character.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id: movie.id,
            title: movie.title.clone(),
            display_title: truncate_title(&movie.title, TITLE_DISPLAY_LIMIT),
            overview: movie.overview.clone(),
            poster_url: image_url(image_base_url, movie.poster_path.as_deref()),
            backdrop_url: image_url(image_base_url, movie.backdrop_path.as_deref()),
            genres: movie
                .genres
                .iter()
                .map(|genre| genre.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            language: language_name(&movie.original_language),
            release_date: format_release_date(&movie.release_date),
            director: crew_name("Directing"),
            writer: crew_name("Writing"),
            cast,
            collection: movie.belongs_to_collection.as_ref().map(|c| c.name.clone()),
            score: UserScore::from_vote_average(movie.vote_average),
            vote_count: movie.vote_count,
        }
    }
}

/// First `limit` characters followed by `...` when the title is longer
pub fn truncate_title(title: &str, limit: usize) -> String {
    if title.chars().count() <= limit {
        return title.to_string();
    }
    let mut truncated: String = title.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

pub fn image_url(base_url: &str, path: Option<&str>) -> Option<String> {
    path.filter(|p| !p.is_empty()).map(|p| format!("{}{}", base_url.trim_end_matches('/'), p))
}

pub fn language_name(code: &str) -> String {
    let name = match code {
        "en" => "English",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "it" => "Italian",
        "pt" => "Portuguese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "zh" => "Chinese",
        "ru" => "Russian",
        "ar" => "Arabic",
        other => other,
    };
    name.to_string()
}

/// `YYYY-MM-DD` to `DD/MM/YYYY`
pub fn format_release_date(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    match parse_release_date(value) {
        Some(date) => date.format("%d/%m/%Y").to_string(),
        None => {
            warn!("Unrecognised release date: {}", value);
            value.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinelist_models::{CastMember, CrewMember, Genre, MovieCollection};

    fn fight_club() -> Movie {
        Movie {
            id: 550,
            title: "Fight Club".to_string(),
            overview: "An insomniac office worker...".to_string(),
            poster_path: Some("/poster.jpg".to_string()),
            release_date: "1999-10-15".to_string(),
            original_language: "en".to_string(),
            vote_average: 8.433,
            vote_count: 26000,
            genres: vec![
                Genre { id: 18, name: "Drama".to_string() },
                Genre { id: 53, name: "Thriller".to_string() },
            ],
            belongs_to_collection: None,
            ..Default::default()
        }
    }

    fn credits() -> MovieCredits {
        MovieCredits {
            id: 550,
            cast: vec![CastMember {
                name: "Edward Norton".to_string(),
                character: "The Narrator".to_string(),
                ..Default::default()
            }],
            crew: vec![
                CrewMember {
                    name: "Ceán Chaffin".to_string(),
                    department: "Production".to_string(),
                    ..Default::default()
                },
                CrewMember {
                    name: "David Fincher".to_string(),
                    department: "Directing".to_string(),
                    ..Default::default()
                },
                CrewMember {
                    name: "Jim Uhls".to_string(),
                    department: "Writing".to_string(),
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_summary_fields() {
        let summary = MovieSummary::new(&fight_club(), Some(&credits()), "https://image.tmdb.org/t/p/w500");

        assert_eq!(summary.display_title, "Fight Club");
        assert_eq!(summary.poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/poster.jpg"));
        assert_eq!(summary.backdrop_url, None);
        assert_eq!(summary.genres, "Drama, Thriller");
        assert_eq!(summary.language, "English");
        assert_eq!(summary.release_date, "15/10/1999");
        assert_eq!(summary.director.as_deref(), Some("David Fincher"));
        assert_eq!(summary.writer.as_deref(), Some("Jim Uhls"));
        assert_eq!(summary.cast[0].character, "The Narrator");
        assert_eq!(summary.score, UserScore { percent: 84, band: ScoreBand::High });
    }

    #[test]
    fn test_summary_without_credits() {
        let mut movie = fight_club();
        movie.belongs_to_collection = Some(MovieCollection {
            id: 1,
            name: "Collection".to_string(),
            poster_path: None,
            backdrop_path: None,
        });
        let summary = MovieSummary::new(&movie, None, "https://img/");
        assert_eq!(summary.director, None);
        assert!(summary.cast.is_empty());
        assert_eq!(summary.poster_url.as_deref(), Some("https://img/poster.jpg"));
        assert_eq!(summary.collection.as_deref(), Some("Collection"));
    }

    #[test]
    fn test_truncate_title() {
        assert_eq!(truncate_title("Short", 16), "Short");
        assert_eq!(truncate_title("Sixteen chars!!!", 16), "Sixteen chars!!!");
        assert_eq!(
            truncate_title("The Lord of the Rings: The Return of the King", 16),
            "The Lord of the ..."
        );
        assert_eq!(truncate_title("Amélie Poulain Fabuleux", 6), "Amélie...");
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(UserScore::from_vote_average(7.0).band, ScoreBand::High);
        assert_eq!(UserScore::from_vote_average(6.9).band, ScoreBand::Medium);
        assert_eq!(UserScore::from_vote_average(5.0).band, ScoreBand::Medium);
        assert_eq!(UserScore::from_vote_average(4.9).band, ScoreBand::Low);
        assert_eq!(UserScore::from_vote_average(12.0).percent, 100);
        assert_eq!(UserScore::from_vote_average(-1.0).percent, 0);
    }

    #[test]
    fn test_language_and_dates() {
        assert_eq!(language_name("ko"), "Korean");
        assert_eq!(language_name("sv"), "sv");
        assert_eq!(format_release_date(""), "");
        assert_eq!(format_release_date("2024-02-29"), "29/02/2024");
        assert_eq!(format_release_date("soon"), "soon");
    }
}
