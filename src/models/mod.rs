use chrono::NaiveDate;
use serde::Deserialize;

pub mod collection;
pub mod movie;
pub mod user;

pub use collection::{CollectionKind, CollectionSort};
pub use movie::{
    image_url, Genre, GenreId, ImageSize, MovieDetail, MovieId, MovieSummary, ResultPage, SortKey,
};
pub use user::{AuthResponse, Credentials, ProfileUpdate, Registration, User};

// ============================================================================
// TMDB API Types
// ============================================================================

/// Movie entry as it appears in any TMDB listing
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    /// Either `YYYY-MM-DD`, empty, or missing
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub genre_ids: Vec<GenreId>,
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        let release_date = movie
            .release_date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());

        let average_rating = if movie.vote_average.is_finite() {
            movie.vote_average.clamp(0.0, 10.0)
        } else {
            0.0
        };

        MovieSummary {
            id: MovieId(movie.id),
            title: movie.title,
            poster_path: movie.poster_path,
            release_date,
            average_rating,
            genre_ids: movie.genre_ids.into_iter().collect(),
        }
    }
}

/// Paginated TMDB listing envelope
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_pages: u32,
}

impl From<TmdbPage> for ResultPage {
    fn from(page: TmdbPage) -> Self {
        let items = page.results.into_iter().map(MovieSummary::from).collect();
        ResultPage::new(items, page.page, page.total_pages)
    }
}

/// Response from GET /genre/movie/list
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    pub genres: Vec<Genre>,
}

/// Status body returned by TMDB write endpoints and errors
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbStatus {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub status_message: Option<String>,
}
