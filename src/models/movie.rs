use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeSet, HashSet},
    fmt::Display,
    str::FromStr,
};

use crate::error::AppError;

const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Stable external identifier of a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        MovieId(id)
    }
}

pub type GenreId = u32;

/// A movie as it appears in listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<NaiveDate>,
    /// Always within `0.0..=10.0`
    pub average_rating: f32,
    pub genre_ids: BTreeSet<GenreId>,
}

impl MovieSummary {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|date| chrono::Datelike::year(&date))
    }

    pub fn poster_url(&self, size: ImageSize) -> Option<String> {
        self.poster_path
            .as_deref()
            .map(|path| image_url(path, size))
    }
}

/// One page of results from a paginated remote listing
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultPage {
    pub items: Vec<MovieSummary>,
    pub page_number: u32,
    /// 0 means unknown or empty
    pub total_pages: u32,
}

impl ResultPage {
    /// Builds a page, keeping only the first occurrence of each movie id
    pub fn new(items: Vec<MovieSummary>, page_number: u32, total_pages: u32) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        let items = items
            .into_iter()
            .filter(|item| seen.insert(item.id))
            .collect();

        Self {
            items,
            page_number,
            total_pages,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Genre as listed by the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

/// Full movie record for the details view.
///
/// Only the head is typed; credits, videos, similar and recommendations stay
/// as delivered by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub genres: Vec<Genre>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MovieDetail {
    pub fn credits(&self) -> Option<&serde_json::Value> {
        self.extra.get("credits")
    }

    pub fn videos(&self) -> Option<&serde_json::Value> {
        self.extra.get("videos")
    }

    pub fn similar(&self) -> Option<&serde_json::Value> {
        self.extra.get("similar")
    }

    pub fn recommendations(&self) -> Option<&serde_json::Value> {
        self.extra.get("recommendations")
    }

    pub fn backdrop_url(&self) -> Option<String> {
        self.backdrop_path
            .as_deref()
            .map(|path| image_url(path, ImageSize::Original))
    }
}

/// Sort order for discovery listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    PopularityDesc,
    RatingDesc,
    ReleaseDesc,
    TitleAsc,
}

impl SortKey {
    /// Value of the catalog's `sort_by` parameter
    pub fn as_param(&self) -> &'static str {
        match self {
            SortKey::PopularityDesc => "popularity.desc",
            SortKey::RatingDesc => "vote_average.desc",
            SortKey::ReleaseDesc => "primary_release_date.desc",
            SortKey::TitleAsc => "title.asc",
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "popularity.desc" | "popularity_desc" => Ok(SortKey::PopularityDesc),
            "vote_average.desc" | "rating_desc" => Ok(SortKey::RatingDesc),
            "primary_release_date.desc" | "release_date.desc" | "release_desc" => {
                Ok(SortKey::ReleaseDesc)
            }
            "title.asc" | "title_asc" => Ok(SortKey::TitleAsc),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown sort key '{}'",
                other
            ))),
        }
    }
}

/// Poster and backdrop renditions served by the image CDN
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W185,
    W500,
    Original,
}

impl ImageSize {
    fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W185 => "w185",
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

pub fn image_url(path: &str, size: ImageSize) -> String {
    format!("{}/{}{}", IMAGE_BASE_URL, size.as_str(), path)
}
