use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// The two per-user movie collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Favorites,
    Watchlist,
}

impl CollectionKind {
    /// Path segment used by the account endpoints
    pub fn as_path(&self) -> &'static str {
        match self {
            CollectionKind::Favorites => "favorite",
            CollectionKind::Watchlist => "watchlist",
        }
    }
}

impl Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionKind::Favorites => write!(f, "favorites"),
            CollectionKind::Watchlist => write!(f, "watchlist"),
        }
    }
}

impl FromStr for CollectionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "favorites" | "favorite" => Ok(CollectionKind::Favorites),
            "watchlist" => Ok(CollectionKind::Watchlist),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown collection '{}'",
                other
            ))),
        }
    }
}

/// Order of a collection listing, by the time a movie was added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionSort {
    #[default]
    AddedDesc,
    AddedAsc,
}

impl CollectionSort {
    pub fn as_param(&self) -> &'static str {
        match self {
            CollectionSort::AddedDesc => "created_at.desc",
            CollectionSort::AddedAsc => "created_at.asc",
        }
    }
}

impl Display for CollectionSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_param())
    }
}

impl FromStr for CollectionSort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "created_at.desc" | "added_at.desc" | "added_desc" => Ok(CollectionSort::AddedDesc),
            "created_at.asc" | "added_at.asc" | "added_asc" => Ok(CollectionSort::AddedAsc),
            other => Err(AppError::InvalidArgument(format!(
                "Unknown collection sort '{}'",
                other
            ))),
        }
    }
}
