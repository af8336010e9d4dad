use std::collections::HashMap;

use crate::{
    error::AppResult,
    models::{Genre, GenreId},
    services::providers::MovieCatalogService,
};

/// Genre names keyed by id, in the catalog's listing order
#[derive(Debug, Clone, Default)]
pub struct GenreIndex {
    genres: Vec<Genre>,
    names: HashMap<GenreId, String>,
}

impl GenreIndex {
    pub fn new(genres: Vec<Genre>) -> Self {
        let names = genres
            .iter()
            .map(|genre| (genre.id, genre.name.clone()))
            .collect();
        Self { genres, names }
    }

    pub async fn load(catalog: &dyn MovieCatalogService) -> AppResult<Self> {
        let genres = catalog.get_genre_list().await?;
        tracing::debug!(genres = genres.len(), "Genre list loaded");
        Ok(Self::new(genres))
    }

    pub fn name(&self, id: GenreId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Names for `ids` in the order given; unknown ids are skipped
    pub fn names<'a>(&'a self, ids: impl IntoIterator<Item = &'a GenreId>) -> Vec<&'a str> {
        ids.into_iter().filter_map(|id| self.name(*id)).collect()
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }
}
