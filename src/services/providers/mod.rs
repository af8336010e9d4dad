/// Remote data provider abstraction
///
/// The discovery and collection controllers only ever talk to these traits, so
/// any catalog with TMDB-shaped semantics (or a test double) can be plugged in.
use crate::{
    error::AppResult,
    models::{
        CollectionKind, CollectionSort, Genre, GenreId, MovieDetail, MovieId, ResultPage, SortKey,
    },
};

pub mod tmdb;

/// Read-only movie catalog
#[async_trait::async_trait]
pub trait MovieCatalogService: Send + Sync {
    /// Movies trending this week
    async fn get_trending(&self, page: u32) -> AppResult<ResultPage>;

    /// Free-text title search
    async fn search_movies(&self, query: &str, page: u32) -> AppResult<ResultPage>;

    /// Discover movies in a single genre.
    ///
    /// The upstream endpoint filters on one genre only; callers with several
    /// selected genres send the first.
    async fn discover_by_genre(
        &self,
        genre_id: GenreId,
        sort: SortKey,
        page: u32,
    ) -> AppResult<ResultPage>;

    async fn get_genre_list(&self) -> AppResult<Vec<Genre>>;

    async fn get_movie_detail(&self, id: MovieId) -> AppResult<MovieDetail>;
}

/// Per-user favorites and watchlist
#[async_trait::async_trait]
pub trait CollectionService: Send + Sync {
    async fn list_favorites(&self, page: u32, sort: CollectionSort) -> AppResult<ResultPage>;

    async fn list_watchlist(&self, page: u32, sort: CollectionSort) -> AppResult<ResultPage>;

    async fn add_favorite(&self, movie_id: MovieId) -> AppResult<()>;

    async fn remove_favorite(&self, movie_id: MovieId) -> AppResult<()>;

    async fn add_to_watchlist(&self, movie_id: MovieId) -> AppResult<()>;

    async fn remove_from_watchlist(&self, movie_id: MovieId) -> AppResult<()>;

    /// List one page of the given collection
    async fn list(
        &self,
        kind: CollectionKind,
        page: u32,
        sort: CollectionSort,
    ) -> AppResult<ResultPage> {
        match kind {
            CollectionKind::Favorites => self.list_favorites(page, sort).await,
            CollectionKind::Watchlist => self.list_watchlist(page, sort).await,
        }
    }

    /// Add to or remove from the given collection
    async fn set_membership(
        &self,
        kind: CollectionKind,
        movie_id: MovieId,
        member: bool,
    ) -> AppResult<()> {
        match (kind, member) {
            (CollectionKind::Favorites, true) => self.add_favorite(movie_id).await,
            (CollectionKind::Favorites, false) => self.remove_favorite(movie_id).await,
            (CollectionKind::Watchlist, true) => self.add_to_watchlist(movie_id).await,
            (CollectionKind::Watchlist, false) => self.remove_from_watchlist(movie_id).await,
        }
    }
}
