use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{GenreId, MovieSummary, ResultPage, SortKey},
    services::{
        paging::{FetchOutcome, PagedResults, RequestToken, ResultsStatus},
        providers::MovieCatalogService,
    },
};

/// The user-facing filter state of the discover view
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    /// Trimmed; takes precedence over the genre filters when non-empty
    pub free_text: String,
    /// Selection order, no duplicates
    pub selected_genre_ids: Vec<GenreId>,
    pub sort_key: SortKey,
}

/// Which remote listing the current query maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Trending,
    Search,
    Discover,
}

impl Query {
    pub fn kind(&self) -> QueryKind {
        if !self.free_text.is_empty() {
            QueryKind::Search
        } else if !self.selected_genre_ids.is_empty() {
            QueryKind::Discover
        } else {
            QueryKind::Trending
        }
    }

    /// Derives the remote request for `page`.
    ///
    /// Discover only ever sends the first selected genre: the upstream
    /// endpoint accepts a single genre.
    pub fn request(&self, page: u32) -> CatalogRequest {
        match self.kind() {
            QueryKind::Search => CatalogRequest::Search {
                query: self.free_text.clone(),
                page,
            },
            QueryKind::Discover => CatalogRequest::Discover {
                genre_id: self.selected_genre_ids[0],
                sort: self.sort_key,
                page,
            },
            QueryKind::Trending => CatalogRequest::Trending { page },
        }
    }
}

/// A single remote catalog call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogRequest {
    Trending { page: u32 },
    Search { query: String, page: u32 },
    Discover { genre_id: GenreId, sort: SortKey, page: u32 },
}

impl CatalogRequest {
    pub fn page(&self) -> u32 {
        match self {
            CatalogRequest::Trending { page }
            | CatalogRequest::Search { page, .. }
            | CatalogRequest::Discover { page, .. } => *page,
        }
    }

    pub async fn execute(&self, catalog: &dyn MovieCatalogService) -> AppResult<ResultPage> {
        match self {
            CatalogRequest::Trending { page } => catalog.get_trending(*page).await,
            CatalogRequest::Search { query, page } => catalog.search_movies(query, *page).await,
            CatalogRequest::Discover {
                genre_id,
                sort,
                page,
            } => catalog.discover_by_genre(*genre_id, *sort, *page).await,
        }
    }
}

/// A fetch the controller wants performed, to be answered via `apply`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: RequestToken,
    pub request: CatalogRequest,
}

/// Search, genre filter, sort and load-more state machine.
///
/// Every transition returns the one fetch it requires; the caller performs it
/// and hands the result back with [`DiscoveryController::apply`]. Responses to
/// superseded tickets are ignored.
#[derive(Debug, Default)]
pub struct DiscoveryController {
    query: Query,
    results: PagedResults,
}

impl DiscoveryController {
    pub fn new() -> Self {
        Self::default()
    }

    fn reissue(&mut self) -> FetchTicket {
        let token = self.results.restart();
        let request = self.query.request(1);

        tracing::debug!(token = token, request = ?request, "Query reissued");

        FetchTicket { token, request }
    }

    pub fn set_free_text(&mut self, text: &str) -> FetchTicket {
        let text = text.trim();
        if text.is_empty() {
            return self.reset_to_discover();
        }

        self.query.free_text = text.to_string();
        self.query.selected_genre_ids.clear();
        self.reissue()
    }

    pub fn select_genre(&mut self, genre_id: GenreId) -> AppResult<FetchTicket> {
        if self.query.selected_genre_ids.contains(&genre_id) {
            return Err(AppError::InvalidArgument(format!(
                "Genre {} is already selected",
                genre_id
            )));
        }

        self.query.selected_genre_ids.push(genre_id);
        self.query.free_text.clear();
        Ok(self.reissue())
    }

    pub fn remove_genre(&mut self, genre_id: GenreId) -> AppResult<FetchTicket> {
        let position = self
            .query
            .selected_genre_ids
            .iter()
            .position(|id| *id == genre_id)
            .ok_or_else(|| {
                AppError::InvalidArgument(format!("Genre {} is not selected", genre_id))
            })?;

        self.query.selected_genre_ids.remove(position);
        if self.query.selected_genre_ids.is_empty() {
            return Ok(self.reset_to_discover());
        }
        Ok(self.reissue())
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) -> FetchTicket {
        self.query.sort_key = sort_key;
        self.reissue()
    }

    /// Replaces the genre selection and sort in one transition, issuing a
    /// single fetch. An empty selection falls back to trending.
    pub fn set_genre_filter(
        &mut self,
        genre_ids: &[GenreId],
        sort_key: SortKey,
    ) -> AppResult<FetchTicket> {
        for (i, genre_id) in genre_ids.iter().enumerate() {
            if genre_ids[..i].contains(genre_id) {
                return Err(AppError::InvalidArgument(format!(
                    "Genre {} is selected twice",
                    genre_id
                )));
            }
        }

        self.query.sort_key = sort_key;
        if genre_ids.is_empty() {
            return Ok(self.reset_to_discover());
        }

        self.query.free_text.clear();
        self.query.selected_genre_ids = genre_ids.to_vec();
        Ok(self.reissue())
    }

    /// Requests the next page of the active query, or `None` when on the last
    /// page or while a fetch is in flight
    pub fn load_more(&mut self) -> Option<FetchTicket> {
        match self.results.advance() {
            Some((token, page)) => Some(FetchTicket {
                token,
                request: self.query.request(page),
            }),
            None => {
                tracing::debug!(
                    page = self.results.page(),
                    total_pages = self.results.total_pages(),
                    loading = self.results.is_loading(),
                    "Load more skipped"
                );
                None
            }
        }
    }

    /// Back to the trending listing; the sort key is kept
    pub fn reset_to_discover(&mut self) -> FetchTicket {
        self.query.free_text.clear();
        self.query.selected_genre_ids.clear();
        self.reissue()
    }

    /// Like `reset_to_discover`, and also restores the default sort
    pub fn clear_filters(&mut self) -> FetchTicket {
        self.query.sort_key = SortKey::default();
        self.reset_to_discover()
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: AppResult<ResultPage>,
    ) -> AppResult<FetchOutcome> {
        self.results.apply(token, result)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn selected_genre_ids(&self) -> &[GenreId] {
        &self.query.selected_genre_ids
    }

    pub fn results(&self) -> &[MovieSummary] {
        self.results.items()
    }

    pub fn page(&self) -> u32 {
        self.results.page()
    }

    pub fn total_pages(&self) -> u32 {
        self.results.total_pages()
    }

    pub fn has_more(&self) -> bool {
        self.results.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.results.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.results.error()
    }

    pub fn status(&self) -> ResultsStatus {
        self.results.status()
    }

    pub fn snapshot(&self) -> DiscoverySnapshot {
        DiscoverySnapshot {
            query: self.query.clone(),
            results: self.results.items().to_vec(),
            page: self.results.page(),
            total_pages: self.results.total_pages(),
            status: self.results.status(),
            error: self.results.error().map(str::to_string),
        }
    }
}

/// Point-in-time copy of the controller state for rendering
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverySnapshot {
    pub query: Query,
    pub results: Vec<MovieSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub status: ResultsStatus,
    pub error: Option<String>,
}

/// Drives a [`DiscoveryController`] against a catalog.
///
/// Cloning yields another handle to the same controller. The controller lock
/// is never held across the network call, so overlapping operations are
/// resolved by the ticket rule rather than by waiting.
#[derive(Clone)]
pub struct Discovery {
    catalog: Arc<dyn MovieCatalogService>,
    controller: Arc<Mutex<DiscoveryController>>,
}

impl Discovery {
    pub fn new(catalog: Arc<dyn MovieCatalogService>) -> Self {
        Self {
            catalog,
            controller: Arc::new(Mutex::new(DiscoveryController::new())),
        }
    }

    async fn dispatch(&self, ticket: FetchTicket) -> AppResult<FetchOutcome> {
        let result = ticket.request.execute(self.catalog.as_ref()).await;

        if let Err(e) = &result {
            tracing::warn!(
                token = ticket.token,
                request = ?ticket.request,
                error = %e,
                "Catalog fetch failed"
            );
        }

        let outcome = self.controller.lock().await.apply(ticket.token, result)?;

        if let FetchOutcome::Applied { appended } = outcome {
            tracing::info!(
                token = ticket.token,
                page = ticket.request.page(),
                appended = appended,
                "Discovery results updated"
            );
        }

        Ok(outcome)
    }

    pub async fn set_free_text(&self, text: &str) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.set_free_text(text);
        self.dispatch(ticket).await
    }

    pub async fn select_genre(&self, genre_id: GenreId) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.select_genre(genre_id)?;
        self.dispatch(ticket).await
    }

    pub async fn remove_genre(&self, genre_id: GenreId) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.remove_genre(genre_id)?;
        self.dispatch(ticket).await
    }

    pub async fn set_sort_key(&self, sort_key: SortKey) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.set_sort_key(sort_key);
        self.dispatch(ticket).await
    }

    pub async fn set_genre_filter(
        &self,
        genre_ids: &[GenreId],
        sort_key: SortKey,
    ) -> AppResult<FetchOutcome> {
        let ticket = self
            .controller
            .lock()
            .await
            .set_genre_filter(genre_ids, sort_key)?;
        self.dispatch(ticket).await
    }

    pub async fn load_more(&self) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.load_more();
        match ticket {
            Some(ticket) => self.dispatch(ticket).await,
            None => Ok(FetchOutcome::Skipped),
        }
    }

    pub async fn reset_to_discover(&self) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.reset_to_discover();
        self.dispatch(ticket).await
    }

    pub async fn clear_filters(&self) -> AppResult<FetchOutcome> {
        let ticket = self.controller.lock().await.clear_filters();
        self.dispatch(ticket).await
    }

    pub async fn snapshot(&self) -> DiscoverySnapshot {
        self.controller.lock().await.snapshot()
    }
}
