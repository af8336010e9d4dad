use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    error::AppResult,
    models::{CollectionKind, CollectionSort, MovieId, MovieSummary, ResultPage},
    services::{
        paging::{FetchOutcome, PagedResults, RequestToken, ResultsStatus},
        providers::CollectionService,
    },
};

/// A listing request for one page of a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingTicket {
    pub token: RequestToken,
    pub kind: CollectionKind,
    pub sort: CollectionSort,
    pub page: u32,
}

/// Tab, sort and pagination state of the "my collection" view
#[derive(Debug)]
pub struct CollectionListing {
    kind: CollectionKind,
    sort: CollectionSort,
    results: PagedResults,
}

impl CollectionListing {
    pub fn new(kind: CollectionKind) -> Self {
        Self {
            kind,
            sort: CollectionSort::default(),
            results: PagedResults::new(),
        }
    }

    fn ticket(&self, token: RequestToken, page: u32) -> ListingTicket {
        ListingTicket {
            token,
            kind: self.kind,
            sort: self.sort,
            page,
        }
    }

    pub fn open(&mut self, kind: CollectionKind) -> ListingTicket {
        self.kind = kind;
        self.refresh()
    }

    pub fn set_sort(&mut self, sort: CollectionSort) -> ListingTicket {
        self.sort = sort;
        self.refresh()
    }

    /// Reloads the current tab from page 1
    pub fn refresh(&mut self) -> ListingTicket {
        let token = self.results.restart();
        self.ticket(token, 1)
    }

    pub fn load_more(&mut self) -> Option<ListingTicket> {
        let (token, page) = self.results.advance()?;
        Some(self.ticket(token, page))
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: AppResult<ResultPage>,
    ) -> AppResult<FetchOutcome> {
        self.results.apply(token, result)
    }

    /// Drops a movie from the listing after it left the collection
    pub fn forget(&mut self, movie_id: MovieId) -> bool {
        self.results.remove(movie_id)
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn sort(&self) -> CollectionSort {
        self.sort
    }

    pub fn items(&self) -> &[MovieSummary] {
        self.results.items()
    }

    pub fn page(&self) -> u32 {
        self.results.page()
    }

    pub fn has_more(&self) -> bool {
        self.results.has_more()
    }

    pub fn status(&self) -> ResultsStatus {
        self.results.status()
    }

    pub fn error(&self) -> Option<&str> {
        self.results.error()
    }
}

/// Drives a [`CollectionListing`] against a collection service
#[derive(Clone)]
pub struct CollectionBrowser {
    service: Arc<dyn CollectionService>,
    listing: Arc<Mutex<CollectionListing>>,
}

impl CollectionBrowser {
    pub fn new(service: Arc<dyn CollectionService>, kind: CollectionKind) -> Self {
        Self {
            service,
            listing: Arc::new(Mutex::new(CollectionListing::new(kind))),
        }
    }

    async fn dispatch(&self, ticket: ListingTicket) -> AppResult<FetchOutcome> {
        let result = self
            .service
            .list(ticket.kind, ticket.page, ticket.sort)
            .await;

        if let Err(e) = &result {
            tracing::warn!(
                collection = %ticket.kind,
                page = ticket.page,
                error = %e,
                "Collection listing failed"
            );
        }

        self.listing.lock().await.apply(ticket.token, result)
    }

    pub async fn open(&self, kind: CollectionKind) -> AppResult<FetchOutcome> {
        let ticket = self.listing.lock().await.open(kind);
        self.dispatch(ticket).await
    }

    pub async fn set_sort(&self, sort: CollectionSort) -> AppResult<FetchOutcome> {
        let ticket = self.listing.lock().await.set_sort(sort);
        self.dispatch(ticket).await
    }

    pub async fn refresh(&self) -> AppResult<FetchOutcome> {
        let ticket = self.listing.lock().await.refresh();
        self.dispatch(ticket).await
    }

    pub async fn load_more(&self) -> AppResult<FetchOutcome> {
        let ticket = self.listing.lock().await.load_more();
        match ticket {
            Some(ticket) => self.dispatch(ticket).await,
            None => Ok(FetchOutcome::Skipped),
        }
    }

    pub async fn forget(&self, movie_id: MovieId) -> bool {
        self.listing.lock().await.forget(movie_id)
    }

    pub async fn items(&self) -> Vec<MovieSummary> {
        self.listing.lock().await.items().to_vec()
    }

    pub async fn status(&self) -> ResultsStatus {
        self.listing.lock().await.status()
    }

    pub async fn error(&self) -> Option<String> {
        self.listing.lock().await.error().map(str::to_string)
    }
}
