use std::collections::HashSet;

use crate::{
    error::AppResult,
    models::{MovieId, MovieSummary, ResultPage},
};

/// Sequence number identifying one issued fetch
pub type RequestToken = u64;

/// What happened to a fetch response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was current and merged; `appended` counts new items
    Applied { appended: usize },
    /// A newer fetch superseded this one; the response was dropped
    Stale,
    /// No fetch was issued (nothing more to load, or a fetch is in flight)
    Skipped,
}

/// Observable state of a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsStatus {
    /// Nothing requested yet
    Idle,
    Loading,
    /// Last fetch failed; previously loaded items are still available
    Failed,
    /// A fetch succeeded and returned no items
    Empty,
    Ready,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    token: RequestToken,
    /// Page to fall back to if this fetch fails
    rollback_page: u32,
}

/// Results accumulated over successive pages of one logical query.
///
/// Every issued fetch gets a fresh token; only the response carrying the
/// in-flight token is merged, everything else is discarded.
#[derive(Debug)]
pub struct PagedResults {
    items: Vec<MovieSummary>,
    seen: HashSet<MovieId>,
    page: u32,
    total_pages: u32,
    next_token: RequestToken,
    in_flight: Option<InFlight>,
    error: Option<String>,
    loaded: bool,
}

impl Default for PagedResults {
    fn default() -> Self {
        Self::new()
    }
}

impl PagedResults {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            page: 1,
            total_pages: 0,
            next_token: 0,
            in_flight: None,
            error: None,
            loaded: false,
        }
    }

    fn issue(&mut self, rollback_page: u32) -> RequestToken {
        self.next_token += 1;
        let token = self.next_token;
        self.in_flight = Some(InFlight {
            token,
            rollback_page,
        });
        token
    }

    /// Drops everything accumulated and issues a fetch for page 1,
    /// superseding any fetch in flight
    pub fn restart(&mut self) -> RequestToken {
        self.items.clear();
        self.seen.clear();
        self.page = 1;
        self.total_pages = 0;
        self.error = None;
        self.loaded = false;
        self.issue(1)
    }

    /// Issues a fetch for the next page, or `None` when there is nothing more
    /// to load or a fetch is already in flight
    pub fn advance(&mut self) -> Option<(RequestToken, u32)> {
        if self.in_flight.is_some() || !self.has_more() {
            return None;
        }

        let previous = self.page;
        self.page += 1;
        let token = self.issue(previous);
        Some((token, self.page))
    }

    /// Merges a response if `token` is the fetch currently in flight.
    ///
    /// A failed current fetch keeps the accumulated items, records the error
    /// and returns it; the page counter goes back so the same page is retried.
    pub fn apply(
        &mut self,
        token: RequestToken,
        result: AppResult<ResultPage>,
    ) -> AppResult<FetchOutcome> {
        let in_flight = match self.in_flight {
            Some(in_flight) if in_flight.token == token => in_flight,
            _ => {
                tracing::debug!(
                    token = token,
                    current = ?self.in_flight.map(|f| f.token),
                    "Discarding stale response"
                );
                return Ok(FetchOutcome::Stale);
            }
        };
        self.in_flight = None;

        match result {
            Ok(page) => {
                self.total_pages = page.total_pages;
                self.error = None;
                self.loaded = true;
                Ok(FetchOutcome::Applied {
                    appended: self.append(page.items),
                })
            }
            Err(e) => {
                self.page = in_flight.rollback_page;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Appends in order, skipping ids already present
    fn append(&mut self, items: Vec<MovieSummary>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.id) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    /// Removes a single movie, e.g. after it left the listed collection
    pub fn remove(&mut self, id: MovieId) -> bool {
        if self.seen.remove(&id) {
            self.items.retain(|item| item.id != id);
            true
        } else {
            false
        }
    }

    pub fn items(&self) -> &[MovieSummary] {
        &self.items
    }

    pub fn ids(&self) -> Vec<MovieId> {
        self.items.iter().map(|item| item.id).collect()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> ResultsStatus {
        if self.in_flight.is_some() {
            ResultsStatus::Loading
        } else if self.error.is_some() {
            ResultsStatus::Failed
        } else if !self.loaded {
            ResultsStatus::Idle
        } else if self.items.is_empty() {
            ResultsStatus::Empty
        } else {
            ResultsStatus::Ready
        }
    }
}
