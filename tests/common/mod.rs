#![allow(dead_code)]

use std::{
    collections::BTreeSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use tokio::sync::{oneshot, Notify};

use cinesphere::{
    error::{AppError, AppResult},
    models::{
        AuthResponse, CollectionKind, CollectionSort, Credentials, Genre, GenreId, MovieDetail,
        MovieId, MovieSummary, ProfileUpdate, Registration, ResultPage, SortKey, User,
    },
    services::{AuthService, CatalogRequest, CollectionService, MovieCatalogService},
};

pub fn movie(id: u64) -> MovieSummary {
    MovieSummary {
        id: MovieId(id),
        title: format!("Movie {}", id),
        poster_path: None,
        release_date: None,
        average_rating: 7.0,
        genre_ids: BTreeSet::new(),
    }
}

pub fn page(ids: &[u64], page_number: u32, total_pages: u32) -> ResultPage {
    ResultPage::new(ids.iter().map(|id| movie(*id)).collect(), page_number, total_pages)
}

pub fn ids(items: &[MovieSummary]) -> Vec<u64> {
    items.iter().map(|item| item.id.0).collect()
}

pub fn unavailable() -> AppError {
    AppError::ExternalApi("service unavailable".to_string())
}

/// Catalog answering from a fixed script, optionally holding a response back
/// until the test releases it
#[derive(Default)]
pub struct ScriptedCatalog {
    responses: Mutex<Vec<(CatalogRequest, Result<ResultPage, String>)>>,
    gates: Mutex<Vec<(CatalogRequest, oneshot::Receiver<()>)>>,
    calls: Mutex<Vec<CatalogRequest>>,
    called: Notify,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, request: CatalogRequest, page: ResultPage) {
        self.responses.lock().unwrap().push((request, Ok(page)));
    }

    pub fn fail(&self, request: CatalogRequest, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push((request, Err(message.to_string())));
    }

    /// Holds the response to `request` until the returned sender fires
    pub fn gate(&self, request: CatalogRequest) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push((request, rx));
        tx
    }

    pub fn calls(&self) -> Vec<CatalogRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, count: usize) {
        loop {
            if self.calls.lock().unwrap().len() >= count {
                return;
            }
            self.called.notified().await;
        }
    }

    async fn answer(&self, request: CatalogRequest) -> AppResult<ResultPage> {
        self.calls.lock().unwrap().push(request.clone());
        self.called.notify_one();

        let gate = {
            let mut gates = self.gates.lock().unwrap();
            gates
                .iter()
                .position(|(gated, _)| *gated == request)
                .map(|i| gates.remove(i).1)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        // the most recent script entry wins, so retries can be re-scripted
        let responses = self.responses.lock().unwrap();
        match responses.iter().rev().find(|(scripted, _)| *scripted == request) {
            Some((_, Ok(page))) => Ok(page.clone()),
            Some((_, Err(message))) => Err(AppError::ExternalApi(message.clone())),
            None => Err(AppError::ExternalApi(format!("unscripted {:?}", request))),
        }
    }
}

#[async_trait::async_trait]
impl MovieCatalogService for ScriptedCatalog {
    async fn get_trending(&self, page: u32) -> AppResult<ResultPage> {
        self.answer(CatalogRequest::Trending { page }).await
    }

    async fn search_movies(&self, query: &str, page: u32) -> AppResult<ResultPage> {
        self.answer(CatalogRequest::Search {
            query: query.to_string(),
            page,
        })
        .await
    }

    async fn discover_by_genre(
        &self,
        genre_id: GenreId,
        sort: SortKey,
        page: u32,
    ) -> AppResult<ResultPage> {
        self.answer(CatalogRequest::Discover {
            genre_id,
            sort,
            page,
        })
        .await
    }

    async fn get_genre_list(&self) -> AppResult<Vec<Genre>> {
        Ok(vec![
            Genre {
                id: 28,
                name: "Action".to_string(),
            },
            Genre {
                id: 878,
                name: "Science Fiction".to_string(),
            },
        ])
    }

    async fn get_movie_detail(&self, id: MovieId) -> AppResult<MovieDetail> {
        Err(AppError::ExternalApi(format!("no detail for {}", id)))
    }
}

/// In-memory favorites and watchlist, paged `page_size` at a time
pub struct FakeCollections {
    favorites: Mutex<Vec<MovieId>>,
    watchlist: Mutex<Vec<MovieId>>,
    page_size: usize,
    fail_writes: AtomicBool,
    write_gate: Mutex<Option<oneshot::Receiver<()>>>,
    writes: Mutex<Vec<(CollectionKind, MovieId, bool)>>,
    write_started: Notify,
    listing_gate: Mutex<Option<(CollectionKind, oneshot::Receiver<()>)>>,
    listings: Mutex<Vec<CollectionKind>>,
    listed: Notify,
}

impl FakeCollections {
    pub fn new(favorites: &[u64], watchlist: &[u64], page_size: usize) -> Self {
        Self {
            favorites: Mutex::new(favorites.iter().map(|id| MovieId(*id)).collect()),
            watchlist: Mutex::new(watchlist.iter().map(|id| MovieId(*id)).collect()),
            page_size,
            fail_writes: AtomicBool::new(false),
            write_gate: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            write_started: Notify::new(),
            listing_gate: Mutex::new(None),
            listings: Mutex::new(Vec::new()),
            listed: Notify::new(),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Holds the next write until the returned sender fires
    pub fn gate_next_write(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.write_gate.lock().unwrap() = Some(rx);
        tx
    }

    /// Holds the next listing of `kind` after its contents were read, until
    /// the returned sender fires
    pub fn gate_next_listing(&self, kind: CollectionKind) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.listing_gate.lock().unwrap() = Some((kind, rx));
        tx
    }

    pub async fn wait_for_listings(&self, count: usize) {
        loop {
            if self.listings.lock().unwrap().len() >= count {
                return;
            }
            self.listed.notified().await;
        }
    }

    pub async fn wait_for_writes(&self, count: usize) {
        loop {
            if self.writes.lock().unwrap().len() >= count {
                return;
            }
            self.write_started.notified().await;
        }
    }

    pub fn writes(&self) -> Vec<(CollectionKind, MovieId, bool)> {
        self.writes.lock().unwrap().clone()
    }

    pub fn stored(&self, kind: CollectionKind) -> Vec<u64> {
        self.store(kind).lock().unwrap().iter().map(|id| id.0).collect()
    }

    fn store(&self, kind: CollectionKind) -> &Mutex<Vec<MovieId>> {
        match kind {
            CollectionKind::Favorites => &self.favorites,
            CollectionKind::Watchlist => &self.watchlist,
        }
    }

    async fn listing(&self, kind: CollectionKind, page: u32, sort: CollectionSort) -> ResultPage {
        let result = self.snapshot(kind, page, sort);
        self.listings.lock().unwrap().push(kind);
        self.listed.notify_one();

        let gate = {
            let mut gate = self.listing_gate.lock().unwrap();
            if matches!(gate.as_ref(), Some((gated, _)) if *gated == kind) {
                gate.take().map(|(_, rx)| rx)
            } else {
                None
            }
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }

    fn snapshot(&self, kind: CollectionKind, page: u32, sort: CollectionSort) -> ResultPage {
        let mut stored = self.store(kind).lock().unwrap().clone();
        // stored in insertion order, so newest last
        if sort == CollectionSort::AddedDesc {
            stored.reverse();
        }

        let total_pages = stored.len().div_ceil(self.page_size) as u32;
        let items = stored
            .into_iter()
            .skip((page as usize - 1) * self.page_size)
            .take(self.page_size)
            .map(|id| movie(id.0))
            .collect();
        ResultPage::new(items, page, total_pages)
    }

    async fn write(&self, kind: CollectionKind, movie_id: MovieId, member: bool) -> AppResult<()> {
        self.writes.lock().unwrap().push((kind, movie_id, member));
        self.write_started.notify_one();

        let gate = self.write_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let mut stored = self.store(kind).lock().unwrap();
        stored.retain(|id| *id != movie_id);
        if member {
            stored.push(movie_id);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CollectionService for FakeCollections {
    async fn list_favorites(&self, page: u32, sort: CollectionSort) -> AppResult<ResultPage> {
        Ok(self.listing(CollectionKind::Favorites, page, sort).await)
    }

    async fn list_watchlist(&self, page: u32, sort: CollectionSort) -> AppResult<ResultPage> {
        Ok(self.listing(CollectionKind::Watchlist, page, sort).await)
    }

    async fn add_favorite(&self, movie_id: MovieId) -> AppResult<()> {
        self.write(CollectionKind::Favorites, movie_id, true).await
    }

    async fn remove_favorite(&self, movie_id: MovieId) -> AppResult<()> {
        self.write(CollectionKind::Favorites, movie_id, false).await
    }

    async fn add_to_watchlist(&self, movie_id: MovieId) -> AppResult<()> {
        self.write(CollectionKind::Watchlist, movie_id, true).await
    }

    async fn remove_from_watchlist(&self, movie_id: MovieId) -> AppResult<()> {
        self.write(CollectionKind::Watchlist, movie_id, false).await
    }
}

pub fn trinity() -> User {
    User {
        id: "u-7".to_string(),
        username: "trinity".to_string(),
        email: "trinity@zion.io".to_string(),
        avatar: None,
    }
}

/// Accepts exactly one token and one password
pub struct StaticAuth {
    pub token: String,
    pub password: String,
}

impl Default for StaticAuth {
    fn default() -> Self {
        Self {
            token: "valid-token".to_string(),
            password: "followthewhiterabbit".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for StaticAuth {
    async fn login(&self, credentials: &Credentials) -> AppResult<AuthResponse> {
        if credentials.email == trinity().email && credentials.password == self.password {
            Ok(AuthResponse {
                user: trinity(),
                token: self.token.clone(),
            })
        } else {
            Err(AppError::Auth("Invalid credentials".to_string()))
        }
    }

    async fn register(&self, registration: &Registration) -> AppResult<AuthResponse> {
        if registration.email == trinity().email {
            return Err(AppError::Auth("User already exists".to_string()));
        }
        Ok(AuthResponse {
            user: User {
                id: "u-8".to_string(),
                username: registration.username.clone(),
                email: registration.email.clone(),
                avatar: None,
            },
            token: "fresh-token".to_string(),
        })
    }

    async fn current_user(&self, token: &str) -> AppResult<User> {
        if token == self.token {
            Ok(trinity())
        } else {
            Err(AppError::Auth("Failed to get user data".to_string()))
        }
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> AppResult<User> {
        let mut user = self.current_user(token).await?;
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(avatar) = &update.avatar {
            user.avatar = Some(avatar.clone());
        }
        Ok(user)
    }
}
