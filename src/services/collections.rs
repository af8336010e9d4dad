use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tokio::sync::Mutex;

use crate::{
    error::{AppError, AppResult},
    models::{CollectionKind, CollectionSort, MovieId},
    services::{paging::RequestToken, providers::CollectionService, session::SessionStore},
};

/// Upper bound on pages read when loading a whole collection
const MAX_MEMBERSHIP_PAGES: u32 = 50;

/// Favorites and watchlist of the signed-in user.
///
/// The two sets are independent; a movie may be in both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionMembership {
    favorites: HashSet<MovieId>,
    watchlist: HashSet<MovieId>,
}

impl CollectionMembership {
    pub fn new(favorites: HashSet<MovieId>, watchlist: HashSet<MovieId>) -> Self {
        Self {
            favorites,
            watchlist,
        }
    }

    pub fn ids(&self, kind: CollectionKind) -> &HashSet<MovieId> {
        match kind {
            CollectionKind::Favorites => &self.favorites,
            CollectionKind::Watchlist => &self.watchlist,
        }
    }

    fn ids_mut(&mut self, kind: CollectionKind) -> &mut HashSet<MovieId> {
        match kind {
            CollectionKind::Favorites => &mut self.favorites,
            CollectionKind::Watchlist => &mut self.watchlist,
        }
    }

    pub fn contains(&self, kind: CollectionKind, movie_id: MovieId) -> bool {
        self.ids(kind).contains(&movie_id)
    }

    fn set(&mut self, kind: CollectionKind, movie_id: MovieId, member: bool) {
        if member {
            self.ids_mut(kind).insert(movie_id);
        } else {
            self.ids_mut(kind).remove(&movie_id);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty() && self.watchlist.is_empty()
    }
}

/// Direction of an in-flight toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    Add,
    Remove,
}

impl ToggleAction {
    fn member_after(&self) -> bool {
        matches!(self, ToggleAction::Add)
    }
}

/// A toggle that has been applied locally and awaits the remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleTicket {
    pub kind: CollectionKind,
    pub movie_id: MovieId,
    pub action: ToggleAction,
    /// Membership epoch the toggle was started in; `clear` starts a new one
    pub epoch: u64,
}

/// A membership reload; only the most recently issued one may be applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub token: RequestToken,
}

/// Optimistic membership with per-movie two-phase toggles:
/// `begin` flips locally, `complete` commits or reverts.
///
/// Reloads follow the same ticket rule as result pages. Toggles committed
/// while a reload is in flight are replayed over the loaded snapshot, since
/// the server may have answered the listing before the write landed.
#[derive(Debug, Default)]
pub struct CollectionToggle {
    membership: CollectionMembership,
    pending: HashMap<(CollectionKind, MovieId), ToggleAction>,
    /// Commits since the in-flight reload was issued
    settled: HashMap<(CollectionKind, MovieId), bool>,
    epoch: u64,
    next_refresh: RequestToken,
    refreshing: Option<RequestToken>,
    last_error: Option<String>,
}

impl CollectionToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, kind: CollectionKind, movie_id: MovieId) -> AppResult<ToggleTicket> {
        if self.pending.contains_key(&(kind, movie_id)) {
            return Err(AppError::ConcurrentModification(format!(
                "Movie {} already has a {} update in flight",
                movie_id, kind
            )));
        }

        let action = if self.membership.contains(kind, movie_id) {
            ToggleAction::Remove
        } else {
            ToggleAction::Add
        };

        self.membership.set(kind, movie_id, action.member_after());
        self.pending.insert((kind, movie_id), action);

        Ok(ToggleTicket {
            kind,
            movie_id,
            action,
            epoch: self.epoch,
        })
    }

    /// Settles a toggle. Returns the final membership of the movie on
    /// success; on failure reverts the local flip and returns the error.
    ///
    /// A ticket from before the last `clear` leaves membership untouched.
    pub fn complete(&mut self, ticket: ToggleTicket, result: AppResult<()>) -> AppResult<bool> {
        if ticket.epoch != self.epoch {
            tracing::debug!(
                movie_id = %ticket.movie_id,
                collection = %ticket.kind,
                "Toggle settled after membership was cleared"
            );
            return result.map(|()| ticket.action.member_after());
        }

        let key = (ticket.kind, ticket.movie_id);
        self.pending.remove(&key);

        match result {
            Ok(()) => {
                if self.refreshing.is_some() {
                    self.settled.insert(key, ticket.action.member_after());
                }
                self.last_error = None;
                Ok(ticket.action.member_after())
            }
            Err(e) => {
                self.membership
                    .set(ticket.kind, ticket.movie_id, !ticket.action.member_after());
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Issues a reload, superseding any reload in flight
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.next_refresh += 1;
        self.refreshing = Some(self.next_refresh);
        self.settled.clear();
        RefreshTicket {
            token: self.next_refresh,
        }
    }

    /// Applies a reload if `ticket` is the one in flight. Returns whether the
    /// snapshot was taken; a superseded reload is dropped, errors included.
    pub fn apply_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: AppResult<CollectionMembership>,
    ) -> AppResult<bool> {
        if self.refreshing != Some(ticket.token) {
            tracing::debug!(
                token = ticket.token,
                current = ?self.refreshing,
                "Discarding stale membership reload"
            );
            return Ok(false);
        }
        self.refreshing = None;
        let settled = std::mem::take(&mut self.settled);

        match result {
            Ok(mut membership) => {
                for ((kind, movie_id), member) in settled {
                    membership.set(kind, movie_id, member);
                }
                self.reconcile(membership);
                Ok(true)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Replaces membership, keeping toggles still in flight
    fn reconcile(&mut self, mut membership: CollectionMembership) {
        for ((kind, movie_id), action) in &self.pending {
            membership.set(*kind, *movie_id, action.member_after());
        }
        self.membership = membership;
    }

    /// Forgets everything, including toggles and reloads still in flight
    pub fn clear(&mut self) {
        self.membership = CollectionMembership::default();
        self.pending.clear();
        self.settled.clear();
        self.refreshing = None;
        self.epoch += 1;
        self.last_error = None;
    }

    pub fn membership(&self) -> &CollectionMembership {
        &self.membership
    }

    pub fn is_pending(&self, kind: CollectionKind, movie_id: MovieId) -> bool {
        self.pending.contains_key(&(kind, movie_id))
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

/// Keeps a [`CollectionToggle`] in sync with a remote collection service
#[derive(Clone)]
pub struct CollectionSync {
    service: Arc<dyn CollectionService>,
    state: Arc<Mutex<CollectionToggle>>,
}

impl CollectionSync {
    pub fn new(service: Arc<dyn CollectionService>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(CollectionToggle::new())),
        }
    }

    pub async fn toggle_favorite(&self, movie_id: MovieId) -> AppResult<bool> {
        self.toggle(CollectionKind::Favorites, movie_id).await
    }

    pub async fn toggle_watchlist(&self, movie_id: MovieId) -> AppResult<bool> {
        self.toggle(CollectionKind::Watchlist, movie_id).await
    }

    pub async fn toggle(&self, kind: CollectionKind, movie_id: MovieId) -> AppResult<bool> {
        let ticket = self.state.lock().await.begin(kind, movie_id)?;

        let result = self
            .service
            .set_membership(kind, movie_id, ticket.action.member_after())
            .await;

        if let Err(e) = &result {
            tracing::warn!(
                movie_id = %movie_id,
                collection = %kind,
                error = %e,
                "Collection update failed, reverting"
            );
        }

        self.state.lock().await.complete(ticket, result)
    }

    /// Reloads membership for the session's user, or clears it when nobody is
    /// signed in. A failed reload keeps the previous membership; a reload
    /// overtaken by a newer one or by a sign-out is dropped.
    pub async fn refresh(&self, session: &SessionStore) -> AppResult<()> {
        if !session.is_authenticated().await {
            self.state.lock().await.clear();
            return Ok(());
        }

        let ticket = self.state.lock().await.begin_refresh();

        let loaded = async {
            let favorites = self.load_all(CollectionKind::Favorites).await?;
            let watchlist = self.load_all(CollectionKind::Watchlist).await?;
            Ok::<_, AppError>(CollectionMembership::new(favorites, watchlist))
        }
        .await;

        if let Err(e) = &loaded {
            tracing::warn!(token = ticket.token, error = %e, "Collection refresh failed");
        }

        let mut state = self.state.lock().await;
        if state.apply_refresh(ticket, loaded)? {
            let membership = state.membership();
            tracing::info!(
                favorites = membership.favorites.len(),
                watchlist = membership.watchlist.len(),
                "Collection membership refreshed"
            );
        }
        Ok(())
    }

    async fn load_all(&self, kind: CollectionKind) -> AppResult<HashSet<MovieId>> {
        let mut ids = HashSet::new();
        let mut page = 1;

        loop {
            let result = self.service.list(kind, page, CollectionSort::default()).await?;
            ids.extend(result.items.iter().map(|item| item.id));

            if page >= result.total_pages || page >= MAX_MEMBERSHIP_PAGES {
                break;
            }
            page += 1;
        }

        Ok(ids)
    }

    pub async fn is_favorite(&self, movie_id: MovieId) -> bool {
        self.contains(CollectionKind::Favorites, movie_id).await
    }

    pub async fn is_in_watchlist(&self, movie_id: MovieId) -> bool {
        self.contains(CollectionKind::Watchlist, movie_id).await
    }

    pub async fn contains(&self, kind: CollectionKind, movie_id: MovieId) -> bool {
        self.state.lock().await.membership().contains(kind, movie_id)
    }

    pub async fn membership(&self) -> CollectionMembership {
        self.state.lock().await.membership().clone()
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error().map(str::to_string)
    }
}
