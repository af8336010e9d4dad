/// TMDB API provider
///
/// Provides both the read-only movie catalog and the account collections
/// (favorites and watchlist).
///
/// API Flow:
/// 1. Listings: /trending/movie/week, /search/movie, /discover/movie → paginated envelopes
/// 2. Details: /movie/{id} with credits, videos, similar and recommendations appended
/// 3. Collections: /account/{account_id}/{favorite|watchlist}[/movies], scoped by session_id
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        CollectionKind, CollectionSort, Genre, GenreId, MovieDetail, MovieId, ResultPage, SortKey,
        TmdbGenreList, TmdbPage, TmdbStatus,
    },
    services::providers::{CollectionService, MovieCatalogService},
};
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const DETAIL_APPENDS: &str = "videos,credits,similar,recommendations";

/// Account and session that own the favorites and watchlist
#[derive(Debug, Clone, PartialEq)]
pub struct TmdbAccount {
    pub account_id: String,
    pub session_id: String,
}

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    account: Option<TmdbAccount>,
}

impl TmdbProvider {
    /// Creates a provider whose requests fail after `timeout`
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            account: None,
        })
    }

    /// Creates a provider from configuration, attaching the account when both
    /// the account id and session id are present
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let provider = Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.request_timeout(),
        )?;

        match (&config.tmdb_account_id, &config.tmdb_session_id) {
            (Some(account_id), Some(session_id)) => Ok(provider.with_account(TmdbAccount {
                account_id: account_id.clone(),
                session_id: session_id.clone(),
            })),
            _ => {
                tracing::debug!("No TMDB account configured; collection calls will fail");
                Ok(provider)
            }
        }
    }

    pub fn with_account(mut self, account: TmdbAccount) -> Self {
        self.account = Some(account);
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn account(&self) -> AppResult<&TmdbAccount> {
        self.account
            .as_ref()
            .ok_or_else(|| AppError::Auth("No TMDB account session configured".to_string()))
    }

    /// Turns a non-success response into an error carrying TMDB's status message
    async fn check_status(response: Response) -> AppResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<TmdbStatus>(&body)
            .ok()
            .and_then(|s| s.status_message)
            .unwrap_or(body);

        Err(AppError::ExternalApi(format!(
            "TMDB API returned status {}: {}",
            status, message
        )))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let response = self
            .http_client
            .get(self.endpoint(path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get_page(&self, path: &str, params: &[(&str, String)]) -> AppResult<ResultPage> {
        let page: TmdbPage = self.get_json(path, params).await?;
        let page = ResultPage::from(page);

        tracing::info!(
            path = %path,
            page = page.page_number,
            total_pages = page.total_pages,
            results = page.items.len(),
            provider = "tmdb",
            "Listing fetched"
        );

        Ok(page)
    }

    async fn list_collection(
        &self,
        kind: CollectionKind,
        page: u32,
        sort: CollectionSort,
    ) -> AppResult<ResultPage> {
        let account = self.account()?;
        let path = format!("/account/{}/{}/movies", account.account_id, kind.as_path());

        self.get_page(
            &path,
            &[
                ("session_id", account.session_id.clone()),
                ("page", page.to_string()),
                ("sort_by", sort.as_param().to_string()),
            ],
        )
        .await
    }

    async fn post_membership(
        &self,
        kind: CollectionKind,
        movie_id: MovieId,
        member: bool,
    ) -> AppResult<()> {
        let account = self.account()?;
        let path = format!("/account/{}/{}", account.account_id, kind.as_path());

        let body = match kind {
            CollectionKind::Favorites => json!({
                "media_type": "movie",
                "media_id": movie_id.0,
                "favorite": member,
            }),
            CollectionKind::Watchlist => json!({
                "media_type": "movie",
                "media_id": movie_id.0,
                "watchlist": member,
            }),
        };

        let response = self
            .http_client
            .post(self.endpoint(&path))
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("session_id", account.session_id.as_str()),
            ])
            .json(&body)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let status: TmdbStatus = response.json().await?;

        if status.success == Some(false) {
            return Err(AppError::ExternalApi(format!(
                "TMDB rejected {} update for movie {}: {}",
                kind,
                movie_id,
                status.status_message.unwrap_or_default()
            )));
        }

        tracing::info!(
            movie_id = %movie_id,
            collection = %kind,
            member = member,
            provider = "tmdb",
            "Collection membership updated"
        );

        Ok(())
    }
}

#[async_trait::async_trait]
impl MovieCatalogService for TmdbProvider {
    async fn get_trending(&self, page: u32) -> AppResult<ResultPage> {
        self.get_page("/trending/movie/week", &[("page", page.to_string())])
            .await
    }

    async fn search_movies(&self, query: &str, page: u32) -> AppResult<ResultPage> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "Search query cannot be empty".to_string(),
            ));
        }

        self.get_page(
            "/search/movie",
            &[
                ("query", query.to_string()),
                ("page", page.to_string()),
                ("include_adult", "false".to_string()),
            ],
        )
        .await
    }

    async fn discover_by_genre(
        &self,
        genre_id: GenreId,
        sort: SortKey,
        page: u32,
    ) -> AppResult<ResultPage> {
        self.get_page(
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
                ("sort_by", sort.as_param().to_string()),
            ],
        )
        .await
    }

    async fn get_genre_list(&self) -> AppResult<Vec<Genre>> {
        let list: TmdbGenreList = self.get_json("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }

    async fn get_movie_detail(&self, id: MovieId) -> AppResult<MovieDetail> {
        let detail: MovieDetail = self
            .get_json(
                &format!("/movie/{}", id),
                &[("append_to_response", DETAIL_APPENDS.to_string())],
            )
            .await?;

        tracing::info!(movie_id = %id, provider = "tmdb", "Movie details fetched");

        Ok(detail)
    }
}

#[async_trait::async_trait]
impl CollectionService for TmdbProvider {
    async fn list_favorites(&self, page: u32, sort: CollectionSort) -> AppResult<ResultPage> {
        self.list_collection(CollectionKind::Favorites, page, sort)
            .await
    }

    async fn list_watchlist(&self, page: u32, sort: CollectionSort) -> AppResult<ResultPage> {
        self.list_collection(CollectionKind::Watchlist, page, sort)
            .await
    }

    async fn add_favorite(&self, movie_id: MovieId) -> AppResult<()> {
        self.post_membership(CollectionKind::Favorites, movie_id, true)
            .await
    }

    async fn remove_favorite(&self, movie_id: MovieId) -> AppResult<()> {
        self.post_membership(CollectionKind::Favorites, movie_id, false)
            .await
    }

    async fn add_to_watchlist(&self, movie_id: MovieId) -> AppResult<()> {
        self.post_membership(CollectionKind::Watchlist, movie_id, true)
            .await
    }

    async fn remove_from_watchlist(&self, movie_id: MovieId) -> AppResult<()> {
        self.post_membership(CollectionKind::Watchlist, movie_id, false)
            .await
    }
}
