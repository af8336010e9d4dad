use std::{sync::Arc, time::Duration};

use reqwest::{Client as HttpClient, Response};
use serde::{de::DeserializeOwned, Deserialize};
use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{AuthResponse, Credentials, ProfileUpdate, Registration, User},
};

/// Remote authentication backend
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> AppResult<AuthResponse>;

    async fn register(&self, registration: &Registration) -> AppResult<AuthResponse>;

    /// Resolves the user a previously issued token belongs to
    async fn current_user(&self, token: &str) -> AppResult<User>;

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> AppResult<User>;
}

/// `AuthService` over the backend's `/auth` endpoints
#[derive(Clone)]
pub struct HttpAuthService {
    http_client: HttpClient,
    api_url: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl HttpAuthService {
    pub fn new(api_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            http_client: HttpClient::builder().timeout(timeout).build()?,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(config.auth_api_url.clone(), config.request_timeout())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth{}", self.api_url, path)
    }

    /// Decodes a success body; any other status becomes an auth error
    async fn read<T: DeserializeOwned>(response: Response, fallback: &str) -> AppResult<T> {
        if response.status().is_success() {
            return Ok(response.json::<T>().await?);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_else(|_| fallback.to_string());

        tracing::debug!(status = %status, message = %message, "Auth request rejected");

        Err(AppError::Auth(message))
    }
}

#[async_trait::async_trait]
impl AuthService for HttpAuthService {
    async fn login(&self, credentials: &Credentials) -> AppResult<AuthResponse> {
        let response = self
            .http_client
            .post(self.endpoint("/login"))
            .json(credentials)
            .send()
            .await?;
        Self::read(response, "Invalid credentials").await
    }

    async fn register(&self, registration: &Registration) -> AppResult<AuthResponse> {
        let response = self
            .http_client
            .post(self.endpoint("/register"))
            .json(registration)
            .send()
            .await?;
        Self::read(response, "Registration failed").await
    }

    async fn current_user(&self, token: &str) -> AppResult<User> {
        let response = self
            .http_client
            .get(self.endpoint("/me"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::read(response, "Failed to get user data").await
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> AppResult<User> {
        let response = self
            .http_client
            .put(self.endpoint("/profile"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;
        Self::read(response, "Failed to update profile").await
    }
}

#[derive(Debug, Clone)]
struct Session {
    user: User,
    token: String,
}

/// The current authenticated identity.
///
/// Created on app start with [`SessionStore::init`], torn down with
/// [`SessionStore::logout`], and passed explicitly to whatever needs it.
pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    session: RwLock<Option<Session>>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self {
            auth,
            session: RwLock::new(None),
        }
    }

    /// Restores a session from a stored token. A token the backend no longer
    /// accepts is dropped and the store starts signed out.
    pub async fn init(&self, token: Option<String>) -> Option<User> {
        let token = token?;

        match self.auth.current_user(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Session restored");
                *self.session.write().await = Some(Session {
                    user: user.clone(),
                    token,
                });
                Some(user)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored session token rejected");
                *self.session.write().await = None;
                None
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<User> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        credentials.validate()?;

        let response = self.auth.login(&credentials).await?;
        tracing::info!(user_id = %response.user.id, "Signed in");
        Ok(self.establish(response).await)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> AppResult<User> {
        let registration = Registration {
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        registration.validate()?;

        let response = self.auth.register(&registration).await?;
        tracing::info!(user_id = %response.user.id, "Account registered");
        Ok(self.establish(response).await)
    }

    async fn establish(&self, response: AuthResponse) -> User {
        let user = response.user.clone();
        *self.session.write().await = Some(Session {
            user: response.user,
            token: response.token,
        });
        user
    }

    /// Ends the session, returning the user that was signed in
    pub async fn logout(&self) -> Option<User> {
        let previous = self.session.write().await.take();
        if let Some(session) = &previous {
            tracing::info!(user_id = %session.user.id, "Signed out");
        }
        previous.map(|session| session.user)
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> AppResult<User> {
        update.validate()?;

        let token = self
            .token()
            .await
            .ok_or_else(|| AppError::Auth("Not signed in".to_string()))?;

        let user = self.auth.update_profile(&token, &update).await?;

        let mut session = self.session.write().await;
        match session.as_mut() {
            // signed out while the update was in flight
            None => Err(AppError::Auth("Not signed in".to_string())),
            Some(current) => {
                current.user = user.clone();
                Ok(user)
            }
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.read().await.as_ref().map(|s| s.user.clone())
    }

    pub async fn token(&self) -> Option<String> {
        self.session.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }
}
