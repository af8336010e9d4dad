/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Coarse error taxonomy exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fetch failed or timed out; reissue the same operation to retry
    Network,
    /// Caller misuse, not retryable
    InvalidArgument,
    /// A toggle for the same movie is still in flight
    ConcurrentModification,
    /// Surfaced by the session store
    Auth,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::HttpClient(_) | AppError::ExternalApi(_) => ErrorKind::Network,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            AppError::Auth(_) => ErrorKind::Auth,
        }
    }

    /// Whether reissuing the failed operation may succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Network
    }
}

pub type AppResult<T> = Result<T, AppError>;
