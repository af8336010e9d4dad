use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// TMDB account used for favorites and watchlist
    #[serde(default)]
    pub tmdb_account_id: Option<String>,

    /// TMDB session bound to the account above
    #[serde(default)]
    pub tmdb_session_id: Option<String>,

    /// Authentication backend base URL
    #[serde(default = "default_auth_api_url")]
    pub auth_api_url: String,

    /// Previously issued session token, if any
    #[serde(default)]
    pub session_token: Option<String>,

    /// Per-request timeout applied by the HTTP client
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_auth_api_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied() {
        let vars = vec![("TMDB_API_KEY".to_string(), "abc123".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.tmdb_api_key, "abc123");
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.auth_api_url, "http://localhost:5000/api");
        assert_eq!(config.tmdb_account_id, None);
        assert_eq!(config.session_token, None);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_api_key_fails() {
        let vars: Vec<(String, String)> = vec![];
        assert!(envy::from_iter::<_, Config>(vars).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("TMDB_API_KEY".to_string(), "abc123".to_string()),
            ("TMDB_ACCOUNT_ID".to_string(), "42".to_string()),
            ("TMDB_SESSION_ID".to_string(), "sess".to_string()),
            ("REQUEST_TIMEOUT_SECS".to_string(), "3".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.tmdb_account_id.as_deref(), Some("42"));
        assert_eq!(config.tmdb_session_id.as_deref(), Some("sess"));
        assert_eq!(config.request_timeout_secs, 3);
    }
}
