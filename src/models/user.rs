use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

lazy_static! {
    static ref EMAIL_PATTERN: Regex = Regex::new(r"\S+@\S+\.\S+").expect("valid email pattern");
}

/// Authenticated identity as returned by the auth backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn validate(&self) -> AppResult<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn validate(&self) -> AppResult<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

/// Body of a successful login or registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

fn validate_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Err(AppError::InvalidArgument("Username is required".to_string()));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> AppResult<()> {
    if email.is_empty() {
        return Err(AppError::InvalidArgument("Email is required".to_string()));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(AppError::InvalidArgument("Email is invalid".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::InvalidArgument("Password is required".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidArgument(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_valid_credentials() {
        assert!(credentials("neo@zion.io", "redpill").validate().is_ok());
    }

    #[test]
    fn test_invalid_email_rejected() {
        let err = credentials("neo-at-zion", "redpill").validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Email is invalid");

        let err = credentials("", "redpill").validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Email is required");
    }

    #[test]
    fn test_short_password_rejected() {
        let err = credentials("neo@zion.io", "pill").validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_registration_requires_username() {
        let registration = Registration {
            username: "ne".to_string(),
            email: "neo@zion.io".to_string(),
            password: "redpill".to_string(),
        };
        assert!(matches!(
            registration.validate(),
            Err(AppError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_profile_update_validates_present_fields_only() {
        assert!(ProfileUpdate::default().validate().is_ok());

        let update = ProfileUpdate {
            email: Some("broken".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_profile_update_skips_absent_fields() {
        let update = ProfileUpdate {
            username: Some("trinity".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({ "username": "trinity" }));
    }
}
