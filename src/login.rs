#[cfg(feature = "web")]
use axum::{
    Form,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "web")]
use crate::pages;

/// Alert shown when a login form is submitted incomplete.
pub const MISSING_CREDENTIALS: &str = "Please enter both username and password.";

/// Credential data for login
///
/// Used to receive login form data from the client.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Username for login
    #[serde(default)]
    pub username: String,

    /// Password in plaintext (only transmitted, never stored)
    #[serde(default)]
    pub password: String,
}

/// A login submission that must not go through.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: &'static str,
    /// What the user already typed, so the form can be shown again as it was
    pub username: String,
}

/// Checks a login form before it is submitted.
///
/// Either field being blank after trimming blocks the submission. An allowed
/// password goes through exactly as typed.
///
/// # Arguments
/// * `username` - Username as typed
/// * `password` - Password as typed
///
/// # Returns
/// * `Result<UserCredentials, ValidationError>` - The credentials to submit, or
///   the alert to show
///
/// # Examples
/// ```
/// use dashboard::login::validate_login;
///
/// assert!(validate_login("", "secret").is_err());
/// assert!(validate_login("bob", "secret").is_ok());
/// ```
pub fn validate_login(username: &str, password: &str) -> Result<UserCredentials, ValidationError> {
    let username = username.trim();

    if username.is_empty() || password.trim().is_empty() {
        return Err(ValidationError {
            message: MISSING_CREDENTIALS,
            username: username.to_string(),
        });
    }

    Ok(UserCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Serve the login page
#[cfg(feature = "web")]
pub async fn serve_login_page() -> Response {
    match pages::render_login(None, "") {
        Ok(html) => Html(html).into_response(),
        Err(e) => pages::render_failure(e),
    }
}

/// Handle login form submission
///
/// A complete form continues to the dashboard. An incomplete one re-renders
/// the login page with a blocking alert and the username already filled in.
///
/// # Arguments
/// * `credentials` - Form data containing the username and password
///
/// # Returns
/// * `Response` - Redirect to the dashboard, or the login page with an alert
#[cfg(feature = "web")]
pub async fn handle_login(Form(credentials): Form<UserCredentials>) -> Response {
    match validate_login(&credentials.username, &credentials.password) {
        Ok(valid) => {
            log::info!("login form accepted for '{}'", valid.username);
            let target = format!("/?user={}", urlencoding::encode(&valid.username));
            Redirect::to(&target).into_response()
        }
        Err(e) => {
            log::debug!("login form blocked: {}", e);
            match pages::render_login(Some(e.message), &e.username) {
                Ok(html) => (StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response(),
                Err(e) => pages::render_failure(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_username_is_blocked() {
        let err = validate_login("", "secret").unwrap_err();
        assert_eq!(err.message, MISSING_CREDENTIALS);
    }

    #[test]
    fn whitespace_only_password_is_blocked() {
        let err = validate_login("bob", "   ").unwrap_err();
        assert_eq!(err.username, "bob");
    }

    #[test]
    fn complete_form_is_allowed() {
        let creds = validate_login("  bob ", "secret").unwrap();
        assert_eq!(creds.username, "bob");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn password_is_submitted_as_typed() {
        let creds = validate_login("bob", " pass phrase ").unwrap();
        assert_eq!(creds.password, " pass phrase ");
    }
}
