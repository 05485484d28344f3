//! Token endpoint calls
//!
//! Three interactions with the backend's auth endpoints, all JSON bodies:
//! 1. Login: username/password for an access/refresh pair
//! 2. Refresh: refresh token for a new access token
//! 3. Registration (no tokens issued; the user logs in afterwards)
//!
//! Paths are absolute and resolved against the API origin.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::constants::{LOGIN_PATH, REFRESH_PATH, REGISTER_PATH};
use crate::error::{Error, Result};

/// Access token plus the refresh token, when the server sent one.
///
/// Login always carries both. Refresh carries `refresh` only when the
/// server rotates refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TokenPair {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Login response: the token pair plus the canonical username.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    #[serde(default)]
    pub username: Option<String>,
}

/// Raw refresh response; `access` may be missing on a misbehaving server.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
}

/// New account fields. `password2` must repeat `password`; the server
/// validates it.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub password: String,
    pub password2: String,
}

fn endpoint(origin: &Url, path: &str) -> Result<Url> {
    origin
        .join(path)
        .map_err(|e| Error::Url(format!("{origin} + {path}: {e}")))
}

/// Exchange a refresh token for a new access token.
///
/// A response without an `access` field is an error: the caller treats it
/// the same as a network failure.
pub async fn refresh_access(
    client: &reqwest::Client,
    origin: &Url,
    refresh: &str,
) -> Result<TokenPair> {
    let response = client
        .post(endpoint(origin, REFRESH_PATH)?)
        .json(&serde_json::json!({ "refresh": refresh }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("token refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));

        // 401/403 means the refresh token is expired or blacklisted
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(Error::InvalidCredentials(format!(
                "refresh token rejected ({status}): {body}"
            )));
        }

        return Err(Error::TokenExchange(format!(
            "token refresh returned {status}: {body}"
        )));
    }

    let parsed = response
        .json::<RefreshResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid refresh response: {e}")))?;

    match parsed.access {
        Some(access) if !access.is_empty() => Ok(TokenPair {
            access,
            refresh: parsed.refresh,
        }),
        _ => Err(Error::TokenExchange(
            "refresh response missing access token".into(),
        )),
    }
}

/// Log in with username and password.
pub async fn obtain_token_pair(
    client: &reqwest::Client,
    origin: &Url,
    username: &str,
    password: &str,
) -> Result<LoginResponse> {
    let response = client
        .post(endpoint(origin, LOGIN_PATH)?)
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("login request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        if status.as_u16() == 401 {
            return Err(Error::InvalidCredentials(format!("login rejected: {body}")));
        }
        return Err(Error::TokenExchange(format!(
            "login returned {status}: {body}"
        )));
    }

    response
        .json::<LoginResponse>()
        .await
        .map_err(|e| Error::TokenExchange(format!("invalid login response: {e}")))
}

/// Create an account. Validation failures (400) come back as `Rejected`
/// with the server's field errors verbatim.
pub async fn register_account(
    client: &reqwest::Client,
    origin: &Url,
    registration: &Registration,
) -> Result<()> {
    let response = client
        .post(endpoint(origin, REGISTER_PATH)?)
        .json(registration)
        .send()
        .await
        .map_err(|e| Error::Http(format!("registration request failed: {e}")))?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("<no body>"));
    Err(Error::Rejected(format!("registration returned {status}: {body}")))
}
