//! Account actions routed through the session

use tracing::info;
use travel_auth::{LoginResponse, Registration};
use travel_session::Session;

use crate::Result;

/// Log in; the session stores the pair and the username and resyncs its header.
pub async fn login(session: &Session, username: &str, password: &str) -> Result<LoginResponse> {
    session.login(username, password).await
}

/// Create an account. Does not log in.
pub async fn register(session: &Session, registration: &Registration) -> Result<()> {
    travel_auth::register_account(session.client(), session.origin(), registration).await?;
    info!(username = %registration.username, "account registered");
    Ok(())
}

pub async fn logout(session: &Session) -> Result<()> {
    session.logout().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::testing::{serve, session};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use travel_auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USERNAME_KEY};

    fn accounts() -> Router {
        Router::new()
            .route(
                travel_auth::LOGIN_PATH,
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "pw" {
                        (
                            StatusCode::OK,
                            Json(json!({ "access": "A1", "refresh": "R1", "username": body["username"] })),
                        )
                    } else {
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({ "detail": "No active account" })),
                        )
                    }
                }),
            )
            .route(
                travel_auth::REGISTER_PATH,
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == body["password2"] {
                        (StatusCode::CREATED, Json(json!({ "username": body["username"] })))
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "password": ["Password fields didn't match."] })),
                        )
                    }
                }),
            )
    }

    fn registration(password2: &str) -> Registration {
        Registration {
            username: "mina".into(),
            email: "mina@example.com".into(),
            nickname: "mina".into(),
            password: "pw".into(),
            password2: password2.into(),
        }
    }

    #[tokio::test]
    async fn login_then_logout_round_trips_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir, serve(accounts()).await, false).await;

        let response = login(&session, "mina", "pw").await.unwrap();
        assert_eq!(response.tokens.access, "A1");
        assert_eq!(session.authorization().await.as_deref(), Some("Bearer A1"));
        let store = session.store();
        assert_eq!(store.get(REFRESH_TOKEN_KEY).await.as_deref(), Some("R1"));
        assert_eq!(store.get(USERNAME_KEY).await.as_deref(), Some("mina"));

        logout(&session).await.unwrap();
        assert!(store.get(ACCESS_TOKEN_KEY).await.is_none());
        assert!(session.authorization().await.is_none());
    }

    #[tokio::test]
    async fn bad_password_leaves_session_anonymous() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir, serve(accounts()).await, false).await;

        let err = login(&session, "mina", "wrong").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(travel_auth::Error::InvalidCredentials(_))
        ));
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn registration_rejection_carries_field_errors() {
        let dir = tempfile::tempdir().unwrap();
        let session = session(&dir, serve(accounts()).await, false).await;

        register(&session, &registration("pw")).await.unwrap();

        let err = register(&session, &registration("other")).await.unwrap_err();
        assert!(err.to_string().contains("didn't match"), "{err}");
        assert!(!session.is_authenticated().await);
    }
}
