//! Session context: token-aware HTTP client wrapper
//!
//! Owns the default header map and keeps its `Authorization` entry in step
//! with the token store. Every mutation of the stored tokens that goes
//! through the session updates the store first, then the header, before the
//! call returns, so the two never disagree past one refresh cycle.
//!
//! Observers subscribe to `SessionEvent`s instead of polling the store.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Url;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, info, instrument, warn};
use travel_auth::{
    ACCESS_TOKEN_KEY, LOGIN_ROUTE, LoginResponse, REFRESH_TOKEN_KEY, TokenPair, TokenStore,
    USERNAME_KEY,
};

use crate::error::{Error, Result};
use crate::interceptor::{InterceptAction, InterceptEvent, RequestState, handle_event};
use crate::metrics;
use crate::request::{OutboundRequest, Reply};

/// Buffered events per subscriber before old ones are dropped
const EVENT_CAPACITY: usize = 16;

/// Header echoed by the backend logs for correlation
const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Notifications for views/routers observing the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Stored tokens changed; `authenticated` is access-token presence.
    AuthChanged { authenticated: bool },
    /// Authentication was lost and could not be recovered.
    LoginRequired { redirect: String },
}

/// Authenticated session against one API origin.
pub struct Session {
    client: reqwest::Client,
    origin: Url,
    store: Arc<TokenStore>,
    default_headers: RwLock<HeaderMap>,
    refresh_gate: Mutex<()>,
    events: broadcast::Sender<SessionEvent>,
}

impl Session {
    /// Create a session, seeding `Authorization` from a stored access token.
    pub async fn new(client: reqwest::Client, origin: Url, store: Arc<TokenStore>) -> Result<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let session = Self {
            client,
            origin,
            store,
            default_headers: RwLock::new(HeaderMap::new()),
            refresh_gate: Mutex::new(()),
            events,
        };
        if session.sync_authorization().await {
            info!("access token found, authorization header seeded");
        } else {
            debug!("no access token stored, starting anonymous");
        }
        Ok(session)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Resolve an absolute API path against the origin.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.origin
            .join(path)
            .map_err(|e| Error::Url(format!("{} + {path}: {e}", self.origin)))
    }

    /// Register an observer.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current default `Authorization` value, if any.
    pub async fn authorization(&self) -> Option<String> {
        self.default_headers
            .read()
            .await
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    /// Access-token presence in the store. No server round-trip.
    pub async fn is_authenticated(&self) -> bool {
        self.store.contains(ACCESS_TOKEN_KEY).await
    }

    /// The "auth-changed" signal: re-read the store, resync the header, tell observers.
    ///
    /// Call this after writing the token store from outside the session.
    pub async fn notify_auth_changed(&self) {
        let authenticated = self.sync_authorization().await;
        let _ = self.events.send(SessionEvent::AuthChanged { authenticated });
    }

    /// Persist a token pair and resync. A pair without a refresh token keeps
    /// the stored one.
    ///
    /// An access token that cannot be sent as a header is rejected before
    /// anything is written.
    pub async fn store_tokens(&self, tokens: &TokenPair) -> Result<()> {
        bearer(&tokens.access)?;
        self.store.set(ACCESS_TOKEN_KEY, tokens.access.clone()).await?;
        if let Some(refresh) = &tokens.refresh {
            self.store.set(REFRESH_TOKEN_KEY, refresh.clone()).await?;
        }
        self.notify_auth_changed().await;
        Ok(())
    }

    /// Log in and store the resulting tokens.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let login =
            travel_auth::obtain_token_pair(&self.client, &self.origin, username, password).await?;
        self.store_tokens(&login.tokens).await?;
        if let Some(name) = &login.username {
            self.store.set(USERNAME_KEY, name.clone()).await?;
        }
        info!(username, "logged in");
        Ok(login)
    }

    /// Drop both tokens and the header. Safe to call repeatedly.
    pub async fn logout(&self) -> Result<()> {
        self.clear_credentials().await?;
        info!("logged out");
        Ok(())
    }

    /// Remove stored credentials and the default header, then notify.
    pub async fn clear_credentials(&self) -> Result<()> {
        self.store.remove(ACCESS_TOKEN_KEY).await?;
        self.store.remove(REFRESH_TOKEN_KEY).await?;
        self.store.remove(USERNAME_KEY).await?;
        self.notify_auth_changed().await;
        Ok(())
    }

    /// Send a request through the refresh interceptor.
    ///
    /// Every response the server produces comes back as `Ok(Reply)`,
    /// unchanged unless it was a recoverable 401. Only transport failures
    /// are `Err`.
    #[instrument(skip_all, fields(request_id = %request.id(), method = %request.method(), path = %request.url().path()))]
    pub async fn execute(&self, request: OutboundRequest) -> Result<Reply> {
        let mut request = request;
        let mut state = RequestState::Sent {
            retried: request.is_retry(),
        };

        loop {
            let (reply, used_token) = match self.send(&request).await {
                Ok(sent) => sent,
                Err(e) => {
                    let (failed, _) = handle_event(state, InterceptEvent::TransportFailed);
                    debug!(state = ?failed, error = %e, "request failed before a response");
                    return Err(e);
                }
            };

            let (next, action) = handle_event(
                state,
                InterceptEvent::Responded {
                    status: reply.status,
                },
            );
            state = next;

            if action != InterceptAction::Refresh {
                return Ok(reply);
            }

            let outcome = self.recover(used_token.as_deref()).await;
            let (next, action) = handle_event(state, outcome);
            state = next;

            match action {
                InterceptAction::Retry { access } => {
                    debug!(attempt = request.attempt() + 1, "retrying with refreshed token");
                    request = request.retry_with_token(&access)?;
                }
                InterceptAction::ForceLogout => {
                    self.force_logout().await;
                    return Ok(reply);
                }
                other => {
                    warn!(action = ?other, "unexpected interceptor action after refresh");
                    return Ok(reply);
                }
            }
        }
    }

    /// One wire exchange. Returns the reply and the session bearer token it
    /// carried. A request that brings its own `Authorization` reports `None`.
    async fn send(&self, request: &OutboundRequest) -> Result<(Reply, Option<String>)> {
        let mut headers = self.default_headers.read().await.clone();
        let used_token = if request.headers().contains_key(AUTHORIZATION) {
            None
        } else {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_owned)
        };
        for (name, value) in request.headers() {
            headers.insert(name.clone(), value.clone());
        }

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(headers);
        if let Ok(id) = HeaderValue::from_str(request.id()) {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = builder.send().await.map_err(|e| {
            metrics::record_transport_error();
            Error::Transport(format!("{} {}: {e}", request.method(), request.url()))
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| {
            metrics::record_transport_error();
            Error::Transport(format!("reading response body: {e}"))
        })?;

        metrics::record_request(status.as_u16(), started.elapsed().as_secs_f64());
        debug!(
            status = status.as_u16(),
            attempt = request.attempt(),
            "response received"
        );
        Ok((
            Reply {
                status,
                headers,
                body,
            },
            used_token,
        ))
    }

    /// Obtain a usable access token after a 401.
    ///
    /// Single-flight: concurrent 401s queue on the gate. A request sent with
    /// the session token that a sibling's refresh has since replaced reuses
    /// the new token instead of refreshing again. Requests that carried no
    /// session token always refresh.
    async fn recover(&self, used_token: Option<&str>) -> InterceptEvent {
        let _gate = self.refresh_gate.lock().await;

        if let (Some(used), Some(current)) =
            (used_token, self.store.get(ACCESS_TOKEN_KEY).await)
        {
            if used != current {
                debug!("access token already replaced by a concurrent refresh");
                return InterceptEvent::Refreshed { access: current };
            }
        }

        let Some(refresh) = self.store.get(REFRESH_TOKEN_KEY).await else {
            warn!("401 with no refresh token stored");
            metrics::record_refresh("missing_token");
            return InterceptEvent::RefreshTokenMissing;
        };

        match travel_auth::refresh_access(&self.client, &self.origin, &refresh).await {
            Ok(tokens) => {
                if let Err(e) = self.store_tokens(&tokens).await {
                    warn!(error = %e, "failed to persist refreshed token");
                    metrics::record_refresh("failure");
                    return InterceptEvent::RefreshFailed;
                }
                info!("access token refreshed");
                metrics::record_refresh("success");
                InterceptEvent::Refreshed {
                    access: tokens.access,
                }
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed");
                metrics::record_refresh("failure");
                InterceptEvent::RefreshFailed
            }
        }
    }

    /// Unrecoverable auth failure: clear everything and route to login.
    async fn force_logout(&self) {
        if let Err(e) = self.clear_credentials().await {
            warn!(error = %e, "failed to clear credentials during forced logout");
        }
        metrics::record_forced_logout();
        warn!(redirect = LOGIN_ROUTE, "session expired, login required");
        let _ = self.events.send(SessionEvent::LoginRequired {
            redirect: LOGIN_ROUTE.to_string(),
        });
    }

    /// Copy the stored access token into the default header. Returns
    /// whether a usable token is present.
    ///
    /// A stored token that is not a valid header value is dropped from the
    /// store and the session continues unauthenticated.
    async fn sync_authorization(&self) -> bool {
        let token = self.store.get(ACCESS_TOKEN_KEY).await;
        let value = match token.as_deref().map(bearer) {
            Some(Ok(value)) => Some(value),
            Some(Err(e)) => {
                warn!(error = %e, "discarding unusable stored access token");
                if let Err(e) = self.store.remove(ACCESS_TOKEN_KEY).await {
                    warn!(error = %e, "failed to remove unusable access token");
                }
                None
            }
            None => None,
        };

        let mut headers = self.default_headers.write().await;
        match value {
            Some(value) => {
                headers.insert(AUTHORIZATION, value);
                true
            }
            None => {
                headers.remove(AUTHORIZATION);
                false
            }
        }
    }
}

/// `Bearer <token>` as a sensitive header value.
fn bearer(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| Error::Header(format!("access token: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}
