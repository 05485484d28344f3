//! Stateful router: current location plus guarded navigation

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};
use travel_auth::{ACCESS_TOKEN_KEY, TokenStore};
use travel_session::SessionEvent;

use crate::guard::{GuardDecision, guard};
use crate::table::{View, normalize, resolve};

/// Where the router currently is. `view` is `None` for unknown paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    pub view: Option<View>,
    pub params: BTreeMap<String, String>,
}

impl Location {
    fn at(path: &str) -> Self {
        match resolve(path) {
            Some(m) => Self {
                path: normalize(path),
                view: Some(m.route.view),
                params: m.params,
            },
            None => Self {
                path: normalize(path),
                view: None,
                params: BTreeMap::new(),
            },
        }
    }
}

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Navigation {
    Arrived {
        location: Location,
    },
    /// Guard refused the target; `notice` must be shown to the user.
    Redirected {
        requested: String,
        location: Location,
        notice: &'static str,
    },
}

impl Navigation {
    pub fn location(&self) -> &Location {
        match self {
            Navigation::Arrived { location } | Navigation::Redirected { location, .. } => location,
        }
    }
}

/// Router over the static route table, guarded by token presence.
pub struct Router {
    store: Arc<TokenStore>,
    current: Location,
}

impl Router {
    /// Start at `/`.
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self {
            store,
            current: Location::at("/"),
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Navigate to `path`, consulting the token store on every call.
    pub async fn navigate(&mut self, path: &str) -> Navigation {
        let target = resolve(path);
        let has_token = self.store.contains(ACCESS_TOKEN_KEY).await;

        match guard(target.as_ref().map(|m| m.route), has_token) {
            GuardDecision::Proceed => {
                self.current = Location::at(path);
                debug!(path = %self.current.path, "navigated");
                Navigation::Arrived {
                    location: self.current.clone(),
                }
            }
            GuardDecision::Redirect { to, notice } => {
                info!(requested = path, redirect = to, "navigation blocked by guard");
                self.current = Location::at(to);
                Navigation::Redirected {
                    requested: normalize(path),
                    location: self.current.clone(),
                    notice,
                }
            }
        }
    }

    /// React to a session event. Only `LoginRequired` moves the router.
    pub async fn apply(&mut self, event: &SessionEvent) -> Option<Navigation> {
        match event {
            SessionEvent::LoginRequired { redirect } => Some(self.navigate(redirect).await),
            SessionEvent::AuthChanged { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn router_with(dir: &tempfile::TempDir, token: Option<&str>) -> Router {
        let store = TokenStore::load(dir.path().join("tokens.json"))
            .await
            .unwrap();
        if let Some(token) = token {
            store.set(ACCESS_TOKEN_KEY, token.into()).await.unwrap();
        }
        Router::new(Arc::new(store))
    }

    #[tokio::test]
    async fn starts_at_welcome() {
        let dir = tempfile::tempdir().unwrap();
        let router = router_with(&dir, None).await;
        assert_eq!(router.current().view, Some(View::Welcome));
    }

    #[tokio::test]
    async fn protected_route_without_token_redirects_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router_with(&dir, None).await;

        let nav = router.navigate("/community/7").await;

        match nav {
            Navigation::Redirected {
                requested,
                location,
                notice,
            } => {
                assert_eq!(requested, "/community/7");
                assert_eq!(location.path, "/login");
                assert_eq!(location.view, Some(View::Login));
                assert_eq!(notice, crate::LOGIN_NOTICE);
            }
            other => panic!("expected redirect, got {other:?}"),
        }
        assert_eq!(router.current().path, "/login");
    }

    #[tokio::test]
    async fn stale_token_still_passes_guard() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router_with(&dir, Some("expired-but-present")).await;

        let nav = router.navigate("/community/7/edit").await;

        assert!(matches!(nav, Navigation::Arrived { .. }));
        assert_eq!(router.current().view, Some(View::EditPost));
        assert_eq!(
            router.current().params.get("id").map(String::as_str),
            Some("7")
        );
    }

    #[tokio::test]
    async fn guard_reads_store_on_every_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            TokenStore::load(dir.path().join("tokens.json"))
                .await
                .unwrap(),
        );
        let mut router = Router::new(store.clone());

        assert!(matches!(
            router.navigate("/community").await,
            Navigation::Redirected { .. }
        ));

        store.set(ACCESS_TOKEN_KEY, "T1".into()).await.unwrap();
        assert!(matches!(
            router.navigate("/community").await,
            Navigation::Arrived { .. }
        ));

        store.remove(ACCESS_TOKEN_KEY).await.unwrap();
        assert!(matches!(
            router.navigate("/community/new").await,
            Navigation::Redirected { .. }
        ));
    }

    #[tokio::test]
    async fn public_and_unknown_routes_proceed() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router_with(&dir, None).await;

        let nav = router.navigate("/flights").await;
        assert_eq!(nav.location().view, Some(View::FlightSearch));

        let nav = router.navigate("/somewhere-else").await;
        assert!(matches!(nav, Navigation::Arrived { .. }));
        assert_eq!(nav.location().view, None);
    }

    #[tokio::test]
    async fn login_required_event_moves_router() {
        let dir = tempfile::tempdir().unwrap();
        let mut router = router_with(&dir, None).await;
        router.navigate("/flights").await;

        let ignored = router
            .apply(&SessionEvent::AuthChanged {
                authenticated: false,
            })
            .await;
        assert!(ignored.is_none());
        assert_eq!(router.current().view, Some(View::FlightSearch));

        let nav = router
            .apply(&SessionEvent::LoginRequired {
                redirect: "/login".into(),
            })
            .await
            .unwrap();
        assert_eq!(nav.location().view, Some(View::Login));
    }

    #[test]
    fn navigation_serializes_with_outcome_tag() {
        let nav = Navigation::Redirected {
            requested: "/community".into(),
            location: Location::at("/login"),
            notice: crate::LOGIN_NOTICE,
        };
        let json = serde_json::to_value(&nav).unwrap();
        assert_eq!(json["outcome"], "redirected");
        assert_eq!(json["location"]["view"], "login");
    }
}
