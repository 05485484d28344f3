//! Navigation guard

use travel_auth::LOGIN_ROUTE;

use crate::table::RouteDef;

/// Message shown (blocking) when a protected view is refused.
pub const LOGIN_NOTICE: &str = "Login required.";

/// Outcome of the guard for one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect {
        to: &'static str,
        notice: &'static str,
    },
}

/// `false` only for a protected route without an access token.
pub fn allowed(requires_auth: bool, has_access_token: bool) -> bool {
    !(requires_auth && !has_access_token)
}

/// Decide a navigation to `target` (`None` for unknown paths).
pub fn guard(target: Option<&RouteDef>, has_access_token: bool) -> GuardDecision {
    let requires_auth = target.is_some_and(|r| r.requires_auth);
    if allowed(requires_auth, has_access_token) {
        GuardDecision::Proceed
    } else {
        GuardDecision::Redirect {
            to: LOGIN_ROUTE,
            notice: LOGIN_NOTICE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ROUTES;

    #[test]
    fn truth_table() {
        assert!(allowed(false, false));
        assert!(allowed(false, true));
        assert!(allowed(true, true));
        assert!(!allowed(true, false));
    }

    #[test]
    fn every_route_and_token_combination() {
        for route in ROUTES {
            for has_token in [false, true] {
                let decision = guard(Some(route), has_token);
                if route.requires_auth && !has_token {
                    assert_eq!(
                        decision,
                        GuardDecision::Redirect {
                            to: "/login",
                            notice: LOGIN_NOTICE
                        },
                        "{} without token",
                        route.path
                    );
                } else {
                    assert_eq!(decision, GuardDecision::Proceed, "{}", route.path);
                }
            }
        }
    }

    #[test]
    fn unknown_targets_proceed() {
        assert_eq!(guard(None, false), GuardDecision::Proceed);
    }
}
