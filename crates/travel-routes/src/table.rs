//! Static route table and path matching

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Screens the client can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Welcome,
    Register,
    Login,
    Community,
    PostDetail,
    NewPost,
    EditPost,
    FlightSearch,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Welcome => "welcome",
            View::Register => "register",
            View::Login => "login",
            View::Community => "community",
            View::PostDetail => "post_detail",
            View::NewPost => "new_post",
            View::EditPost => "edit_post",
            View::FlightSearch => "flight_search",
        };
        f.write_str(name)
    }
}

/// One entry of the route table. `:name` segments capture a parameter.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteDef {
    pub path: &'static str,
    pub view: View,
    pub requires_auth: bool,
}

pub const ROUTES: &[RouteDef] = &[
    RouteDef {
        path: "/",
        view: View::Welcome,
        requires_auth: false,
    },
    RouteDef {
        path: "/register",
        view: View::Register,
        requires_auth: false,
    },
    RouteDef {
        path: "/login",
        view: View::Login,
        requires_auth: false,
    },
    RouteDef {
        path: "/community",
        view: View::Community,
        requires_auth: true,
    },
    RouteDef {
        path: "/community/:id",
        view: View::PostDetail,
        requires_auth: true,
    },
    RouteDef {
        path: "/community/new",
        view: View::NewPost,
        requires_auth: true,
    },
    RouteDef {
        path: "/community/:id/edit",
        view: View::EditPost,
        requires_auth: true,
    },
    RouteDef {
        path: "/flights",
        view: View::FlightSearch,
        requires_auth: false,
    },
];

/// A resolved route with its captured parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route: &'static RouteDef,
    pub params: BTreeMap<String, String>,
}

/// Strip query/fragment and trailing slashes; `""` becomes `/`.
pub(crate) fn normalize(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Find the route for `path`. Static segments outrank `:param` segments,
/// so `/community/new` is the new-post view, not post `new`.
pub fn resolve(path: &str) -> Option<RouteMatch> {
    let normalized = normalize(path);
    let wanted = segments(&normalized);

    let mut best: Option<(usize, RouteMatch)> = None;
    for route in ROUTES {
        let pattern = segments(route.path);
        if pattern.len() != wanted.len() {
            continue;
        }

        let mut params = BTreeMap::new();
        let mut static_hits = 0;
        let matched = pattern.iter().zip(&wanted).all(|(p, w)| {
            if let Some(name) = p.strip_prefix(':') {
                params.insert(name.to_string(), (*w).to_string());
                true
            } else if p == w {
                static_hits += 1;
                true
            } else {
                false
            }
        });

        if matched && best.as_ref().is_none_or(|(hits, _)| static_hits > *hits) {
            best = Some((static_hits, RouteMatch { route, params }));
        }
    }
    best.map(|(_, m)| m)
}
