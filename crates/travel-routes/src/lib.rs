//! Client-side routes and the navigation guard
//!
//! The guard trusts only local token presence. A stale token still passes
//! and the session's refresh interceptor deals with the server rejecting it.

pub mod guard;
pub mod router;
pub mod table;

pub use guard::{GuardDecision, LOGIN_NOTICE, allowed, guard};
pub use router::{Location, Navigation, Router};
pub use table::{ROUTES, RouteDef, RouteMatch, View, resolve};
