//! Authenticated HTTP session for the travel backend
//!
//! `Session` is the one object every outbound call goes through. It keeps
//! the default `Authorization` header in step with the token store and runs
//! each request through the refresh interceptor.
//!
//! Request lifecycle:
//! 1. Caller builds an `OutboundRequest` and calls `Session::execute()`
//! 2. Session merges default headers (bearer token) and sends it
//! 3. Non-401 responses come back unchanged as a `Reply`
//! 4. A first 401 triggers one refresh against the refresh endpoint
//! 5. On success the store and header are updated and the request is
//!    re-sent once with `attempt + 1`; the caller only sees the retry's reply
//! 6. On failure both tokens are cleared, `SessionEvent::LoginRequired` is
//!    broadcast and the original 401 reply is returned

pub mod error;
pub mod interceptor;
pub mod metrics;
pub mod request;
pub mod session;

pub use error::{Error, Result};
pub use interceptor::{InterceptAction, InterceptEvent, RequestState, handle_event};
pub use request::{OutboundRequest, Reply};
pub use session::{Session, SessionEvent};
