//! Typed calls against the travel backend
//!
//! Every function builds one `OutboundRequest` and runs it through
//! `Session::execute`, so 401 recovery is transparent here.
//!
//! Reads never fail: transport errors, error statuses and malformed bodies
//! are logged and replaced by an empty default. Writes return `Result` so a
//! failed post or delete is visible to the caller.

pub mod accounts;
pub mod community;
pub mod flights;
pub mod models;

pub use flights::RapidApi;
pub use models::{Comment, FlightRecord, FlightSearch, NewComment, NewPost, Post};
pub use travel_session::{Error, Result};

use travel_session::{OutboundRequest, Reply, Session};

/// Execute and turn error statuses into `Error::Status`.
pub(crate) async fn fetch(session: &Session, request: OutboundRequest) -> Result<Reply> {
    session.execute(request).await?.error_for_status()
}
