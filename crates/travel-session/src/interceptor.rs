//! Refresh interceptor state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! `Session::execute` performs the I/O each action implies.
//!
//! ```text
//! Sent ──2xx/4xx/5xx──▶ Completed
//!   │  └─transport─────▶ Failed
//!   └─401 (first try)─▶ RefreshAttempted ──new token──▶ Retried ──▶ Completed
//!                              └─no token / failure──▶ GaveUp
//! ```
//!
//! A request that is already a retry never leaves `Sent` through the
//! refresh edge, so at most one refresh happens per request.

use reqwest::StatusCode;
use tracing::warn;

/// Interceptor state for one logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// On the wire. `retried` is the retry marker of the descriptor.
    Sent { retried: bool },
    /// A response was delivered to the caller
    Completed { status: StatusCode },
    /// Transport failure delivered to the caller
    Failed,
    /// 401 seen, refresh in progress
    RefreshAttempted,
    /// Re-sent with the refreshed token
    Retried,
    /// Refresh impossible; session forced back to login
    GaveUp,
}

/// Events fed to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptEvent {
    /// The server answered
    Responded { status: StatusCode },
    /// Connection, timeout or body read error
    TransportFailed,
    /// 401 but no refresh token in the store
    RefreshTokenMissing,
    /// Refresh endpoint returned a new access token
    Refreshed { access: String },
    /// Refresh endpoint failed or answered without an access token
    RefreshFailed,
}

/// What the session should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptAction {
    /// Hand the current outcome to the caller unchanged
    Deliver,
    /// Call the refresh endpoint
    Refresh,
    /// Re-send the original request with this bearer token
    Retry { access: String },
    /// Clear tokens and header, send the user to login, deliver the original failure
    ForceLogout,
    /// No-op
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: RequestState, event: InterceptEvent) -> (RequestState, InterceptAction) {
    match (state, event) {
        // --- first response ---
        (RequestState::Sent { retried: false }, InterceptEvent::Responded { status })
            if status == StatusCode::UNAUTHORIZED =>
        {
            (RequestState::RefreshAttempted, InterceptAction::Refresh)
        }

        (RequestState::Sent { .. } | RequestState::Retried, InterceptEvent::Responded { status }) => {
            (RequestState::Completed { status }, InterceptAction::Deliver)
        }

        (RequestState::Sent { .. } | RequestState::Retried, InterceptEvent::TransportFailed) => {
            (RequestState::Failed, InterceptAction::Deliver)
        }

        // --- refresh outcome ---
        (RequestState::RefreshAttempted, InterceptEvent::Refreshed { access }) => {
            (RequestState::Retried, InterceptAction::Retry { access })
        }

        (
            RequestState::RefreshAttempted,
            InterceptEvent::RefreshTokenMissing | InterceptEvent::RefreshFailed,
        ) => (RequestState::GaveUp, InterceptAction::ForceLogout),

        // --- anything else is a driver bug; stay put ---
        (state, event) => {
            warn!(?state, ?event, "ignoring event with no transition");
            (state, InterceptAction::None)
        }
    }
}
