//! Token storage and token endpoint calls for the travel backend
//!
//! The backend issues JWT access/refresh pairs. This crate owns the two
//! pieces that touch them directly and nothing else:
//! 1. `store::TokenStore` persists the pair under fixed keys
//! 2. `token::obtain_token_pair()` logs in, `token::refresh_access()` trades
//!    a refresh token for a new access token
//!
//! Deciding *when* to refresh is the session crate's job.

pub mod constants;
pub mod error;
pub mod store;
pub mod token;

pub use constants::*;
pub use error::{Error, Result};
pub use store::TokenStore;
pub use token::{
    LoginResponse, Registration, TokenPair, obtain_token_pair, refresh_access, register_account,
};
