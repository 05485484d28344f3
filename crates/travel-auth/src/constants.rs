//! Storage keys, endpoint paths and routes shared across the workspace

/// Token store key for the bearer access token. Its presence is the only
/// "authenticated" signal the client uses.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Token store key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Token store key for the display name returned at login
pub const USERNAME_KEY: &str = "username";

/// Refresh endpoint, resolved against the API origin
pub const REFRESH_PATH: &str = "/api/token/refresh/";

/// Login endpoint (username/password for a token pair)
pub const LOGIN_PATH: &str = "/api/accounts/login/";

/// Account registration endpoint
pub const REGISTER_PATH: &str = "/api/accounts/register/";

/// Client route users are sent to when authentication is required
pub const LOGIN_ROUTE: &str = "/login";
