//! Configuration module for SMIPE
//!
//! This module contains the service configuration and path management.

mod paths;
mod user_config;

pub use paths::Paths;
pub use user_config::UserConfig;

/// Name of the signed session cookie
pub const SESSION_COOKIE: &str = "_smipe_session";

/// Name of the cookie carrying the OAuth state between request and callback
pub const OAUTH_STATE_COOKIE: &str = "_smipe_oauth_state";

/// URL prefix under which uploaded playlist-location images are served
pub const UPLOADS_PREFIX: &str = "/uploads";
