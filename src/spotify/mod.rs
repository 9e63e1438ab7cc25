//! Spotify Web API client
//!
//! Users authenticate with the authorization-code flow; their tokens drive every
//! per-user call. Public lookups (playlist covers on the map) use an app token from the
//! client-credentials flow.

mod client;
pub mod models;
pub mod uri;

use async_trait::async_trait;
use thiserror::Error;

pub use client::SpotifyClient;
pub use models::{
    SimplePlaylist, SpotifyCredentials, SpotifyInfo, SpotifyProfile, SpotifyUserData, TokenSet,
    Track,
};

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("Spotify request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Spotify resource not found: {0}")]
    NotFound(String),

    #[error("Spotify client credentials are not configured")]
    MissingCredentials,

    #[error("Spotify configuration error: {0}")]
    Config(String),
}

impl SpotifyError {
    /// Spotify rejected the user's token or grant
    pub fn is_session_expired(&self) -> bool {
        matches!(self, SpotifyError::Api { status: 400 | 401, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SpotifyError::NotFound(_))
    }
}

/// Operations the web layer needs from Spotify
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Authorize URL for the request phase of the OAuth dance
    fn authorize_url(&self, state: &str) -> Result<String, SpotifyError>;

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, SpotifyError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, SpotifyError>;

    async fn me(&self, token: &str) -> Result<SpotifyProfile, SpotifyError>;

    /// Every playlist owned or followed by the token's user
    async fn user_playlists(&self, token: &str) -> Result<Vec<SimplePlaylist>, SpotifyError>;

    /// Tracks of a playlist; `limit` of None fetches every page
    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, SpotifyError>;

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyError>;

    /// Cover image of a public playlist, looked up with the app token
    async fn playlist_cover(&self, playlist_id: &str) -> Result<Option<String>, SpotifyError>;
}
