//! Spotify credentials of a logged-in user
//!
//! The user row is the source of truth for tokens; the session keeps a copy in the
//! credential hash so page handlers can hand the access token to the browser.

use thiserror::Error;
use tracing::{debug, info};

use crate::db::{DbEngine, UserTable};
use crate::models::User;
use crate::spotify::{
    SpotifyApi, SpotifyCredentials, SpotifyError, SpotifyInfo, SpotifyProfile, SpotifyUserData,
    TokenSet,
};

/// Tokens expiring within this many seconds are refreshed ahead of use
pub const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No Spotify access token stored for this user")]
    MissingToken,

    #[error(transparent)]
    Spotify(#[from] SpotifyError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl SessionError {
    /// The user must log in again
    pub fn is_session_expired(&self) -> bool {
        match self {
            SessionError::MissingToken => true,
            SessionError::Spotify(e) => e.is_session_expired(),
            SessionError::Storage(_) => false,
        }
    }
}

/// Whether a token with this expiry should be refreshed at `now`
pub fn needs_refresh(expires_at: Option<i64>, now: i64) -> bool {
    match expires_at {
        Some(at) => at <= now + REFRESH_MARGIN_SECS,
        None => false,
    }
}

/// Credential hash for the session, rebuilt from the user row
pub fn credentials_for(user: &User) -> SpotifyUserData {
    SpotifyUserData {
        uid: user.uid.clone(),
        info: SpotifyInfo {
            nickname: user.nickname.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
        },
        credentials: SpotifyCredentials {
            token: user.access_token.clone().unwrap_or_default(),
            expires_at: user.token_expires_at,
            expires: user.token_expires_at.is_some(),
        },
    }
}

/// Copy a fresh token set onto the user, keeping the old refresh token unless rotated
pub fn apply_tokens(user: &mut User, tokens: &TokenSet, now: i64) {
    user.access_token = Some(tokens.access_token.clone());
    if let Some(refresh) = &tokens.refresh_token {
        user.refresh_token = Some(refresh.clone());
    }
    user.token_expires_at = Some(tokens.expires_at(now));
}

/// A user row for a Spotify account seen for the first time
pub fn user_from_profile(profile: &SpotifyProfile) -> User {
    let mut user = User::new(profile.id.clone());
    user.nickname = Some(profile.id.clone());
    user.name = profile.display_name.clone().filter(|n| !n.is_empty());
    user.email = profile.email.clone();
    user.image = profile.image_url();
    user
}

/// Refresh the user's access token when it is about to lapse.
///
/// Returns true when a refresh happened; the row and `user` both carry the new tokens.
pub async fn refresh_token_if_expired(
    db: &DbEngine,
    spotify: &dyn SpotifyApi,
    user: &mut User,
    now: i64,
) -> Result<bool, SessionError> {
    if !user.has_access_token() {
        return Err(SessionError::MissingToken);
    }

    if !needs_refresh(user.token_expires_at, now) {
        return Ok(false);
    }

    let refresh_token = match user.refresh_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => token.to_string(),
        None => {
            debug!("Token for user {} is expiring but no refresh token is stored", user.id);
            return Ok(false);
        }
    };

    let tokens = spotify.refresh_token(&refresh_token).await?;
    apply_tokens(user, &tokens, now);

    UserTable::update_tokens(
        db,
        user.id,
        &tokens.access_token,
        tokens.refresh_token.as_deref(),
        user.token_expires_at,
    )
    .await?;

    info!("Refreshed Spotify token for user {}", user.id);
    Ok(true)
}

/// Refresh when needed and hand back a usable access token
pub async fn fresh_access_token(
    db: &DbEngine,
    spotify: &dyn SpotifyApi,
    user: &mut User,
    now: i64,
) -> Result<String, SessionError> {
    refresh_token_if_expired(db, spotify, user, now).await?;
    user.access_token
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or(SessionError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeSpotify;
    use crate::db::test_engine;

    const NOW: i64 = 1_700_000_000;

    async fn stored_user(db: &DbEngine, expires_at: Option<i64>) -> User {
        let mut user = User::new("alice");
        user.access_token = Some("old-access".into());
        user.refresh_token = Some("old-refresh".into());
        user.token_expires_at = expires_at;
        user.id = UserTable::insert(db, &user).await.unwrap();
        user
    }

    #[test]
    fn test_needs_refresh_margin() {
        assert!(needs_refresh(Some(NOW), NOW));
        assert!(needs_refresh(Some(NOW + 60), NOW));
        assert!(!needs_refresh(Some(NOW + 61), NOW));
        assert!(!needs_refresh(None, NOW));
    }

    #[test]
    fn test_credentials_shape() {
        let mut user = User::new("alice");
        user.nickname = Some("ali".into());
        user.access_token = Some("tok".into());
        user.refresh_token = Some("secret-refresh".into());
        user.email = Some("alice@example.com".into());
        user.token_expires_at = Some(NOW);

        let data = credentials_for(&user);
        let value = serde_json::to_value(&data).unwrap();
        let raw = value.to_string();
        assert!(!raw.contains("secret-refresh"));
        assert!(!raw.contains("alice@example.com"));
        assert_eq!(value["uid"], "alice");
        assert_eq!(value["info"]["nickname"], "ali");
        assert_eq!(value["credentials"]["token"], "tok");
        assert_eq!(value["credentials"]["expires"], true);
    }

    #[test]
    fn test_apply_tokens_keeps_refresh_token() {
        let mut user = User::new("alice");
        user.refresh_token = Some("keep".into());
        let tokens = TokenSet {
            access_token: "new".into(),
            refresh_token: None,
            expires_in: 3600,
            scope: None,
        };

        apply_tokens(&mut user, &tokens, NOW);
        assert_eq!(user.access_token.as_deref(), Some("new"));
        assert_eq!(user.refresh_token.as_deref(), Some("keep"));
        assert_eq!(user.token_expires_at, Some(NOW + 3600));
    }

    #[tokio::test]
    async fn test_refresh_when_expiring() {
        let db = test_engine().await;
        let spotify = FakeSpotify::default();
        let mut user = stored_user(&db, Some(NOW + 30)).await;

        let refreshed = refresh_token_if_expired(&db, &spotify, &mut user, NOW)
            .await
            .unwrap();

        assert!(refreshed);
        assert_eq!(user.access_token.as_deref(), Some("refreshed-access"));
        let stored = UserTable::get_by_id(&db, user.id).await.unwrap().unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("refreshed-access"));
        assert_eq!(stored.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(stored.token_expires_at, Some(NOW + 3600));
    }

    #[tokio::test]
    async fn test_no_refresh_when_fresh() {
        let db = test_engine().await;
        let spotify = FakeSpotify::default();
        let mut user = stored_user(&db, Some(NOW + 3600)).await;

        let refreshed = refresh_token_if_expired(&db, &spotify, &mut user, NOW)
            .await
            .unwrap();
        assert!(!refreshed);
        assert_eq!(user.access_token.as_deref(), Some("old-access"));
    }

    #[tokio::test]
    async fn test_refresh_rejected() {
        let db = test_engine().await;
        let spotify = FakeSpotify {
            reject_refresh: true,
            ..FakeSpotify::default()
        };
        let mut user = stored_user(&db, Some(NOW - 10)).await;

        let err = refresh_token_if_expired(&db, &spotify, &mut user, NOW)
            .await
            .unwrap_err();
        assert!(err.is_session_expired());
    }

    #[tokio::test]
    async fn test_missing_token() {
        let db = test_engine().await;
        let spotify = FakeSpotify::default();
        let mut user = User::new("ghost");

        let err = refresh_token_if_expired(&db, &spotify, &mut user, NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MissingToken));
    }
}
