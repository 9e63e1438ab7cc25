//! reqwest-backed Spotify client

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::models::{Paging, PlaylistTrackItem, SpotifyImage};
use super::{SimplePlaylist, SpotifyApi, SpotifyError, SpotifyProfile, TokenSet, Track};
use crate::config::UserConfig;

const PLAYLISTS_PAGE_SIZE: u32 = 50;
const TRACKS_PAGE_SIZE: u32 = 100;

/// Spotify client with a cached client-credentials token
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: String,
    accounts_url: String,
    api_url: String,
    app_token: Arc<RwLock<Option<CachedToken>>>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Api { message: String },
    OAuth(String),
}

impl SpotifyClient {
    pub fn new(config: &UserConfig) -> Result<Self, SpotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            client_id: config.spotify_client_id.clone(),
            client_secret: config.spotify_client_secret.clone(),
            redirect_uri: config.callback_url(),
            scopes: config.spotify_scopes.clone(),
            accounts_url: config.spotify_accounts_url.trim_end_matches('/').to_string(),
            api_url: config.spotify_api_url.trim_end_matches('/').to_string(),
            app_token: Arc::new(RwLock::new(None)),
        })
    }

    fn ensure_credentials(&self) -> Result<(), SpotifyError> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(SpotifyError::MissingCredentials);
        }
        Ok(())
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet, SpotifyError> {
        self.ensure_credentials()?;

        let res = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(form)
            .send()
            .await?;

        Ok(check(res, "token").await?.json().await?)
    }

    /// App token for public lookups, refreshed a minute before it lapses
    async fn app_token(&self) -> Result<String, SpotifyError> {
        {
            let guard = self.app_token.read().await;
            if let Some(ref t) = *guard {
                if t.expires_at > Instant::now() {
                    return Ok(t.access_token.clone());
                }
            }
        }

        let token = self
            .token_request(&[("grant_type", "client_credentials")])
            .await?;
        let cached = CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now()
                + Duration::from_secs(token.expires_in.saturating_sub(60).max(0) as u64),
        };

        let mut guard = self.app_token.write().await;
        *guard = Some(cached.clone());
        Ok(cached.access_token)
    }

    fn get(&self, token: &str, url: &str) -> RequestBuilder {
        self.client.get(url).bearer_auth(token)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        url: &str,
        what: &str,
    ) -> Result<T, SpotifyError> {
        let res = self.get(token, url).send().await?;
        Ok(check(res, what).await?.json().await?)
    }
}

/// Map non-success statuses onto `SpotifyError`
async fn check(res: Response, what: &str) -> Result<Response, SpotifyError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(SpotifyError::NotFound(what.to_string()));
    }

    let body = res.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            error: ErrorDetail::Api { message },
        }) => message,
        Ok(ErrorBody {
            error: ErrorDetail::OAuth(code),
        }) => code,
        Err(_) => body,
    };

    Err(SpotifyError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    fn authorize_url(&self, state: &str) -> Result<String, SpotifyError> {
        self.ensure_credentials()?;

        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_url),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", self.scopes.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| SpotifyError::Config(e.to_string()))?;

        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, SpotifyError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, SpotifyError> {
        debug!("Refreshing Spotify access token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn me(&self, token: &str) -> Result<SpotifyProfile, SpotifyError> {
        self.get_json(token, &format!("{}/me", self.api_url), "profile")
            .await
    }

    async fn user_playlists(&self, token: &str) -> Result<Vec<SimplePlaylist>, SpotifyError> {
        let mut playlists = Vec::new();
        let mut next = Some(format!(
            "{}/me/playlists?limit={}",
            self.api_url, PLAYLISTS_PAGE_SIZE
        ));

        while let Some(url) = next {
            let page: Paging<SimplePlaylist> = self.get_json(token, &url, "playlists").await?;
            playlists.extend(page.items);
            next = page.next;
        }

        Ok(playlists)
    }

    async fn playlist_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, SpotifyError> {
        let page_size = limit.unwrap_or(TRACKS_PAGE_SIZE).clamp(1, TRACKS_PAGE_SIZE);
        let mut tracks = Vec::new();
        let mut next = Some(format!(
            "{}/playlists/{}/tracks?limit={}",
            self.api_url, playlist_id, page_size
        ));

        while let Some(url) = next {
            let page: Paging<PlaylistTrackItem> = self
                .get_json(token, &url, &format!("playlist {}", playlist_id))
                .await?;
            tracks.extend(page.items.into_iter().filter_map(|item| item.track));

            if let Some(limit) = limit {
                if tracks.len() >= limit as usize {
                    tracks.truncate(limit as usize);
                    break;
                }
            }
            next = page.next;
        }

        Ok(tracks)
    }

    async fn add_tracks(
        &self,
        token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyError> {
        let res = self
            .client
            .post(format!("{}/playlists/{}/tracks", self.api_url, playlist_id))
            .bearer_auth(token)
            .json(&serde_json::json!({ "uris": uris }))
            .send()
            .await?;

        check(res, &format!("playlist {}", playlist_id)).await?;
        Ok(())
    }

    async fn playlist_cover(&self, playlist_id: &str) -> Result<Option<String>, SpotifyError> {
        let token = self.app_token().await?;
        let images: Option<Vec<SpotifyImage>> = self
            .get_json(
                &token,
                &format!("{}/playlists/{}/images", self.api_url, playlist_id),
                &format!("playlist {}", playlist_id),
            )
            .await?;

        Ok(images.and_then(|images| images.into_iter().next().map(|i| i.url)))
    }
}
