//! Fakes and fixtures for handler tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::test::TestRequest;
use actix_web::web;
use async_trait::async_trait;
use parking_lot::Mutex;

use super::session::Session;
use crate::config::{UserConfig, SESSION_COOKIE};
use crate::core::{GeocodeError, Geocoder};
use crate::db::{test_engine, UserTable};
use crate::models::User;
use crate::spotify::models::{ArtistRef, TracksRef};
use crate::spotify::{
    SimplePlaylist, SpotifyApi, SpotifyError, SpotifyProfile, TokenSet, Track,
};
use crate::state::AppState;

pub const TEST_SECRET: &str = "test-secret";

pub fn playlist(id: &str, name: &str) -> SimplePlaylist {
    SimplePlaylist {
        id: id.to_string(),
        name: name.to_string(),
        uri: format!("spotify:playlist:{}", id),
        images: None,
        tracks: Some(TracksRef { total: 0 }),
        owner: None,
    }
}

pub fn track(uri: &str) -> Track {
    Track {
        name: format!("Track {}", uri),
        uri: uri.to_string(),
        artists: vec![ArtistRef {
            name: "Artist".into(),
        }],
    }
}

/// In-memory stand-in for the Spotify Web API
#[derive(Default)]
pub struct FakeSpotify {
    pub profile: Option<SpotifyProfile>,
    pub playlists: Vec<SimplePlaylist>,
    pub tracks: HashMap<String, Vec<Track>>,
    pub covers: HashMap<String, String>,
    pub playlists_status: Option<u16>,
    pub reject_refresh: bool,
    pub fail_add: bool,
    pub added: Mutex<Vec<(String, Vec<String>)>>,
    pub cover_calls: AtomicUsize,
}

impl FakeSpotify {
    pub fn with_playlists(mut self, playlists: Vec<SimplePlaylist>) -> Self {
        self.playlists = playlists;
        self
    }

    pub fn with_tracks(mut self, playlist_id: &str, uris: &[&str]) -> Self {
        self.tracks
            .insert(playlist_id.to_string(), uris.iter().map(|u| track(u)).collect());
        self
    }

    pub fn with_cover(mut self, playlist_id: &str, url: &str) -> Self {
        self.covers.insert(playlist_id.to_string(), url.to_string());
        self
    }

    pub fn cover_lookups(&self) -> usize {
        self.cover_calls.load(Ordering::SeqCst)
    }

    pub fn added_tracks(&self) -> Vec<(String, Vec<String>)> {
        self.added.lock().clone()
    }
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    fn authorize_url(&self, state: &str) -> Result<String, SpotifyError> {
        Ok(format!(
            "https://accounts.spotify.com/authorize?client_id=test&state={}",
            state
        ))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenSet, SpotifyError> {
        if code == "bad-code" {
            return Err(SpotifyError::Api {
                status: 400,
                message: "invalid_grant".into(),
            });
        }
        Ok(TokenSet {
            access_token: format!("access-{}", code),
            refresh_token: Some("refresh-token".into()),
            expires_in: 3600,
            scope: None,
        })
    }

    async fn refresh_token(&self, _refresh_token: &str) -> Result<TokenSet, SpotifyError> {
        if self.reject_refresh {
            return Err(SpotifyError::Api {
                status: 400,
                message: "invalid_grant".into(),
            });
        }
        Ok(TokenSet {
            access_token: "refreshed-access".into(),
            refresh_token: None,
            expires_in: 3600,
            scope: None,
        })
    }

    async fn me(&self, _token: &str) -> Result<SpotifyProfile, SpotifyError> {
        Ok(self.profile.clone().unwrap_or_else(|| SpotifyProfile {
            id: "alice".into(),
            display_name: Some("Alice".into()),
            email: Some("alice@example.com".into()),
            images: None,
        }))
    }

    async fn user_playlists(&self, _token: &str) -> Result<Vec<SimplePlaylist>, SpotifyError> {
        match self.playlists_status {
            Some(status) => Err(SpotifyError::Api {
                status,
                message: "rejected".into(),
            }),
            None => Ok(self.playlists.clone()),
        }
    }

    async fn playlist_tracks(
        &self,
        _token: &str,
        playlist_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Track>, SpotifyError> {
        let mut tracks = self
            .tracks
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| SpotifyError::NotFound(format!("playlist {}", playlist_id)))?;
        if let Some(limit) = limit {
            tracks.truncate(limit as usize);
        }
        Ok(tracks)
    }

    async fn add_tracks(
        &self,
        _token: &str,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<(), SpotifyError> {
        if self.fail_add {
            return Err(SpotifyError::Api {
                status: 403,
                message: "forbidden".into(),
            });
        }
        self.added
            .lock()
            .push((playlist_id.to_string(), uris.to_vec()));
        Ok(())
    }

    async fn playlist_cover(&self, playlist_id: &str) -> Result<Option<String>, SpotifyError> {
        self.cover_calls.fetch_add(1, Ordering::SeqCst);
        self.covers
            .get(playlist_id)
            .map(|url| Some(url.clone()))
            .ok_or_else(|| SpotifyError::NotFound(format!("playlist {}", playlist_id)))
    }
}

#[derive(Default)]
pub struct FakeGeocoder {
    pub address: Option<String>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse(&self, _latitude: f64, _longitude: f64) -> Result<String, GeocodeError> {
        self.address.clone().ok_or(GeocodeError::NoResult)
    }
}

pub fn test_config() -> UserConfig {
    UserConfig {
        server_id: TEST_SECRET.into(),
        ..UserConfig::default()
    }
}

async fn build_state(spotify: Arc<FakeSpotify>, geocoder: FakeGeocoder) -> web::Data<AppState> {
    let uploads_dir = std::env::temp_dir().join(format!("smipe-test-{}", uuid::Uuid::new_v4()));
    web::Data::new(AppState::new(
        test_engine().await,
        test_config(),
        spotify,
        Arc::new(geocoder),
        uploads_dir,
    ))
}

pub async fn test_state_with(spotify: FakeSpotify, geocoder: FakeGeocoder) -> web::Data<AppState> {
    build_state(Arc::new(spotify), geocoder).await
}

/// State sharing the fake with the test, to inspect calls afterwards
pub async fn test_state_shared(spotify: Arc<FakeSpotify>) -> web::Data<AppState> {
    build_state(spotify, FakeGeocoder::default()).await
}

pub async fn test_state(spotify: FakeSpotify) -> web::Data<AppState> {
    test_state_with(spotify, FakeGeocoder::default()).await
}

/// Insert a user with a valid token and return it with a logged-in session cookie
pub async fn login(state: &AppState, uid: &str) -> (User, Cookie<'static>) {
    let mut user = User::new(uid);
    user.nickname = Some(uid.to_string());
    user.access_token = Some(format!("{}-token", uid));
    user.refresh_token = Some(format!("{}-refresh", uid));
    user.token_expires_at = Some(crate::utils::dates::now_ts() + 3600);
    user.id = UserTable::insert(&state.db, &user).await.unwrap();

    let mut session = Session::default();
    session.log_in(&user);
    (user, session.to_cookie(&state.config).unwrap())
}

/// Cookie for an arbitrary session
pub fn session_cookie(session: &Session) -> Cookie<'static> {
    session.to_cookie(&test_config()).unwrap()
}

/// Session written by a response, or an empty one
pub fn response_session<B>(resp: &ServiceResponse<B>) -> Session {
    match resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
    {
        Some(cookie) => {
            let req = TestRequest::default()
                .cookie(cookie.into_owned())
                .to_http_request();
            Session::load(&req, &test_config())
        }
        None => Session::default(),
    }
}

pub fn location_header<B>(resp: &ServiceResponse<B>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
