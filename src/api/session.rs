//! Cookie session
//!
//! The session is a signed JWT in `_smipe_session` holding the logged-in user, the
//! Spotify credential hash, the selected playlist and a one-shot flash message. Handlers
//! load it, change it, and write it back on the response.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::{UserConfig, SESSION_COOKIE};
use crate::core::credentials::credentials_for;
use crate::db::UserTable;
use crate::models::User;
use crate::spotify::SpotifyUserData;
use crate::state::AppState;
use crate::utils::auth::{create_jwt, verify_jwt};

const SESSION_TOKEN_TYPE: &str = "session";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub spotify_user: Option<SpotifyUserData>,
    #[serde(default)]
    pub selected_playlist_id: Option<String>,
    #[serde(default)]
    pub selected_playlist_uri: Option<String>,
    #[serde(default)]
    pub flash: Option<Flash>,
}

impl Session {
    /// Read the session cookie; missing, tampered or expired cookies give an empty session
    pub fn load(req: &HttpRequest, config: &UserConfig) -> Self {
        let Some(cookie) = req.cookie(SESSION_COOKIE) else {
            return Self::default();
        };

        match verify_jwt::<Session>(cookie.value(), &config.server_id, SESSION_TOKEN_TYPE) {
            Ok(claims) => claims.sub,
            Err(e) => {
                debug!("Discarding session cookie: {}", e);
                Self::default()
            }
        }
    }

    pub fn to_cookie(&self, config: &UserConfig) -> Result<Cookie<'static>> {
        let max_age = config.session_days.max(1) * 24 * 3600;
        let token = create_jwt(self, &config.server_id, SESSION_TOKEN_TYPE, max_age as u64)?;

        Ok(Cookie::build(SESSION_COOKIE, token)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(config.secure_cookies)
            .max_age(CookieDuration::seconds(max_age))
            .finish())
    }

    pub fn log_in(&mut self, user: &User) {
        self.user_id = Some(user.id);
        self.spotify_user = Some(credentials_for(user));
    }

    /// Forget everything except a pending flash
    pub fn log_out(&mut self) {
        let flash = self.flash.take();
        *self = Self {
            flash,
            ..Self::default()
        };
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn set_flash(&mut self, kind: &str, message: impl Into<String>) {
        self.flash = Some(Flash {
            kind: kind.to_string(),
            message: message.into(),
        });
    }

    pub fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }

    /// Store the session on a response being built
    pub fn attach(&self, builder: &mut HttpResponseBuilder, config: &UserConfig) {
        match self.to_cookie(config) {
            Ok(cookie) => {
                builder.cookie(cookie);
            }
            Err(e) => error!("Failed to write session cookie: {}", e),
        }
    }

    /// 302 to `location`, saving the session
    pub fn redirect(&self, location: &str, config: &UserConfig) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        builder.insert_header((header::LOCATION, location.to_string()));
        self.attach(&mut builder, config);
        builder.finish()
    }

    /// 200 JSON, saving the session
    pub fn json(&self, body: serde_json::Value, config: &UserConfig) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        self.attach(&mut builder, config);
        builder.json(body)
    }
}

/// True when the client asked for JSON rather than a page
pub fn wants_json(req: &HttpRequest) -> bool {
    let accepts_json = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json"))
        .unwrap_or(false);

    accepts_json || req.path().ends_with(".json")
}

/// Session plus the user it points at, if that user still exists
pub async fn current_user(
    req: &HttpRequest,
    state: &AppState,
) -> Result<(Option<User>, Session), HttpResponse> {
    let session = Session::load(req, &state.config);
    let Some(user_id) = session.user_id else {
        return Ok((None, session));
    };

    match UserTable::get_by_id(&state.db, user_id).await {
        Ok(user) => Ok((user, session)),
        Err(e) => {
            error!("Failed to load user {}: {}", user_id, e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Database error"
            })))
        }
    }
}

/// Page guard: HTML clients go to `redirect_to` with a flash, JSON clients get 401
pub async fn require_page_user(
    req: &HttpRequest,
    state: &AppState,
    redirect_to: &str,
) -> Result<(User, Session), HttpResponse> {
    let (user, mut session) = current_user(req, state).await?;
    if let Some(user) = user {
        return Ok((user, session));
    }

    if wants_json(req) {
        return Err(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Login required"
        })));
    }

    session.log_out();
    session.set_flash("danger", "Login required");
    Err(session.redirect(redirect_to, &state.config))
}

/// API guard: 401 with the given JSON body
pub async fn require_user(
    req: &HttpRequest,
    state: &AppState,
    unauthorized: serde_json::Value,
) -> Result<(User, Session), HttpResponse> {
    match current_user(req, state).await? {
        (Some(user), session) => Ok((user, session)),
        (None, _) => Err(HttpResponse::Unauthorized().json(unauthorized)),
    }
}
