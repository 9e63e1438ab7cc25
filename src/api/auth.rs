//! Spotify OAuth login, failure and logout routes

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{get, route, web, HttpRequest, HttpResponse, Responder};
use reqwest::Url;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::session::Session;
use crate::config::OAUTH_STATE_COOKIE;
use crate::core::credentials::{apply_tokens, user_from_profile};
use crate::db::UserTable;
use crate::models::User;
use crate::state::AppState;
use crate::utils::auth::{generate_random_string, secrets_match};
use crate::utils::dates::now_ts;

const STATE_MAX_AGE: i64 = 10 * 60;

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FailureParams {
    pub message: Option<String>,
    pub error: Option<String>,
}

/// request phase: send the browser to Spotify
#[get("/auth/spotify")]
pub async fn request_phase(state: web::Data<AppState>) -> impl Responder {
    let oauth_state = generate_random_string(32);

    match state.spotify.authorize_url(&oauth_state) {
        Ok(url) => HttpResponse::Found()
            .insert_header((header::LOCATION, url))
            .cookie(state_cookie(&oauth_state, STATE_MAX_AGE))
            .finish(),
        Err(e) => {
            error!("Cannot start Spotify login: {}", e);
            failure_redirect("invalid_credentials", &e.to_string())
        }
    }
}

/// callback phase: exchange the code, find or create the user, log in
#[route("/auth/{provider}/callback", method = "GET", method = "POST")]
pub async fn callback(
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<CallbackParams>,
    state: web::Data<AppState>,
) -> impl Responder {
    let provider = path.into_inner();
    if provider != "spotify" {
        return failure_redirect("invalid_provider", &format!("unknown provider {}", provider));
    }

    if let Some(err) = &query.error {
        let reason = query.error_description.as_deref().unwrap_or(err);
        return failure_redirect(err, reason);
    }

    let expected = req
        .cookie(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .unwrap_or_default();
    if !secrets_match(&expected, query.state.as_deref().unwrap_or_default()) {
        warn!("OAuth state mismatch on callback");
        return failure_redirect("csrf_detected", "CSRF detected");
    }

    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        return failure_redirect("invalid_credentials", "missing authorization code");
    };

    let tokens = match state.spotify.exchange_code(code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!("Spotify code exchange failed: {}", e);
            return failure_redirect("invalid_credentials", &e.to_string());
        }
    };

    let profile = match state.spotify.me(&tokens.access_token).await {
        Ok(profile) if !profile.id.is_empty() => profile,
        Ok(_) => return failure_redirect("missing_uid", "Spotify returned no user id"),
        Err(e) => {
            warn!("Spotify profile lookup failed: {}", e);
            return failure_redirect("invalid_credentials", &e.to_string());
        }
    };

    let mut session = Session::load(&req, &state.config);
    let now = now_ts();

    let (user, message) = match find_or_create_user(&state, &profile, &tokens, now).await {
        Ok(found) => found,
        Err(e) => {
            error!("Failed to store user {}: {}", profile.id, e);
            session.set_flash("danger", "An unexpected error occurred");
            return with_state_cleared(session.redirect("/", &state.config));
        }
    };

    info!("User {} logged in", user.uid);
    session.log_in(&user);
    session.set_flash("success", message);
    with_state_cleared(session.redirect("/", &state.config))
}

async fn find_or_create_user(
    state: &AppState,
    profile: &crate::spotify::SpotifyProfile,
    tokens: &crate::spotify::TokenSet,
    now: i64,
) -> anyhow::Result<(User, &'static str)> {
    if let Some(mut user) = UserTable::get_by_uid(&state.db, &profile.id).await? {
        apply_tokens(&mut user, tokens, now);
        UserTable::update_tokens(
            &state.db,
            user.id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            user.token_expires_at,
        )
        .await?;
        return Ok((user, "Logged in"));
    }

    let mut user = user_from_profile(profile);
    apply_tokens(&mut user, tokens, now);
    user.id = UserTable::insert(&state.db, &user).await?;
    Ok((user, "Registration successful"))
}

#[get("/auth/failure")]
pub async fn failure(
    req: HttpRequest,
    query: web::Query<FailureParams>,
    state: web::Data<AppState>,
) -> impl Responder {
    let reason = query
        .error
        .as_deref()
        .or(query.message.as_deref())
        .filter(|r| !r.is_empty());
    warn!("Authentication failed: {:?}", reason);

    let mut session = Session::load(&req, &state.config);
    match reason {
        Some(reason) => session.set_flash("danger", format!("Authentication failed: {}", reason)),
        None => session.set_flash("danger", "Authentication failed"),
    }
    session.redirect("/", &state.config)
}

#[route("/logout", method = "DELETE", method = "POST")]
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let mut session = Session::load(&req, &state.config);
    session.log_out();
    session.set_flash("success", "Logged out");
    session.redirect("/", &state.config)
}

// helpers

fn state_cookie(value: &str, max_age: i64) -> Cookie<'static> {
    Cookie::build(OAUTH_STATE_COOKIE, value.to_string())
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(max_age))
        .finish()
}

fn with_state_cleared(mut response: HttpResponse) -> HttpResponse {
    if let Err(e) = response.add_cookie(&state_cookie("", 0)) {
        warn!("Failed to clear OAuth state cookie: {}", e);
    }
    response
}

/// `/auth/failure?message=<key>&error=<reason>`
fn failure_location(message: &str, error: &str) -> String {
    match Url::parse("http://localhost/auth/failure") {
        Ok(mut url) => {
            url.query_pairs_mut()
                .append_pair("message", message)
                .append_pair("error", error);
            format!("{}?{}", url.path(), url.query().unwrap_or_default())
        }
        Err(_) => "/auth/failure".to_string(),
    }
}

fn failure_redirect(message: &str, error: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, failure_location(message, error)))
        .finish()
}

/// configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(request_phase)
        .service(failure)
        .service(callback)
        .service(logout);
}
