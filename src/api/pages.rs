//! Page routes
//!
//! Each page answers with the JSON view model the browser bundle renders.

use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::session::{current_user, require_page_user, Session};
use crate::core::credentials::{fresh_access_token, SessionError};
use crate::core::player::resolve_tracks;
use crate::db::UserTable;
use crate::models::User;
use crate::state::AppState;
use crate::utils::dates::{now_ts, opt_rfc3339};

const LOGIN_URL: &str = "/auth/spotify";

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub logged_out: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    pub uri: Option<String>,
}

/// Landing page; logged-in users go straight to the player
async fn landing(req: HttpRequest, state: web::Data<AppState>, logged_out: Option<&str>) -> HttpResponse {
    let (user, mut session) = match current_user(&req, &state).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    if user.is_some() {
        return session.redirect("/player", &state.config);
    }

    if session.is_logged_in() {
        // cookie points at a user that no longer exists
        session.log_out();
    }

    let flash = session.take_flash();
    session.json(
        json!({
            "hide_header": logged_out == Some("true"),
            "flash": flash,
            "login_url": LOGIN_URL,
        }),
        &state.config,
    )
}

#[get("/")]
pub async fn root(
    req: HttpRequest,
    query: web::Query<HomeQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    landing(req, state, query.logged_out.as_deref()).await
}

#[get("/static_pages/home")]
pub async fn static_home(
    req: HttpRequest,
    query: web::Query<HomeQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    landing(req, state, query.logged_out.as_deref()).await
}

#[get("/login")]
pub async fn login(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    landing(req, state, None).await
}

#[get("/player")]
pub async fn player(
    req: HttpRequest,
    query: web::Query<PlayerQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (mut user, mut session) = match require_page_user(&req, &state, "/").await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    if let Some(uri) = query.uri.as_deref().filter(|u| !u.trim().is_empty()) {
        session.selected_playlist_uri = Some(uri.to_string());
    }

    match player_view(&state, &mut user, &mut session).await {
        Ok(mut body) => {
            body["flash"] = json!(session.take_flash());
            session.json(body, &state.config)
        }
        Err(e) if e.is_session_expired() => {
            warn!("Spotify session expired for user {}: {}", user.id, e);
            session.log_out();
            session.set_flash("danger", "Spotify session expired. Please login again.");
            session.redirect("/", &state.config)
        }
        Err(e) => {
            error!("Spotify error on player page: {}", e);
            session.log_out();
            session.set_flash(
                "warning",
                "There was a problem connecting to Spotify. Please log in again.",
            );
            session.redirect("/", &state.config)
        }
    }
}

async fn player_view(
    state: &AppState,
    user: &mut User,
    session: &mut Session,
) -> Result<Value, SessionError> {
    let now = now_ts();
    let token = fresh_access_token(&state.db, state.spotify.as_ref(), user, now).await?;
    session.log_in(user);

    let playlists = state.spotify.user_playlists(&token).await?;
    let selection = resolve_tracks(
        state.spotify.as_ref(),
        &token,
        &playlists,
        session.selected_playlist_id.as_deref(),
        session.selected_playlist_uri.as_deref(),
    )
    .await?;

    Ok(json!({
        "access_token": token,
        "playlists": playlists.iter().map(|p| p.to_value()).collect::<Vec<_>>(),
        "selected_playlist_id": session.selected_playlist_id,
        "selected_playlist_uri": session.selected_playlist_uri,
        "first_track_uri": selection.first_track_uri,
        "all_track_uris": selection.all_track_uris,
        "user_location": user.location_value(state.config.location_stale_hours, now),
    }))
}

#[get("/map")]
pub async fn map(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let (mut user, mut session) = match require_page_user(&req, &state, "/login").await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let mut user_location = json!({
        "latitude": user.latitude,
        "longitude": user.longitude,
        "location_name": user.location_name,
    });
    if let Some((lat, lng)) = user.location_coordinates() {
        match state.geocoder.reverse(lat, lng).await {
            Ok(address) => user_location["address"] = json!(address),
            Err(e) => warn!("Reverse geocoding failed for user {}: {}", user.id, e),
        }
    }

    let playlists = if user.has_access_token() {
        match map_playlists(&state, &mut user).await {
            Ok(playlists) => {
                session.log_in(&user);
                playlists
            }
            Err(e) => {
                error!("Spotify error on map page: {}", e);
                session.set_flash(
                    "warning",
                    "There was a problem connecting to Spotify. Please log in again.",
                );
                Vec::new()
            }
        }
    } else {
        session.set_flash("warning", "Spotify connection required.");
        Vec::new()
    };

    let flash = session.take_flash();
    session.json(
        json!({
            "user_location": user_location,
            "playlists": playlists,
            "flash": flash,
        }),
        &state.config,
    )
}

async fn map_playlists(state: &AppState, user: &mut User) -> Result<Vec<Value>, SessionError> {
    let token = fresh_access_token(&state.db, state.spotify.as_ref(), user, now_ts()).await?;
    let playlists = state.spotify.user_playlists(&token).await?;
    Ok(playlists
        .iter()
        .map(|p| json!({ "name": p.name, "uri": p.uri }))
        .collect())
}

/// Home dashboard: the user's location and who is around
#[get("/home")]
pub async fn home(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let (user, mut session) = match require_page_user(&req, &state, "/").await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let now = now_ts();
    let nearby_users = match user.location_coordinates() {
        Some((lat, lng)) => match UserTable::near_location(
            &state.db,
            lat,
            lng,
            state.config.nearby_radius_km,
            Some(user.id),
            state.config.nearby_limit,
        )
        .await
        {
            Ok(users) => json!(users),
            Err(e) => {
                error!("Nearby users query failed: {}", e);
                return HttpResponse::InternalServerError().json(json!({
                    "error": "Database error"
                }));
            }
        },
        None => Value::Null,
    };

    let flash = session.take_flash();
    session.json(
        json!({
            "user_location": user.location_value(state.config.location_stale_hours, now),
            "nearby_users": nearby_users,
            "flash": flash,
        }),
        &state.config,
    )
}

#[get("/show")]
pub async fn show(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    match require_page_user(&req, &state, "/").await {
        Ok((user, _)) => HttpResponse::Ok().json(json!({
            "user": user.to_public(),
            "member_since": opt_rfc3339(Some(user.created_at)),
        })),
        Err(resp) => resp,
    }
}

#[get("/up")]
pub async fn up(state: web::Data<AppState>) -> impl Responder {
    match UserTable::count(&state.db).await {
        Ok(users) => HttpResponse::Ok().json(json!({ "status": "ok", "users": users })),
        Err(e) => {
            error!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({ "status": "error" }))
        }
    }
}

#[get("/.well-known/appspecific/com.chrome.devtools.json")]
pub async fn devtools_probe() -> impl Responder {
    HttpResponse::NoContent().finish()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(root)
        .service(static_home)
        .service(login)
        .service(player)
        .service(map)
        .service(home)
        .service(show)
        .service(up)
        .service(devtools_probe);
}
