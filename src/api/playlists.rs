//! The user's Spotify playlists

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde_json::{json, Value};
use tracing::{error, warn};

use super::session::require_user;
use crate::core::credentials::{fresh_access_token, SessionError};
use crate::db::PlaylistTable;
use crate::models::Playlist;
use crate::state::AppState;
use crate::utils::dates::now_ts;

/// Tracks returned by the playlist detail endpoint
const TRACKS_LIMIT: u32 = 50;

const SPOTIFY_PROBLEM: &str = "There was a problem connecting to Spotify.";

fn unauthorized() -> Value {
    json!({ "error": "Login required" })
}

/// JSON error for a failed Spotify call
fn spotify_failure(e: &SessionError) -> HttpResponse {
    if e.is_session_expired() {
        return HttpResponse::Unauthorized().json(json!({
            "status": "error",
            "message": "Spotify session expired. Please login again.",
        }));
    }
    HttpResponse::BadGateway().json(json!({
        "status": "error",
        "message": SPOTIFY_PROBLEM,
    }))
}

async fn list_playlists(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let (mut user, mut session) = match require_user(&req, &state, unauthorized()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let result = async {
        let token = fresh_access_token(&state.db, state.spotify.as_ref(), &mut user, now_ts()).await?;
        Ok::<_, SessionError>(state.spotify.user_playlists(&token).await?)
    }
    .await;

    match result {
        Ok(playlists) => {
            session.log_in(&user);
            session.json(
                json!({
                    "status": "success",
                    "playlists": playlists.iter().map(|p| p.to_value()).collect::<Vec<_>>(),
                }),
                &state.config,
            )
        }
        Err(e) => {
            warn!("Failed to list playlists for user {}: {}", user.id, e);
            spotify_failure(&e)
        }
    }
}

#[get("/playlists")]
pub async fn index(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    list_playlists(req, state).await
}

#[get("/my_playlists")]
pub async fn my_playlists(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    list_playlists(req, state).await
}

#[get("/playlists/{id}/tracks")]
pub async fn tracks(
    req: HttpRequest,
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (mut user, _) = match require_user(&req, &state, unauthorized()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };
    let playlist_id = path.into_inner();

    let result = async {
        let token = fresh_access_token(&state.db, state.spotify.as_ref(), &mut user, now_ts()).await?;
        Ok::<_, SessionError>(
            state
                .spotify
                .playlist_tracks(&token, &playlist_id, Some(TRACKS_LIMIT))
                .await?,
        )
    }
    .await;

    match result {
        Ok(tracks) => HttpResponse::Ok().json(
            tracks
                .iter()
                .map(|t| json!({ "name": t.name, "uri": t.uri, "artists": t.artist_names() }))
                .collect::<Vec<_>>(),
        ),
        Err(SessionError::Spotify(e)) if e.is_not_found() => {
            HttpResponse::NotFound().json(json!({ "error": "Playlist not found" }))
        }
        Err(e) => {
            warn!("Failed to load tracks of {}: {}", playlist_id, e);
            HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
        }
    }
}

/// Cache every Spotify playlist of the user, stamped with the user's current coordinates
#[post("/playlists/save")]
pub async fn save(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let (mut user, _) = match require_user(&req, &state, unauthorized()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let result = async {
        let token = fresh_access_token(&state.db, state.spotify.as_ref(), &mut user, now_ts()).await?;
        let playlists = state.spotify.user_playlists(&token).await?;

        let rows: Vec<Playlist> = playlists
            .iter()
            .map(|p| Playlist::new(user.id, &p.id, &p.name).at(user.latitude, user.longitude))
            .collect();
        PlaylistTable::upsert_many(&state.db, &rows).await?;
        Ok::<_, SessionError>(rows.len())
    }
    .await;

    match result {
        Ok(saved) => HttpResponse::Ok().json(json!({ "status": "success", "saved": saved })),
        Err(e) => {
            error!("Failed to save playlists for user {}: {}", user.id, e);
            HttpResponse::UnprocessableEntity().json(json!({
                "status": "error",
                "message": SPOTIFY_PROBLEM,
            }))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(my_playlists)
        .service(save)
        .service(tracks);
}
