//! Player state, adding tracks, and playlists pinned to map locations

use actix_multipart::Multipart;
use actix_web::http::header;
use actix_web::{get, patch, post, web, HttpRequest, HttpResponse, Responder};
use futures::future::join_all;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::session::require_user;
use crate::core::credentials::{fresh_access_token, SessionError};
use crate::core::uploads::{image_url, remove_upload, save_upload};
use crate::db::PlaylistLocationTable;
use crate::models::{LocationOwner, NewPlaylistLocation, Numeric, PlaylistLocation};
use crate::spotify::uri::last_segment;
use crate::state::AppState;
use crate::utils::dates::{now_ts, to_rfc3339};

/// Cap on request bodies read by hand (JSON or multipart with one image)
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn login_required() -> Value {
    json!({ "error": "Login required" })
}

/// String parameter from a JSON body; numbers are accepted as their text
fn str_param(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[patch("/player/update_selected_playlist")]
pub async fn update_selected_playlist(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (_, mut session) = match require_user(&req, &state, login_required()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let nested = body.get("playlist");
    let playlist_id = str_param(body.get("playlist_id"))
        .or_else(|| str_param(nested.and_then(|p| p.get("id"))));
    let playlist_uri = str_param(body.get("playlist_uri"))
        .or_else(|| str_param(nested.and_then(|p| p.get("uri"))));

    let selected = match (playlist_id, playlist_uri) {
        (Some(id), _) => id,
        (None, Some(uri)) => last_segment(&uri).to_string(),
        (None, None) => {
            warn!("update_selected_playlist called without playlist_id or playlist_uri");
            return HttpResponse::BadRequest().json(json!({
                "status": "error",
                "message": "A playlist ID or URI is required",
            }));
        }
    };

    info!("Selected playlist {}", selected);
    session.selected_playlist_id = Some(selected.clone());
    session.selected_playlist_uri = None;
    session.json(
        json!({ "status": "success", "playlist_id": selected }),
        &state.config,
    )
}

#[derive(Debug, Deserialize)]
pub struct AddTrackRequest {
    pub playlist_id: Option<String>,
    pub track_uri: Option<String>,
}

/// Add a track unless the playlist already has it
#[post("/player/add_track_to_playlist")]
pub async fn add_track_to_playlist(
    req: HttpRequest,
    body: web::Json<AddTrackRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (mut user, _) = match require_user(&req, &state, login_required()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let playlist_id = body.playlist_id.as_deref().map(str::trim).unwrap_or_default();
    let track_uri = body.track_uri.as_deref().map(str::trim).unwrap_or_default();
    if playlist_id.is_empty() || track_uri.is_empty() {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "message": "Missing parameters.",
        }));
    }

    let result = async {
        let token = fresh_access_token(&state.db, state.spotify.as_ref(), &mut user, now_ts()).await?;
        let existing = state.spotify.playlist_tracks(&token, playlist_id, None).await?;

        if existing.iter().any(|t| t.uri == track_uri) {
            return Ok::<_, SessionError>("duplicate");
        }

        state
            .spotify
            .add_tracks(&token, playlist_id, &[track_uri.to_string()])
            .await?;
        Ok("added")
    }
    .await;

    match result {
        Ok(status) => HttpResponse::Ok().json(json!({ "status": status })),
        Err(e) => {
            error!("Failed to add {} to {}: {}", track_uri, playlist_id, e);
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "An error occurred while adding the track.",
            }))
        }
    }
}

/// Fields of a save_playlist request, from JSON or multipart
#[derive(Debug, Default)]
struct SavePlaylistForm {
    location: NewPlaylistLocation,
    image: Option<Vec<u8>>,
}

impl SavePlaylistForm {
    fn from_json(body: &Value) -> Self {
        Self {
            location: NewPlaylistLocation {
                name: str_param(body.get("name")),
                uri: str_param(body.get("uri")),
                latitude: Numeric::parse(body.get("latitude")),
                longitude: Numeric::parse(body.get("longitude")),
                location_name: str_param(body.get("location_name")),
                comment: str_param(body.get("comment")),
                first_track_uri: str_param(body.get("first_track_uri")),
            },
            image: None,
        }
    }

    fn set_text(&mut self, name: &str, text: String) {
        let text = Some(text).filter(|t| !t.trim().is_empty());
        let location = &mut self.location;
        match name {
            "name" => location.name = text,
            "uri" => location.uri = text,
            "latitude" => location.latitude = Numeric::parse_str(text.as_deref().unwrap_or_default()),
            "longitude" => {
                location.longitude = Numeric::parse_str(text.as_deref().unwrap_or_default())
            }
            "location_name" => location.location_name = text,
            "comment" => location.comment = text,
            "first_track_uri" => location.first_track_uri = text,
            _ => {}
        }
    }
}

async fn read_multipart(mut payload: Multipart) -> Result<SavePlaylistForm, String> {
    let mut form = SavePlaylistForm::default();
    let mut total = 0usize;

    while let Some(field) = payload.next().await {
        let mut field = field.map_err(|e| e.to_string())?;
        let name = field
            .content_disposition()
            .get_name()
            .map(|s| s.to_string())
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(|e| e.to_string())?;
            total += data.len();
            if total > MAX_BODY_BYTES {
                return Err("Request body is too large".to_string());
            }
            bytes.extend_from_slice(&data);
        }

        if name == "image" {
            if !bytes.is_empty() {
                form.image = Some(bytes);
            }
        } else {
            form.set_text(&name, String::from_utf8_lossy(&bytes).to_string());
        }
    }

    Ok(form)
}

async fn read_json(mut payload: web::Payload) -> Result<SavePlaylistForm, String> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.next().await {
        let data = chunk.map_err(|e| e.to_string())?;
        if body.len() + data.len() > MAX_BODY_BYTES {
            return Err("Request body is too large".to_string());
        }
        body.extend_from_slice(&data);
    }

    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(SavePlaylistForm::default());
    }

    let value: Value = serde_json::from_slice(&body).map_err(|e| e.to_string())?;
    Ok(SavePlaylistForm::from_json(&value))
}

fn save_error(message: impl Into<String>) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(json!({
        "status": "error",
        "message": message.into(),
    }))
}

/// Pin a playlist to a location, optionally with a photo
#[post("/save_playlist")]
pub async fn save_playlist(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> impl Responder {
    let unauthorized = json!({ "status": "error", "message": "Login required." });
    let (user, _) = match require_user(&req, &state, unauthorized).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let is_multipart = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("multipart/form-data"))
        .unwrap_or(false);

    let parsed = if is_multipart {
        read_multipart(Multipart::new(req.headers(), payload)).await
    } else {
        read_json(payload).await
    };
    let form = match parsed {
        Ok(form) => form,
        Err(e) => {
            warn!("Unreadable save_playlist body: {}", e);
            return save_error(e);
        }
    };

    let input = &form.location;
    if input.name.is_none() || input.uri.is_none() {
        return save_error("Playlist information is missing.");
    }
    if input.latitude.is_blank() || input.longitude.is_blank() {
        return save_error("Location is not set.");
    }

    let mut location = match form.location.build(user.id) {
        Ok(location) => location,
        Err(errors) => return save_error(errors.to_string()),
    };

    if let Some(bytes) = form.image {
        let dir = state.uploads_dir.clone();
        match web::block(move || save_upload(&dir, &bytes)).await {
            Ok(Ok(filename)) => location.image = Some(filename),
            Ok(Err(e)) => {
                warn!("Rejected playlist image: {}", e);
                return save_error("Image could not be processed.");
            }
            Err(e) => {
                error!("Image worker failed: {}", e);
                return save_error("Image could not be processed.");
            }
        }
    }

    match PlaylistLocationTable::insert(&state.db, &location).await {
        Ok(id) => {
            info!("User {} pinned playlist location {}", user.id, id);
            HttpResponse::Ok().json(json!({
                "status": "success",
                "message": format!("Saved playlist \"{}\"", location.name),
                "id": id,
            }))
        }
        Err(e) => {
            error!("PlaylistLocation creation error: {}", e);
            if let Some(filename) = location.image.take() {
                let dir = state.uploads_dir.clone();
                match web::block(move || remove_upload(&dir, &filename)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!("Failed to remove orphaned upload: {}", e),
                    Err(e) => error!("Image worker failed: {}", e),
                }
            }
            save_error(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationsQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius_km: Option<String>,
}

fn location_value(
    location: &PlaylistLocation,
    owner: &LocationOwner,
    playlist_image: Option<String>,
) -> Value {
    json!({
        "id": location.id,
        "name": location.name,
        "uri": location.uri,
        "latitude": location.latitude,
        "longitude": location.longitude,
        "location_name": location.location_name,
        "created_at": to_rfc3339(location.created_at),
        "user_nickname": owner.display_name(),
        "user_image": owner.image,
        "playlist_image": playlist_image,
        "comment": location.comment,
        "image_url": location.image.as_deref().map(image_url),
        "first_track_uri": location.first_track_uri,
    })
}

/// Every pinned playlist, newest first, optionally only those near a point
#[get("/playlist_locations")]
pub async fn playlist_locations(
    req: HttpRequest,
    query: web::Query<LocationsQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Err(resp) = require_user(&req, &state, login_required()).await {
        return resp;
    }

    let latitude = Numeric::parse_str(query.latitude.as_deref().unwrap_or_default());
    let longitude = Numeric::parse_str(query.longitude.as_deref().unwrap_or_default());
    let radius = Numeric::parse_str(query.radius_km.as_deref().unwrap_or_default());

    let rows = match (latitude, longitude) {
        (Numeric::Blank, Numeric::Blank) => PlaylistLocationTable::all_with_owner(&state.db).await,
        (Numeric::Number(lat), Numeric::Number(lng))
            if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
        {
            let radius_km = match radius {
                Numeric::Blank => state.config.nearby_radius_km,
                Numeric::Number(r) if r > 0.0 => r,
                _ => {
                    return HttpResponse::UnprocessableEntity()
                        .json(json!({ "error": "radius_km must be a positive number" }));
                }
            };
            PlaylistLocationTable::near_location(&state.db, lat, lng, radius_km).await
        }
        _ => {
            return HttpResponse::UnprocessableEntity()
                .json(json!({ "error": "latitude and longitude must be valid coordinates" }));
        }
    };

    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to load playlist locations: {}", e);
            return HttpResponse::InternalServerError().json(json!({ "error": "Database error" }));
        }
    };

    let (cache, spotify) = (&state.covers, state.spotify.as_ref());
    let covers = join_all(rows.iter().map(|(location, _)| async move {
        match location.playlist_id() {
            Some(id) => cache.cover_for(spotify, id).await,
            None => None,
        }
    }))
    .await;

    let body: Vec<Value> = rows
        .iter()
        .zip(covers)
        .map(|((location, owner), cover)| location_value(location, owner, cover))
        .collect();

    HttpResponse::Ok().json(body)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(update_selected_playlist)
        .service(add_track_to_playlist)
        .service(save_playlist)
        .service(playlist_locations);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{
        login, response_session, session_cookie, test_state, test_state_shared, FakeSpotify,
    };
    use crate::api::session::Session;
    use crate::db::UserTable;
    use crate::models::User;
    use actix_web::{test, App};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_update_selected_playlist_variants() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let cases = [
            (json!({"playlist_id": "id1", "playlist_uri": "spotify:playlist:uri1"}), "id1"),
            (json!({"playlist_uri": "spotify:user:bob:playlist:uri2"}), "uri2"),
            (json!({"playlist": {"id": "nested"}}), "nested"),
            (json!({"playlist": {"uri": "spotify:playlist:nested_uri"}}), "nested_uri"),
        ];

        for (payload, expected) in cases {
            let req = test::TestRequest::patch()
                .uri("/player/update_selected_playlist")
                .cookie(cookie.clone())
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 200);
            assert_eq!(
                response_session(&resp).selected_playlist_id.as_deref(),
                Some(expected)
            );
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["playlist_id"], expected);
        }

        let req = test::TestRequest::patch()
            .uri("/player/update_selected_playlist")
            .cookie(cookie)
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_update_selected_playlist_clears_uri() {
        let state = test_state(FakeSpotify::default()).await;
        let mut user = User::new("alice");
        user.id = UserTable::insert(&state.db, &user).await.unwrap();
        let mut session = Session::default();
        session.log_in(&user);
        session.selected_playlist_uri = Some("spotify:playlist:from_map".into());
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::patch()
            .uri("/player/update_selected_playlist")
            .cookie(session_cookie(&session))
            .set_json(json!({"playlist_id": "mine"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(response_session(&resp).selected_playlist_uri, None);
    }

    #[actix_web::test]
    async fn test_add_track_duplicate_and_added() {
        let spotify = Arc::new(FakeSpotify::default().with_tracks("p1", &["spotify:track:1"]));
        let state = test_state_shared(spotify.clone()).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let add = |track: &str| {
            test::TestRequest::post()
                .uri("/player/add_track_to_playlist")
                .cookie(cookie.clone())
                .set_json(json!({"playlist_id": "p1", "track_uri": track}))
                .to_request()
        };

        let body: Value = test::call_and_read_body_json(&app, add("spotify:track:1")).await;
        assert_eq!(body["status"], "duplicate");
        assert!(spotify.added_tracks().is_empty());

        let body: Value = test::call_and_read_body_json(&app, add("spotify:track:2")).await;
        assert_eq!(body["status"], "added");
        assert_eq!(
            spotify.added_tracks(),
            vec![("p1".to_string(), vec!["spotify:track:2".to_string()])]
        );
    }

    #[actix_web::test]
    async fn test_add_track_errors() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/player/add_track_to_playlist")
            .cookie(cookie.clone())
            .set_json(json!({"playlist_id": "p1"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 400);

        let req = test::TestRequest::post()
            .uri("/player/add_track_to_playlist")
            .cookie(cookie)
            .set_json(json!({"playlist_id": "missing", "track_uri": "spotify:track:1"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 500);
    }

    #[actix_web::test]
    async fn test_save_playlist_validation() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let cases = [
            (json!({"uri": "spotify:playlist:x", "latitude": 1, "longitude": 1}), "Playlist information is missing."),
            (json!({"name": "X", "uri": "spotify:playlist:x", "latitude": ""}), "Location is not set."),
            (json!({"name": "X", "uri": "spotify:playlist:x", "latitude": 95, "longitude": 1}), "Latitude must be less than or equal to 90"),
        ];

        for (payload, message) in cases {
            let req = test::TestRequest::post()
                .uri("/save_playlist")
                .cookie(cookie.clone())
                .set_json(payload)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 422);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], message);
        }

        let req = test::TestRequest::post()
            .uri("/save_playlist")
            .set_json(json!({"name": "X"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "error");
    }

    #[actix_web::test]
    async fn test_save_playlist_and_list_locations() {
        let spotify = FakeSpotify::default().with_cover("abc", "https://i.scdn.co/image/abc");
        let state = test_state(spotify).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/save_playlist")
            .cookie(cookie.clone())
            .set_json(json!({
                "name": "Rainy Shibuya",
                "uri": "spotify:playlist:abc",
                "latitude": "35.658",
                "longitude": 139.7016,
                "comment": "Best at night",
                "first_track_uri": "spotify:track:1"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Saved playlist \"Rainy Shibuya\"");

        let req = test::TestRequest::get()
            .uri("/playlist_locations")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let pins = body.as_array().unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0]["user_nickname"], "alice");
        assert_eq!(pins[0]["playlist_image"], "https://i.scdn.co/image/abc");
        assert_eq!(pins[0]["comment"], "Best at night");
        assert_eq!(pins[0]["image_url"], Value::Null);
        assert_eq!(pins[0]["first_track_uri"], "spotify:track:1");

        let req = test::TestRequest::get()
            .uri("/playlist_locations?latitude=34.70&longitude=135.49")
            .cookie(cookie.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));

        let req = test::TestRequest::get()
            .uri("/playlist_locations?latitude=35.66&longitude=139.70&radius_km=5")
            .cookie(cookie)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    const BOUNDARY: &str = "smipe-boundary";

    /// Multipart save_playlist request with the usual fields and an 8x8 PNG
    fn multipart_save_request(cookie: actix_web::cookie::Cookie<'static>) -> test::TestRequest {
        use image::{DynamicImage, ImageOutputFormat, RgbImage};
        use std::io::Cursor;

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::new(8, 8))
            .write_to(&mut png, ImageOutputFormat::Png)
            .unwrap();

        let mut body = Vec::new();
        for (name, value) in [
            ("name", "Photo walk"),
            ("uri", "spotify:playlist:photo"),
            ("latitude", "35.0"),
            ("longitude", "139.0"),
        ] {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    BOUNDARY, name, value
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"p.png\"\r\nContent-Type: image/png\r\n\r\n",
                BOUNDARY
            )
            .as_bytes(),
        );
        body.extend_from_slice(png.get_ref());
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        test::TestRequest::post()
            .uri("/save_playlist")
            .cookie(cookie)
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            ))
            .set_payload(body)
    }

    fn upload_count(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[actix_web::test]
    async fn test_save_playlist_multipart_with_image() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let uploads_dir = state.uploads_dir.clone();
        let db = state.db.clone();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = multipart_save_request(cookie).to_request();
        let resp: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["status"], "success");

        let (location, _) = PlaylistLocationTable::all_with_owner(&db)
            .await
            .unwrap()
            .remove(0);
        let filename = location.image.unwrap();
        assert!(uploads_dir.join(&filename).exists());
        assert!(uploads_dir.join(format!("thumb_{}", filename)).exists());
    }

    #[actix_web::test]
    async fn test_failed_insert_removes_uploaded_image() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let uploads_dir = state.uploads_dir.clone();
        sqlx::query("DROP TABLE playlist_location")
            .execute(state.db.pool())
            .await
            .unwrap();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let resp = test::call_service(&app, multipart_save_request(cookie).to_request()).await;
        assert_eq!(resp.status(), 422);
        assert_eq!(upload_count(&uploads_dir), 0);
    }

    #[actix_web::test]
    async fn test_playlist_locations_rejects_bad_filters() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        for query in [
            "latitude=91&longitude=0",
            "latitude=35&longitude=-181",
            "latitude=abc&longitude=139",
            "latitude=35",
            "latitude=35&longitude=139&radius_km=0",
            "latitude=35&longitude=139&radius_km=-5",
            "latitude=35&longitude=139&radius_km=far",
        ] {
            let req = test::TestRequest::get()
                .uri(&format!("/playlist_locations?{}", query))
                .cookie(cookie.clone())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 422, "{}", query);
            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string(), "{}", query);
        }
    }
}
