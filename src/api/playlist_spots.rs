//! Playlist spots: bare map pins holding a Spotify playlist id

use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::session::require_user;
use crate::db::PlaylistSpotTable;
use crate::models::{Numeric, PlaylistSpot};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSpotRequest {
    #[serde(default)]
    pub playlist_spot: Value,
}

#[get("/playlist_spots")]
pub async fn list_spots(state: web::Data<AppState>) -> impl Responder {
    match PlaylistSpotTable::all(&state.db).await {
        Ok(spots) => {
            HttpResponse::Ok().json(spots.iter().map(|s| s.to_value()).collect::<Vec<_>>())
        }
        Err(e) => {
            error!("Failed to list playlist spots: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": "Database error" }))
        }
    }
}

#[post("/playlist_spots")]
pub async fn create_spot(
    req: HttpRequest,
    body: web::Json<CreateSpotRequest>,
    state: web::Data<AppState>,
) -> impl Responder {
    let unauthorized = json!({ "status": "error", "errors": ["Login required"] });
    let (user, _) = match require_user(&req, &state, unauthorized).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let params = &body.playlist_spot;
    let playlist_id = match params.get("spotify_playlist_id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let spot = match PlaylistSpot::build(
        user.id,
        Numeric::parse(params.get("latitude")),
        Numeric::parse(params.get("longitude")),
        playlist_id,
    ) {
        Ok(spot) => spot,
        Err(errors) => {
            return HttpResponse::UnprocessableEntity()
                .json(json!({ "status": "error", "errors": errors.messages() }));
        }
    };

    match PlaylistSpotTable::insert(&state.db, &spot).await {
        Ok(saved) => {
            info!("User {} created playlist spot {}", user.id, saved.id);
            HttpResponse::Created().json(json!({
                "status": "success",
                "playlist_spot": saved.to_value(),
            }))
        }
        Err(e) => {
            error!("PlaylistSpot creation error: {}", e);
            HttpResponse::UnprocessableEntity()
                .json(json!({ "status": "error", "errors": [e.to_string()] }))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_spots).service(create_spot);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{login, test_state, FakeSpotify};
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_create_and_list_spots() {
        let state = test_state(FakeSpotify::default()).await;
        let (user, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/playlist_spots")
            .cookie(cookie)
            .set_json(json!({
                "playlist_spot": {
                    "latitude": "35.68",
                    "longitude": 139.76,
                    "spotify_playlist_id": "37i9dQZF1DXcBWIGoYBM5M"
                }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["playlist_spot"]["user_id"], user.id);

        let req = test::TestRequest::get().uri("/playlist_spots").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["latitude"], 35.68);
    }

    #[actix_web::test]
    async fn test_create_spot_errors() {
        let state = test_state(FakeSpotify::default()).await;
        let (_, cookie) = login(&state, "alice").await;
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/playlist_spots")
            .cookie(cookie)
            .set_json(json!({ "playlist_spot": { "latitude": 91 } }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 422);
        let body: Value = test::read_body_json(resp).await;
        let errors = body["errors"].as_array().unwrap();
        assert!(errors.contains(&json!("Latitude must be less than or equal to 90")));
        assert!(errors.contains(&json!("Longitude can't be blank")));

        let req = test::TestRequest::post()
            .uri("/playlist_spots")
            .set_json(json!({ "playlist_spot": {} }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 401);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["errors"], json!(["Login required"]));
    }
}
