//! Current user's location

use actix_web::{get, route, web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::session::require_user;
use crate::db::UserTable;
use crate::models::location::{validate_latitude, validate_longitude};
use crate::models::{Numeric, ValidationErrors};
use crate::state::AppState;
use crate::utils::dates::{now_ts, opt_rfc3339};

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

fn unauthorized() -> Value {
    json!({ "error": "Unauthorized" })
}

/// Reverse geocode arbitrary coordinates for the map page
#[get("/locations/reverse_geocode")]
pub async fn reverse_geocode(
    req: HttpRequest,
    query: web::Query<ReverseGeocodeQuery>,
    state: web::Data<AppState>,
) -> impl Responder {
    if let Err(resp) = require_user(&req, &state, unauthorized()).await {
        return resp;
    }

    let latitude = Numeric::parse_str(query.latitude.as_deref().unwrap_or_default());
    let longitude = Numeric::parse_str(query.longitude.as_deref().unwrap_or_default());

    let mut errors = ValidationErrors::new();
    validate_latitude(&mut errors, latitude, false);
    validate_longitude(&mut errors, longitude, false);
    if let Err(errors) = errors.into_result() {
        return HttpResponse::UnprocessableEntity().json(json!({
            "error": errors.to_string(),
        }));
    }

    let (lat, lng) = (
        latitude.value().unwrap_or_default(),
        longitude.value().unwrap_or_default(),
    );
    match state.geocoder.reverse(lat, lng).await {
        Ok(address) => HttpResponse::Ok().json(json!({ "address": address })),
        Err(e) => {
            warn!("Reverse geocoding failed for ({}, {}): {}", lat, lng, e);
            HttpResponse::BadGateway().json(json!({ "error": e.to_string() }))
        }
    }
}

/// The id segment is not used; it is always the current user's location
#[get("/locations/{id}")]
pub async fn show(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let (user, _) = match require_user(&req, &state, unauthorized()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    match user.location_coordinates() {
        Some((latitude, longitude)) => HttpResponse::Ok().json(json!({
            "latitude": latitude,
            "longitude": longitude,
            "location_name": user.location_name,
            "last_updated": opt_rfc3339(user.last_location_update),
        })),
        None => HttpResponse::NotFound().json(json!({ "status": "no_location" })),
    }
}

#[route("/locations/{id}", method = "PATCH", method = "PUT")]
pub async fn update(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<AppState>,
) -> impl Responder {
    let (user, _) = match require_user(&req, &state, unauthorized()).await {
        Ok(found) => found,
        Err(resp) => return resp,
    };

    let Some(location) = body.get("location").filter(|l| l.is_object()) else {
        return HttpResponse::BadRequest().json(json!({
            "status": "error",
            "errors": ["param is missing or the value is empty: location"],
        }));
    };

    let latitude = Numeric::parse(location.get("latitude"));
    let longitude = Numeric::parse(location.get("longitude"));
    let location_name = location
        .get("location_name")
        .and_then(|v| v.as_str())
        .filter(|v| !v.trim().is_empty());

    let mut errors = ValidationErrors::new();
    validate_latitude(&mut errors, latitude, true);
    validate_longitude(&mut errors, longitude, true);
    if let Err(errors) = errors.into_result() {
        return HttpResponse::UnprocessableEntity().json(json!({
            "status": "error",
            "errors": errors.messages(),
        }));
    }

    let (lat, lng) = (latitude.value(), longitude.value());
    if let Err(e) =
        UserTable::update_location(&state.db, user.id, lat, lng, location_name, now_ts()).await
    {
        error!("Failed to update location for user {}: {}", user.id, e);
        return HttpResponse::UnprocessableEntity().json(json!({
            "status": "error",
            "errors": ["Location could not be saved"],
        }));
    }

    HttpResponse::Ok().json(json!({
        "status": "success",
        "location": {
            "latitude": lat,
            "longitude": lng,
            "location_name": location_name,
        },
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(reverse_geocode).service(show).service(update);
}
