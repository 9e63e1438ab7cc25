//! Coordinates, range validation and great-circle distance

use serde_json::Value;
use thiserror::Error;

/// Mean earth radius used by the nearby queries
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Widens the box a hair so rounding never cuts off a tangent point
const BOX_SLACK_DEG: f64 = 1e-6;

/// Validation failures collected as full, human readable messages
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("{}", .0.join(", "))]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn add(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    /// Ok when nothing was collected
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// A numeric request parameter, which may arrive as a JSON number or a form string
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Numeric {
    #[default]
    Blank,
    Number(f64),
    Invalid,
}

impl Numeric {
    pub fn parse(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Numeric::Blank,
            Some(Value::Number(n)) => n.as_f64().map(Numeric::Number).unwrap_or(Numeric::Invalid),
            Some(Value::String(s)) => Self::parse_str(s),
            Some(_) => Numeric::Invalid,
        }
    }

    pub fn parse_str(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Numeric::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Numeric::Number(v),
            _ => Numeric::Invalid,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Numeric::Blank)
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Number(v) => Some(*v),
            _ => None,
        }
    }
}

/// Check a numeric attribute against an inclusive range.
///
/// Blank values are accepted only when `allow_blank` is set; otherwise they add a
/// "can't be blank" message.
pub fn validate_range(
    errors: &mut ValidationErrors,
    attribute: &str,
    value: Numeric,
    min: i32,
    max: i32,
    allow_blank: bool,
) {
    match value {
        Numeric::Blank => {
            if !allow_blank {
                errors.add(format!("{} can't be blank", attribute));
            }
        }
        Numeric::Invalid => errors.add(format!("{} is not a number", attribute)),
        Numeric::Number(v) => {
            if v < f64::from(min) {
                errors.add(format!(
                    "{} must be greater than or equal to {}",
                    attribute, min
                ));
            }
            if v > f64::from(max) {
                errors.add(format!("{} must be less than or equal to {}", attribute, max));
            }
        }
    }
}

pub fn validate_latitude(errors: &mut ValidationErrors, value: Numeric, allow_blank: bool) {
    validate_range(errors, "Latitude", value, -90, 90, allow_blank);
}

pub fn validate_longitude(errors: &mut ValidationErrors, value: Numeric, allow_blank: bool) {
    validate_range(errors, "Longitude", value, -180, 180, allow_blank);
}

pub fn validate_presence(errors: &mut ValidationErrors, attribute: &str, value: Option<&str>) {
    if value.map(|v| v.trim().is_empty()).unwrap_or(true) {
        errors.add(format!("{} can't be blank", attribute));
    }
}

/// Great-circle distance in kilometres (spherical law of cosines)
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let (lat1_r, lat2_r) = (lat1.to_radians(), lat2.to_radians());
    let dlng = (lng2 - lng1).to_radians();

    let cosine = lat1_r.cos() * lat2_r.cos() * dlng.cos() + lat1_r.sin() * lat2_r.sin();
    EARTH_RADIUS_KM * cosine.clamp(-1.0, 1.0).acos()
}

/// Strictly inside the radius
pub fn within_radius(lat: f64, lng: f64, other_lat: f64, other_lng: f64, radius_km: f64) -> bool {
    distance_km(lat, lng, other_lat, other_lng) < radius_km
}

/// Coarse box used to pre-filter rows in SQL before the exact distance check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Smallest lat/lng box containing every point within `radius_km`.
    ///
    /// The longitude half-width at latitude `lat` for angular radius `d` is
    /// `asin(sin d / cos lat)`. Circles touching a pole or crossing the antimeridian
    /// cover every longitude.
    pub fn around(lat: f64, lng: f64, radius_km: f64) -> Self {
        const FULL_LNG: (f64, f64) = (-180.0, 180.0);

        let angular = (radius_km.max(0.0) / EARTH_RADIUS_KM).min(std::f64::consts::PI);
        let lat_delta = angular.to_degrees() + BOX_SLACK_DEG;
        let min_lat = lat - lat_delta;
        let max_lat = lat + lat_delta;

        let sin_angular = angular.sin();
        let cos_lat = lat.to_radians().cos();

        let (min_lng, max_lng) = if min_lat <= -90.0 || max_lat >= 90.0 || sin_angular >= cos_lat {
            FULL_LNG
        } else {
            let lng_delta = (sin_angular / cos_lat).asin().to_degrees() + BOX_SLACK_DEG;
            if lng - lng_delta < -180.0 || lng + lng_delta > 180.0 {
                FULL_LNG
            } else {
                (lng - lng_delta, lng + lng_delta)
            }
        };

        Self {
            min_lat: min_lat.max(-90.0),
            max_lat: max_lat.min(90.0),
            min_lng,
            max_lng,
        }
    }

    #[cfg(test)]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lng..=self.max_lng).contains(&lng)
    }
}
