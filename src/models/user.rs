//! User model

use serde::{Deserialize, Serialize};

use crate::utils::dates::{is_older_than_hours, opt_rfc3339, timestamp_to_relative};

/// A Spotify-authenticated user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    /// Database ID
    pub id: i64,
    /// Spotify user id
    pub uid: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Profile image URL
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub last_location_update: Option<i64>,
    /// Spotify access token (never serialized)
    #[serde(skip_serializing, default)]
    pub access_token: Option<String>,
    #[serde(skip_serializing, default)]
    pub refresh_token: Option<String>,
    /// Unix time the access token stops working
    #[serde(skip_serializing, default)]
    pub token_expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Create a user for a Spotify account seen for the first time
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn has_location(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn location_coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// A location never set or not refreshed within `hours`
    pub fn location_stale(&self, hours: i64, now: i64) -> bool {
        is_older_than_hours(self.last_location_update, hours, now)
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .as_deref()
            .map(|t| !t.is_empty())
            .unwrap_or(false)
    }

    /// Name shown next to shared playlists
    pub fn display_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.nickname.as_deref().filter(|n| !n.is_empty()))
    }

    /// Location block used by the player and home pages
    pub fn location_value(&self, stale_hours: i64, now: i64) -> Option<serde_json::Value> {
        let (latitude, longitude) = self.location_coordinates()?;
        Some(serde_json::json!({
            "latitude": latitude,
            "longitude": longitude,
            "location_name": self.location_name,
            "last_updated": opt_rfc3339(self.last_location_update),
            "last_updated_human": self.last_location_update.map(timestamp_to_relative),
            "is_stale": self.location_stale(stale_hours, now),
        }))
    }

    /// Serialize without tokens (for API responses)
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            uid: self.uid.clone(),
            nickname: self.nickname.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            email: self.email.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            location_name: self.location_name.clone(),
            last_location_update: opt_rfc3339(self.last_location_update),
        }
    }
}

/// Public user info (no tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub uid: String,
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
    pub email: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub last_location_update: Option<String>,
}

/// A user found by the nearby query, with the distance from the origin
#[derive(Debug, Clone, Serialize)]
pub struct NearbyUser {
    pub id: i64,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub image: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub distance_km: f64,
}
