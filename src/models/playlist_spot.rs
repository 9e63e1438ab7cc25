//! Map pin dropping one of the user's playlists at a coordinate

use serde::{Deserialize, Serialize};

use super::location::{
    validate_latitude, validate_longitude, validate_presence, Numeric, ValidationErrors,
};
use crate::utils::dates::to_rfc3339;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistSpot {
    pub id: i64,
    pub user_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub spotify_playlist_id: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl PlaylistSpot {
    /// Validate raw request values into a spot owned by `user_id`
    pub fn build(
        user_id: i64,
        latitude: Numeric,
        longitude: Numeric,
        spotify_playlist_id: Option<String>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_latitude(&mut errors, latitude, false);
        validate_longitude(&mut errors, longitude, false);
        validate_presence(
            &mut errors,
            "Spotify playlist",
            spotify_playlist_id.as_deref(),
        );
        errors.into_result()?;

        Ok(Self {
            id: 0,
            user_id,
            latitude: latitude.value().unwrap_or_default(),
            longitude: longitude.value().unwrap_or_default(),
            spotify_playlist_id: spotify_playlist_id.unwrap_or_default().trim().to_string(),
            created_at: 0,
            updated_at: 0,
        })
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "user_id": self.user_id,
            "latitude": self.latitude,
            "longitude": self.longitude,
            "spotify_playlist_id": self.spotify_playlist_id,
            "created_at": to_rfc3339(self.created_at),
            "updated_at": to_rfc3339(self.updated_at),
        })
    }
}
