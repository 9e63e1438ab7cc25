//! A Spotify playlist pinned to a place on the map

use serde::{Deserialize, Serialize};

use super::location::{
    validate_latitude, validate_longitude, validate_presence, Numeric, ValidationErrors,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistLocation {
    pub id: i64,
    pub name: String,
    /// Spotify playlist URI (spotify:playlist:<id>)
    pub uri: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: Option<String>,
    pub comment: Option<String>,
    pub first_track_uri: Option<String>,
    /// Stored upload file name
    pub image: Option<String>,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Unvalidated input for a new playlist location
#[derive(Debug, Clone, Default)]
pub struct NewPlaylistLocation {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub latitude: Numeric,
    pub longitude: Numeric,
    pub location_name: Option<String>,
    pub comment: Option<String>,
    pub first_track_uri: Option<String>,
}

impl NewPlaylistLocation {
    /// Validate and build the row for `user_id`
    pub fn build(self, user_id: i64) -> Result<PlaylistLocation, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_presence(&mut errors, "Name", self.name.as_deref());
        validate_presence(&mut errors, "Uri", self.uri.as_deref());
        validate_latitude(&mut errors, self.latitude, false);
        validate_longitude(&mut errors, self.longitude, false);
        errors.into_result()?;

        Ok(PlaylistLocation {
            id: 0,
            name: self.name.unwrap_or_default().trim().to_string(),
            uri: self.uri.unwrap_or_default().trim().to_string(),
            latitude: self.latitude.value().unwrap_or_default(),
            longitude: self.longitude.value().unwrap_or_default(),
            location_name: non_blank(self.location_name),
            comment: non_blank(self.comment),
            first_track_uri: non_blank(self.first_track_uri),
            image: None,
            user_id,
            created_at: 0,
            updated_at: 0,
        })
    }
}

impl PlaylistLocation {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Spotify playlist id taken from the URI
    pub fn playlist_id(&self) -> Option<&str> {
        Some(crate::spotify::uri::last_segment(&self.uri)).filter(|id| !id.is_empty())
    }
}

pub const UNKNOWN_OWNER: &str = "Unknown user";

/// Owner details joined onto playlist locations for the map
#[derive(Debug, Clone, Default)]
pub struct LocationOwner {
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub image: Option<String>,
}

impl LocationOwner {
    /// Name shown on map pins
    pub fn display_name(&self) -> &str {
        [self.name.as_deref(), self.nickname.as_deref()]
            .into_iter()
            .flatten()
            .find(|n| !n.trim().is_empty())
            .unwrap_or(UNKNOWN_OWNER)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
