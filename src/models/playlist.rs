//! Local cache of a user's Spotify playlists

use serde::{Deserialize, Serialize};

/// One Spotify playlist remembered for a user, stamped with where it was saved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub user_id: i64,
    /// Spotify playlist id
    pub spotify_id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Playlist {
    pub fn new(user_id: i64, spotify_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            user_id,
            spotify_id: spotify_id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Stamp the owner's current coordinates
    pub fn at(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }
}
