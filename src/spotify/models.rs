//! Spotify Web API payloads and the session credential hash

use serde::{Deserialize, Serialize};

/// Token endpoint response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub scope: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

impl TokenSet {
    pub fn expires_at(&self, now: i64) -> i64 {
        now + self.expires_in
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyImage {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

fn first_url(images: &Option<Vec<SpotifyImage>>) -> Option<String> {
    images
        .as_ref()
        .and_then(|images| images.first())
        .map(|image| image.url.clone())
}

/// `GET /me`
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<SpotifyImage>>,
}

impl SpotifyProfile {
    pub fn image_url(&self) -> Option<String> {
        first_url(&self.images)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracksRef {
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRef {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Playlist as listed by `GET /me/playlists`
#[derive(Debug, Clone, Deserialize)]
pub struct SimplePlaylist {
    pub id: String,
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub images: Option<Vec<SpotifyImage>>,
    #[serde(default)]
    pub tracks: Option<TracksRef>,
    #[serde(default)]
    pub owner: Option<OwnerRef>,
}

impl SimplePlaylist {
    pub fn image_url(&self) -> Option<String> {
        first_url(&self.images)
    }

    pub fn tracks_total(&self) -> u32 {
        self.tracks.as_ref().map(|t| t.total).unwrap_or(0)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "name": self.name,
            "uri": self.uri,
            "image": self.image_url(),
            "tracks_total": self.tracks_total(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl Track {
    pub fn artist_names(&self) -> Vec<String> {
        self.artists.iter().map(|a| a.name.clone()).collect()
    }
}

/// One entry of a playlist's track listing; local files and removed tracks come back null
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackItem {
    #[serde(default)]
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifyInfo {
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifyCredentials {
    pub token: String,
    pub expires_at: Option<i64>,
    pub expires: bool,
}

/// Credential hash kept in the session for the logged-in user.
/// The cookie is signed but readable, so the refresh token and email stay in the user row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpotifyUserData {
    pub uid: String,
    pub info: SpotifyInfo,
    pub credentials: SpotifyCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_payload() {
        let playlist: SimplePlaylist = serde_json::from_value(serde_json::json!({
            "id": "abc",
            "name": "Rainy",
            "uri": "spotify:playlist:abc",
            "images": null,
            "tracks": {"href": "x", "total": 12},
            "owner": {"id": "alice"}
        }))
        .unwrap();

        assert_eq!(playlist.image_url(), None);
        assert_eq!(playlist.tracks_total(), 12);
        assert_eq!(playlist.to_value()["tracks_total"], 12);
    }

    #[test]
    fn test_playlist_track_item_null_track() {
        let page: Paging<PlaylistTrackItem> = serde_json::from_value(serde_json::json!({
            "items": [{"track": null}, {"track": {"name": "Song", "uri": "spotify:track:1", "artists": [{"name": "A"}, {"name": "B"}]}}],
            "next": null
        }))
        .unwrap();

        let tracks: Vec<Track> = page.items.into_iter().filter_map(|i| i.track).collect();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist_names(), vec!["A", "B"]);
    }

    #[test]
    fn test_token_set_defaults() {
        let token: TokenSet =
            serde_json::from_value(serde_json::json!({"access_token": "t"})).unwrap();
        assert_eq!(token.refresh_token, None);
        assert_eq!(token.expires_at(100), 3700);
    }
}
