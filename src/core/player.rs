//! Which playlist's tracks the player page starts with

use tracing::warn;

use crate::spotify::uri::parse_playlist_uri;
use crate::spotify::{SimplePlaylist, SpotifyApi, SpotifyError, Track};

/// Tracks fetched per playlist for the player queue
pub const PLAYER_TRACK_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSelection {
    pub first_track_uri: Option<String>,
    pub all_track_uris: Vec<String>,
}

impl TrackSelection {
    fn from_tracks(tracks: Vec<Track>) -> Self {
        let all_track_uris: Vec<String> = tracks.into_iter().map(|t| t.uri).collect();
        Self {
            first_track_uri: all_track_uris.first().cloned(),
            all_track_uris,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Resolve the starting track list.
///
/// A selected URI (usually another user's playlist picked from the map) wins and its
/// failures only empty the list. Otherwise the selected id among the user's own
/// playlists, then the first own playlist; failures there are returned.
pub async fn resolve_tracks(
    spotify: &dyn SpotifyApi,
    token: &str,
    playlists: &[SimplePlaylist],
    selected_id: Option<&str>,
    selected_uri: Option<&str>,
) -> Result<TrackSelection, SpotifyError> {
    let selected_id = non_empty(selected_id);

    if let Some(uri) = non_empty(selected_uri) {
        let (owner, playlist_id) = match parse_playlist_uri(uri) {
            Some(r) => (r.owner, Some(r.id)),
            None => (None, selected_id.map(str::to_string)),
        };

        let Some(playlist_id) = playlist_id else {
            return Ok(TrackSelection::default());
        };

        return match spotify
            .playlist_tracks(token, &playlist_id, Some(PLAYER_TRACK_LIMIT))
            .await
        {
            Ok(tracks) => Ok(TrackSelection::from_tracks(tracks)),
            Err(e) => {
                warn!(
                    "Failed to load selected playlist {} (owner {}): {}",
                    playlist_id,
                    owner.as_deref().unwrap_or("unknown"),
                    e
                );
                Ok(TrackSelection::default())
            }
        };
    }

    let playlist = match selected_id {
        Some(id) => playlists.iter().find(|p| p.id == id),
        None => playlists.first(),
    };

    match playlist {
        Some(playlist) => {
            let tracks = spotify
                .playlist_tracks(token, &playlist.id, Some(PLAYER_TRACK_LIMIT))
                .await?;
            Ok(TrackSelection::from_tracks(tracks))
        }
        None => Ok(TrackSelection::default()),
    }
}
