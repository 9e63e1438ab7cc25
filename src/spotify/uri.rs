//! Spotify URI helpers

/// Last `:`-separated segment, the bare id for any Spotify URI
pub fn last_segment(uri: &str) -> &str {
    uri.rsplit(':').next().unwrap_or(uri)
}

/// Playlist addressed by a URI, optionally with the owning user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub owner: Option<String>,
    pub id: String,
}

/// Parse `spotify:user:<owner>:playlist:<id>` or `spotify:playlist:<id>`
pub fn parse_playlist_uri(uri: &str) -> Option<PlaylistRef> {
    let parts: Vec<&str> = uri.split(':').collect();

    if uri.starts_with("spotify:user:") && parts.len() >= 5 {
        return Some(PlaylistRef {
            owner: Some(parts[2].to_string()),
            id: parts[4].to_string(),
        });
    }

    if uri.starts_with("spotify:playlist:") && parts.len() >= 3 {
        return Some(PlaylistRef {
            owner: None,
            id: parts[2].to_string(),
        });
    }

    None
}
