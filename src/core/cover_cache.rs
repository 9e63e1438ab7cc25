//! Playlist cover lookups for the map, cached per playlist id

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use tracing::warn;

use crate::spotify::SpotifyApi;

const DEFAULT_CAPACITY: usize = 512;

/// LRU of playlist id -> cover URL; a cached None means the playlist has no cover
pub struct CoverCache {
    entries: Mutex<LruCache<String, Option<String>>>,
}

impl Default for CoverCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl CoverCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, playlist_id: &str) -> Option<Option<String>> {
        self.entries.lock().get(playlist_id).cloned()
    }

    pub fn put(&self, playlist_id: &str, cover: Option<String>) {
        self.entries.lock().put(playlist_id.to_string(), cover);
    }

    /// Cover URL for a playlist, asking Spotify on a miss. Failures are logged and not cached.
    pub async fn cover_for(&self, spotify: &dyn SpotifyApi, playlist_id: &str) -> Option<String> {
        if let Some(cached) = self.get(playlist_id) {
            return cached;
        }

        match spotify.playlist_cover(playlist_id).await {
            Ok(cover) => {
                self.put(playlist_id, cover.clone());
                cover
            }
            Err(e) => {
                warn!("Error fetching playlist image for {}: {}", playlist_id, e);
                None
            }
        }
    }
}
