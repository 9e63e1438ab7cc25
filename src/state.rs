//! Shared state handed to every handler through `web::Data`

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::UserConfig;
use crate::core::{CoverCache, Geocoder};
use crate::db::DbEngine;
use crate::spotify::SpotifyApi;

pub struct AppState {
    pub db: DbEngine,
    pub config: Arc<UserConfig>,
    pub spotify: Arc<dyn SpotifyApi>,
    pub geocoder: Arc<dyn Geocoder>,
    pub covers: CoverCache,
    pub uploads_dir: PathBuf,
}

impl AppState {
    pub fn new(
        db: DbEngine,
        config: UserConfig,
        spotify: Arc<dyn SpotifyApi>,
        geocoder: Arc<dyn Geocoder>,
        uploads_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            config: Arc::new(config),
            spotify,
            geocoder,
            covers: CoverCache::default(),
            uploads_dir,
        }
    }
}
