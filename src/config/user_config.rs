//! Service configuration for SMIPE
//!
//! Settings live in settings.json inside the config directory. Spotify credentials can
//! also come from the environment, which wins over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Paths;

/// Scopes requested during the Spotify authorization step
pub const DEFAULT_SPOTIFY_SCOPES: &str = "user-read-private user-read-email playlist-read-private \
    playlist-read-collaborative playlist-modify-private playlist-modify-public streaming \
    user-modify-playback-state user-read-playback-state user-read-currently-playing \
    user-library-read user-library-modify";

/// User configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    /// Server ID used as the session signing secret
    #[serde(default)]
    pub server_id: String,

    /// Public origin of the service, used to build absolute redirect URLs
    #[serde(default = "default_full_host")]
    pub full_host: String,

    #[serde(default)]
    pub spotify_client_id: String,

    #[serde(default)]
    pub spotify_client_secret: String,

    /// OAuth redirect URI registered with Spotify
    #[serde(default)]
    pub spotify_callback_url: String,

    #[serde(default = "default_spotify_scopes")]
    pub spotify_scopes: String,

    #[serde(default = "default_spotify_accounts_url")]
    pub spotify_accounts_url: String,

    #[serde(default = "default_spotify_api_url")]
    pub spotify_api_url: String,

    /// Nominatim instance used for reverse geocoding
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    #[serde(default = "default_geocoder_language")]
    pub geocoder_language: String,

    #[serde(default = "default_geocoder_user_agent")]
    pub geocoder_user_agent: String,

    /// Geocoding request timeout in seconds
    #[serde(default = "default_geocoder_timeout")]
    pub geocoder_timeout: u64,

    /// Radius for the nearby users query, in kilometres
    #[serde(default = "default_nearby_radius_km")]
    pub nearby_radius_km: f64,

    /// Max nearby users returned on the home page
    #[serde(default = "default_nearby_limit")]
    pub nearby_limit: i64,

    /// A stored location older than this is reported as stale
    #[serde(default = "default_location_stale_hours")]
    pub location_stale_hours: i64,

    /// Session cookie lifetime in days
    #[serde(default = "default_session_days")]
    pub session_days: i64,

    /// Mark session cookies Secure (enable behind https)
    #[serde(default)]
    pub secure_cookies: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            server_id: String::new(),
            full_host: default_full_host(),
            spotify_client_id: String::new(),
            spotify_client_secret: String::new(),
            spotify_callback_url: String::new(),
            spotify_scopes: default_spotify_scopes(),
            spotify_accounts_url: default_spotify_accounts_url(),
            spotify_api_url: default_spotify_api_url(),
            nominatim_url: default_nominatim_url(),
            geocoder_language: default_geocoder_language(),
            geocoder_user_agent: default_geocoder_user_agent(),
            geocoder_timeout: default_geocoder_timeout(),
            nearby_radius_km: default_nearby_radius_km(),
            nearby_limit: default_nearby_limit(),
            location_stale_hours: default_location_stale_hours(),
            session_days: default_session_days(),
            secure_cookies: false,
        }
    }
}

impl UserConfig {
    /// Load configuration from the settings file, creating it on first run
    pub fn load() -> Result<Self> {
        let paths = Paths::get()?;
        Self::load_from(&paths.settings_path())
    }

    /// Load configuration from an explicit settings file
    pub fn load_from(settings_path: &Path) -> Result<Self> {
        let mut config = if settings_path.exists() {
            let content =
                std::fs::read_to_string(settings_path).context("Failed to read settings file")?;
            serde_json::from_str::<UserConfig>(&content).context("Failed to parse settings file")?
        } else {
            Self::default()
        };

        if config.server_id.is_empty() {
            config.server_id = uuid::Uuid::new_v4().to_string();
        }
        config.save_to(settings_path)?;

        Ok(config)
    }

    /// Save configuration to the settings file
    pub fn save_to(&self, settings_path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(settings_path, content).context("Failed to write settings file")?;
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty("SPOTIFY_CLIENT_ID") {
            self.spotify_client_id = id;
        }
        if let Some(secret) = non_empty("SPOTIFY_CLIENT_SECRET") {
            self.spotify_client_secret = secret;
        }
        if let Some(url) = non_empty("SPOTIFY_CALLBACK_URL") {
            self.spotify_callback_url = url;
        }
        if let Some(host) = non_empty("SMIPE_FULL_HOST") {
            self.full_host = host;
        }

        self
    }

    /// Redirect URI sent to Spotify, derived from the public host when unset
    pub fn callback_url(&self) -> String {
        if self.spotify_callback_url.is_empty() {
            format!(
                "{}/auth/spotify/callback",
                self.full_host.trim_end_matches('/')
            )
        } else {
            self.spotify_callback_url.clone()
        }
    }

    /// Whether Spotify login can work at all
    pub fn has_spotify_credentials(&self) -> bool {
        !self.spotify_client_id.is_empty() && !self.spotify_client_secret.is_empty()
    }
}

// Default value functions for serde

fn default_full_host() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_spotify_scopes() -> String {
    DEFAULT_SPOTIFY_SCOPES.to_string()
}

fn default_spotify_accounts_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_spotify_api_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_geocoder_language() -> String {
    "ja".to_string()
}

fn default_geocoder_user_agent() -> String {
    "SMIPE".to_string()
}

fn default_geocoder_timeout() -> u64 {
    3
}

fn default_nearby_radius_km() -> f64 {
    10.0
}

fn default_nearby_limit() -> i64 {
    10
}

fn default_location_stale_hours() -> i64 {
    1
}

fn default_session_days() -> i64 {
    14
}
