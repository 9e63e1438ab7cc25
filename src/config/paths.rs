//! Path management for SMIPE
//!
//! Everything the service writes lives under one config directory.

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

static PATHS: OnceCell<Arc<Paths>> = OnceCell::new();

/// Manages all filesystem paths for the application
#[derive(Debug, Clone)]
pub struct Paths {
    /// Config directory path
    config_dir: PathBuf,
    /// Path to the built web client (map + player scripts)
    client_path: PathBuf,
}

impl Paths {
    /// Initialize the paths singleton
    pub fn init(config: Option<PathBuf>, client: Option<PathBuf>) -> Result<Arc<Paths>> {
        let paths = PATHS.get_or_try_init(|| {
            let paths = Self::new(config, client)?;
            Ok::<_, anyhow::Error>(Arc::new(paths))
        })?;
        Ok(Arc::clone(paths))
    }

    /// Get the global paths instance
    pub fn get() -> Result<Arc<Paths>> {
        PATHS.get().map(Arc::clone).context("Paths not initialized")
    }

    fn new(config_override: Option<PathBuf>, client_override: Option<PathBuf>) -> Result<Self> {
        let config_parent = if let Some(ref path) = config_override {
            path.clone()
        } else {
            directories::ProjectDirs::from("", "", "smipe")
                .map(|dirs| dirs.config_dir().to_path_buf())
                .and_then(|dir| dir.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from("."))
        };

        let config_dir_name = if is_home_dir(&config_parent) {
            ".smipe"
        } else {
            "smipe"
        };
        let config_dir = config_parent.join(config_dir_name);
        let client_path = client_override.unwrap_or_else(|| config_dir.join("client"));

        let paths = Self {
            config_dir,
            client_path,
        };
        paths.create_directories()?;

        Ok(paths)
    }

    fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)
            .with_context(|| format!("Failed to create {}", self.config_dir.display()))?;

        for subdir in ["client", "uploads"] {
            std::fs::create_dir_all(self.config_dir.join(subdir))?;
        }

        Ok(())
    }

    /// Get the config directory
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get the client path
    pub fn client_path(&self) -> &Path {
        &self.client_path
    }

    /// Get the main database path
    pub fn app_db_path(&self) -> PathBuf {
        self.config_dir.join("smipe.db")
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Directory holding images attached to playlist locations
    pub fn uploads_dir(&self) -> PathBuf {
        self.config_dir.join("uploads")
    }
}

/// Check if a path is in the user's home directory
fn is_home_dir(path: &Path) -> bool {
    directories::UserDirs::new()
        .map(|dirs| path == dirs.home_dir())
        .unwrap_or(false)
}
