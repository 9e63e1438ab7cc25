//! Reverse geocoding against a Nominatim instance

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::UserConfig;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoding service returned {0}")]
    Status(u16),

    #[error("No address found for the given coordinates")]
    NoResult,
}

/// Turns coordinates into a human-readable address
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError>;
}

#[derive(Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    language: String,
}

impl NominatimGeocoder {
    pub fn new(config: &UserConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(config.geocoder_user_agent.clone())
            .timeout(Duration::from_secs(config.geocoder_timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.nominatim_url.trim_end_matches('/').to_string(),
            language: config.geocoder_language.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, latitude: f64, longitude: f64) -> Result<String, GeocodeError> {
        let res = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("accept-language", self.language.clone()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(GeocodeError::Status(res.status().as_u16()));
        }

        let body: ReverseResponse = res.json().await?;
        body.display_name
            .filter(|name| !name.trim().is_empty())
            .ok_or(GeocodeError::NoResult)
    }
}
