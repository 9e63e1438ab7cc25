//! Core services behind the HTTP handlers

pub mod cover_cache;
pub mod credentials;
pub mod geocoder;
pub mod player;
pub mod uploads;

pub use cover_cache::CoverCache;
pub use credentials::SessionError;
pub use geocoder::{GeocodeError, Geocoder, NominatimGeocoder};
