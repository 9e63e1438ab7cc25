//! HTTP routes for SMIPE

pub mod auth;
pub mod locations;
pub mod pages;
pub mod player;
pub mod playlist_spots;
pub mod playlists;
pub mod session;

#[cfg(test)]
pub mod testing;

use actix_web::web;

/// Configure all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Landing, player, map and health pages
        .configure(pages::configure)
        // Spotify OAuth and logout
        .configure(auth::configure)
        // Playlists from Spotify and the local cache
        .configure(playlists::configure)
        // Player actions and map pins
        .configure(player::configure)
        .configure(playlist_spots::configure)
        // User location and reverse geocoding
        .configure(locations::configure);
}
