//! Data models for SMIPE
//!
//! Rows stored in SQLite plus the coordinate helpers they share.

pub mod location;
mod playlist;
mod playlist_location;
mod playlist_spot;
mod user;

pub use location::{Numeric, ValidationErrors};
pub use playlist::Playlist;
pub use playlist_location::{LocationOwner, NewPlaylistLocation, PlaylistLocation};
pub use playlist_spot::PlaylistSpot;
pub use user::{NearbyUser, PublicUser, User};
