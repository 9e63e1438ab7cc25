//! Database table operations

mod playlist_location_table;
mod playlist_spot_table;
mod playlist_table;
mod user_table;

pub use playlist_location_table::PlaylistLocationTable;
pub use playlist_spot_table::PlaylistSpotTable;
pub use playlist_table::PlaylistTable;
pub use user_table::UserTable;
