//! Playlist spot table operations

use anyhow::Result;
use sqlx::FromRow;

use crate::db::DbEngine;
use crate::models::PlaylistSpot;
use crate::utils::dates::now_ts;

#[derive(Debug, FromRow)]
struct PlaylistSpotRow {
    id: i64,
    user_id: i64,
    latitude: f64,
    longitude: f64,
    spotify_playlist_id: String,
    created_at: i64,
    updated_at: i64,
}

impl From<PlaylistSpotRow> for PlaylistSpot {
    fn from(row: PlaylistSpotRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            latitude: row.latitude,
            longitude: row.longitude,
            spotify_playlist_id: row.spotify_playlist_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Playlist spot table operations
pub struct PlaylistSpotTable;

impl PlaylistSpotTable {
    /// Every spot, oldest first
    pub async fn all(db: &DbEngine) -> Result<Vec<PlaylistSpot>> {
        let rows: Vec<PlaylistSpotRow> = sqlx::query_as("SELECT * FROM playlist_spot ORDER BY id")
            .fetch_all(db.pool())
            .await?;

        Ok(rows.into_iter().map(PlaylistSpot::from).collect())
    }

    /// Insert a validated spot and return it with id and timestamps filled in
    pub async fn insert(db: &DbEngine, spot: &PlaylistSpot) -> Result<PlaylistSpot> {
        let now = now_ts();
        let result = sqlx::query(
            "INSERT INTO playlist_spot (user_id, latitude, longitude, spotify_playlist_id, \
             created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(spot.user_id)
        .bind(spot.latitude)
        .bind(spot.longitude)
        .bind(&spot.spotify_playlist_id)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await?;

        Ok(PlaylistSpot {
            id: result.last_insert_rowid(),
            created_at: now,
            updated_at: now,
            ..spot.clone()
        })
    }
}
