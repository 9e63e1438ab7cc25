//! Playlist table operations

use anyhow::Result;
use sqlx::FromRow;

use crate::db::DbEngine;
use crate::models::Playlist;
use crate::utils::dates::now_ts;

const UPSERT_SQL: &str = "INSERT INTO playlist \
     (user_id, spotify_id, name, latitude, longitude, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?, ?) \
     ON CONFLICT(user_id, spotify_id) DO UPDATE SET \
     name = excluded.name, latitude = excluded.latitude, \
     longitude = excluded.longitude, updated_at = excluded.updated_at";

/// Database row for playlist table
#[derive(Debug, FromRow)]
struct PlaylistRow {
    id: i64,
    user_id: i64,
    spotify_id: String,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: i64,
    updated_at: i64,
}

impl PlaylistRow {
    fn into_playlist(self) -> Playlist {
        Playlist {
            id: self.id,
            user_id: self.user_id,
            spotify_id: self.spotify_id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Playlist table operations
pub struct PlaylistTable;

impl PlaylistTable {
    /// Get all cached playlists of a user
    pub async fn all_for_user(db: &DbEngine, user_id: i64) -> Result<Vec<Playlist>> {
        let rows: Vec<PlaylistRow> =
            sqlx::query_as("SELECT * FROM playlist WHERE user_id = ? ORDER BY id")
                .bind(user_id)
                .fetch_all(db.pool())
                .await?;

        Ok(rows.into_iter().map(|r| r.into_playlist()).collect())
    }

    /// Find each (user, spotify id) row or create it, refreshing name and coordinates.
    /// The batch runs in one transaction.
    pub async fn upsert_many(db: &DbEngine, playlists: &[Playlist]) -> Result<()> {
        let mut tx = db.pool().begin().await?;
        let now = now_ts();

        for playlist in playlists {
            sqlx::query(UPSERT_SQL)
                .bind(playlist.user_id)
                .bind(&playlist.spotify_id)
                .bind(&playlist.name)
                .bind(playlist.latitude)
                .bind(playlist.longitude)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
