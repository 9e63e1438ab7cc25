//! Playlist location table operations

use anyhow::Result;
use sqlx::FromRow;

use crate::db::DbEngine;
use crate::models::location::{within_radius, BoundingBox};
use crate::models::{LocationOwner, PlaylistLocation};
use crate::utils::dates::now_ts;

const SELECT_WITH_OWNER: &str = "SELECT pl.*, u.name AS owner_name, u.nickname AS owner_nickname, \
     u.image AS owner_image FROM playlist_location pl LEFT JOIN user u ON u.id = pl.user_id";

/// Database row for playlist_location joined with its owner
#[derive(Debug, FromRow)]
struct PlaylistLocationRow {
    id: i64,
    name: String,
    uri: String,
    latitude: f64,
    longitude: f64,
    location_name: Option<String>,
    comment: Option<String>,
    first_track_uri: Option<String>,
    image: Option<String>,
    user_id: i64,
    created_at: i64,
    updated_at: i64,
    owner_name: Option<String>,
    owner_nickname: Option<String>,
    owner_image: Option<String>,
}

impl PlaylistLocationRow {
    fn into_parts(self) -> (PlaylistLocation, LocationOwner) {
        let owner = LocationOwner {
            name: self.owner_name,
            nickname: self.owner_nickname,
            image: self.owner_image,
        };
        let location = PlaylistLocation {
            id: self.id,
            name: self.name,
            uri: self.uri,
            latitude: self.latitude,
            longitude: self.longitude,
            location_name: self.location_name,
            comment: self.comment,
            first_track_uri: self.first_track_uri,
            image: self.image,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (location, owner)
    }
}

/// Playlist location table operations
pub struct PlaylistLocationTable;

impl PlaylistLocationTable {
    /// Insert a validated playlist location, returning the new id
    pub async fn insert(db: &DbEngine, location: &PlaylistLocation) -> Result<i64> {
        let now = now_ts();
        let result = sqlx::query(
            "INSERT INTO playlist_location (name, uri, latitude, longitude, location_name, comment, \
             first_track_uri, image, user_id, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&location.name)
        .bind(&location.uri)
        .bind(location.latitude)
        .bind(location.longitude)
        .bind(&location.location_name)
        .bind(&location.comment)
        .bind(&location.first_track_uri)
        .bind(&location.image)
        .bind(location.user_id)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Every playlist location with its owner, newest first
    pub async fn all_with_owner(db: &DbEngine) -> Result<Vec<(PlaylistLocation, LocationOwner)>> {
        let rows: Vec<PlaylistLocationRow> = sqlx::query_as(&format!(
            "{} ORDER BY pl.created_at DESC, pl.id DESC",
            SELECT_WITH_OWNER
        ))
        .fetch_all(db.pool())
        .await?;

        Ok(rows.into_iter().map(|r| r.into_parts()).collect())
    }

    /// Playlist locations strictly within `radius_km` of the point, newest first
    pub async fn near_location(
        db: &DbEngine,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<(PlaylistLocation, LocationOwner)>> {
        let bbox = BoundingBox::around(latitude, longitude, radius_km);

        let rows: Vec<PlaylistLocationRow> = sqlx::query_as(&format!(
            "{} WHERE pl.latitude BETWEEN ? AND ? AND pl.longitude BETWEEN ? AND ? \
             ORDER BY pl.created_at DESC, pl.id DESC",
            SELECT_WITH_OWNER
        ))
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lng)
        .bind(bbox.max_lng)
        .fetch_all(db.pool())
        .await?;

        Ok(rows
            .into_iter()
            .filter(|r| within_radius(latitude, longitude, r.latitude, r.longitude, radius_km))
            .map(|r| r.into_parts())
            .collect())
    }
}
