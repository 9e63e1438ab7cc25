//! User table operations

use anyhow::Result;
use sqlx::FromRow;

use crate::db::DbEngine;
use crate::models::location::{distance_km, BoundingBox};
use crate::models::{NearbyUser, User};
use crate::utils::dates::now_ts;

/// Database row for user table
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    uid: String,
    nickname: Option<String>,
    name: Option<String>,
    image: Option<String>,
    email: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_name: Option<String>,
    last_location_update: Option<i64>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_expires_at: Option<i64>,
    created_at: i64,
    updated_at: i64,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            id: self.id,
            uid: self.uid,
            nickname: self.nickname,
            name: self.name,
            image: self.image,
            email: self.email,
            latitude: self.latitude,
            longitude: self.longitude,
            location_name: self.location_name,
            last_location_update: self.last_location_update,
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            token_expires_at: self.token_expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// User table operations
pub struct UserTable;

impl UserTable {
    /// Get user by ID
    pub async fn get_by_id(db: &DbEngine, id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Get user by Spotify user id
    pub async fn get_by_uid(db: &DbEngine, uid: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM user WHERE uid = ?")
            .bind(uid)
            .fetch_optional(db.pool())
            .await?;

        Ok(row.map(|r| r.into_user()))
    }

    /// Insert a user, returning the new id
    pub async fn insert(db: &DbEngine, user: &User) -> Result<i64> {
        let now = now_ts();
        let result = sqlx::query(
            "INSERT INTO user (uid, nickname, name, image, email, latitude, longitude, location_name, \
             last_location_update, access_token, refresh_token, token_expires_at, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.uid)
        .bind(&user.nickname)
        .bind(&user.name)
        .bind(&user.image)
        .bind(&user.email)
        .bind(user.latitude)
        .bind(user.longitude)
        .bind(&user.location_name)
        .bind(user.last_location_update)
        .bind(&user.access_token)
        .bind(&user.refresh_token)
        .bind(user.token_expires_at)
        .bind(now)
        .bind(now)
        .execute(db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Store a new location for the user
    pub async fn update_location(
        db: &DbEngine,
        id: i64,
        latitude: Option<f64>,
        longitude: Option<f64>,
        location_name: Option<&str>,
        at: i64,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE user SET latitude = ?, longitude = ?, location_name = ?, \
             last_location_update = ?, updated_at = ? WHERE id = ?",
        )
        .bind(latitude)
        .bind(longitude)
        .bind(location_name)
        .bind(at)
        .bind(at)
        .bind(id)
        .execute(db.pool())
        .await?;

        Ok(())
    }

    /// Store Spotify tokens; a missing refresh token keeps the previous one
    pub async fn update_tokens(
        db: &DbEngine,
        id: i64,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<i64>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE user SET access_token = ?, refresh_token = COALESCE(?, refresh_token), \
             token_expires_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(access_token)
        .bind(refresh_token)
        .bind(expires_at)
        .bind(now_ts())
        .bind(id)
        .execute(db.pool())
        .await?;

        Ok(())
    }

    /// Users with a stored location strictly within `radius_km` of the point
    pub async fn near_location(
        db: &DbEngine,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        exclude_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<NearbyUser>> {
        let bbox = BoundingBox::around(latitude, longitude, radius_km);

        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT * FROM user WHERE latitude IS NOT NULL AND longitude IS NOT NULL \
             AND latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ? \
             AND id != ? ORDER BY id",
        )
        .bind(bbox.min_lat)
        .bind(bbox.max_lat)
        .bind(bbox.min_lng)
        .bind(bbox.max_lng)
        .bind(exclude_id.unwrap_or(-1))
        .fetch_all(db.pool())
        .await?;

        let nearby = rows
            .into_iter()
            .filter_map(|row| {
                let (lat, lng) = (row.latitude?, row.longitude?);
                let distance = distance_km(latitude, longitude, lat, lng);
                (distance < radius_km).then(|| NearbyUser {
                    id: row.id,
                    name: row.name,
                    nickname: row.nickname,
                    image: row.image,
                    latitude: lat,
                    longitude: lng,
                    location_name: row.location_name,
                    distance_km: distance,
                })
            })
            .take(limit.max(0) as usize)
            .collect();

        Ok(nearby)
    }

    /// Get user count
    pub async fn count(db: &DbEngine) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user")
            .fetch_one(db.pool())
            .await?;

        Ok(row.0)
    }
}
