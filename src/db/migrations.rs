//! Database migrations

use anyhow::Result;
use tracing::info;

use super::DbEngine;

/// Current migration version
const CURRENT_VERSION: i32 = 2;

/// Columns added to playlist_location after the first release
const PLAYLIST_LOCATION_EXTRA_COLUMNS: [&str; 3] = ["comment", "first_track_uri", "image"];

/// Run database migrations
pub async fn run_migrations(engine: &DbEngine) -> Result<()> {
    let current_version = get_migration_version(engine).await?;

    if current_version >= CURRENT_VERSION {
        info!("Database is up to date (version {})", current_version);
        return Ok(());
    }

    info!(
        "Running migrations from version {} to {}",
        current_version, CURRENT_VERSION
    );

    for version in (current_version + 1)..=CURRENT_VERSION {
        run_migration(engine, version).await?;

        sqlx::query("UPDATE dbmigration SET version = ? WHERE id = 1")
            .bind(version)
            .execute(engine.pool())
            .await?;

        info!("Applied migration {}", version);
    }

    Ok(())
}

async fn run_migration(engine: &DbEngine, version: i32) -> Result<()> {
    let pool = engine.pool();

    match version {
        1 => {
            // base tables are created by create_tables
        }
        2 => {
            for column in PLAYLIST_LOCATION_EXTRA_COLUMNS {
                let has_column: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM pragma_table_info('playlist_location') WHERE name = ?",
                )
                .bind(column)
                .fetch_one(pool)
                .await?;

                if has_column == 0 {
                    sqlx::query(&format!(
                        "ALTER TABLE playlist_location ADD COLUMN {} TEXT",
                        column
                    ))
                    .execute(pool)
                    .await?;
                }
            }
        }
        _ => {
            tracing::warn!("Unknown migration version: {}", version);
        }
    }

    Ok(())
}

/// Get the current migration version
pub async fn get_migration_version(engine: &DbEngine) -> Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT version FROM dbmigration WHERE id = 1")
        .fetch_one(engine.pool())
        .await?;

    Ok(row.0)
}
