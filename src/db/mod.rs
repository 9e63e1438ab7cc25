//! Database module for SMIPE
//!
//! This module handles all database operations using SQLx with SQLite.

mod engine;
mod migrations;
pub mod tables;

pub use engine::{create_tables, setup_sqlite, DbEngine};
pub use migrations::run_migrations;
pub use tables::*;

/// Fresh in-memory database with the full schema applied
#[cfg(test)]
pub async fn test_engine() -> DbEngine {
    let engine = DbEngine::in_memory().await.expect("in-memory database");
    create_tables(&engine).await.expect("create tables");
    run_migrations(&engine).await.expect("migrations");
    engine
}
