//! Utility modules for SMIPE

pub mod auth;
pub mod dates;
pub mod hashing;
