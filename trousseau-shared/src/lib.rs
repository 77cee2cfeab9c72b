//! # Trousseau Shared Library
//!
//! This crate contains the data layer and business logic shared by the
//! Trousseau API server: connection pooling, migrations, models, key
//! visibility resolution, password hashing and the audit sink.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `visibility`: Key visibility resolution (owned / shared / hierarchy)
//! - `auth`: Password hashing (Argon2id)
//! - `audit`: Fire-and-forget audit sink
//! - `db`: Connection pool and migration runner

pub mod audit;
pub mod auth;
pub mod db;
pub mod models;
pub mod visibility;

/// Current version of the Trousseau shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
