//! # Trousseau API Server Library
//!
//! HTTP layer of Trousseau: a REST backend for managing companies
//! (agencies and conciergeries), personnel, physical property keys and
//! cross-company key shares, including key visibility resolution.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
