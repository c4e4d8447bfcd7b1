//! Configuration loading and management.
//!
//! This module loads `.opsdesk/config.toml`, layers environment overrides
//! on top, and checks the result before anything connects.

pub mod error;
pub mod loader;
pub mod models;
