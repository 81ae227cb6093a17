//! HTTP service wrapping the sonata-form analysis pipeline.
//!
//! The binary loads configuration and serves the router built here;
//! integration tests drive the same router directly through tower.

pub mod config;
pub mod error;
pub mod web;

pub use config::{ConfigError, ConfigSources, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use web::{router, AppState};
