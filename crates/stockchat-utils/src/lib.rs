//! Shared utilities for stockchat
//!
//! Logging setup and the small amount of environment handling that every
//! binary in the workspace needs.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, env_or, env_parse};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
