//! Shared utilities for krx-lens
//!
//! This crate provides the process-level plumbing shared by the binaries:
//! tracing setup and environment-driven configuration.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{LogFormat, init_tracing};
