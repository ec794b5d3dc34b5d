//! Builders
//!
//! Fluent builder patterns for service configuration.

pub mod config;

pub use config::{service_config, ServiceConfigBuilder};
