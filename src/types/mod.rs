//! OAuth2 Types
//!
//! Core type definitions for token lifecycle operations.

pub mod config;
pub mod params;
pub mod token;

pub use config::*;
pub use params::*;
pub use token::*;
