//! Core Components
//!
//! HTTP transport and interceptor middleware.

pub mod middleware;
pub mod transport;

pub use middleware::*;
pub use transport::*;
