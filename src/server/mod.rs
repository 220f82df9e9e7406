//! Server module for building the HTTP server
//!
//! This module provides a `ServerBuilder` that wires a store into the
//! versioned JSON:API routes, health checks and tracing middleware.

pub mod builder;
pub mod router;

pub use builder::ServerBuilder;
pub use router::{API_PREFIX, build_api_routes, build_router, health_routes};
