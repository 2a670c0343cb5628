//! Axum HTTP server, routing, and middleware for the issuer service.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
