//! Axum HTTP server, routing, and middleware for the verifier service.

pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
