//! posekit HTTP server library.
//!
//! Exposes config, state, error handling, the session gate and routes so the
//! binary entrypoint and the integration tests build the exact same app.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
pub mod views;
