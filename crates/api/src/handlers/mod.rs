//! Axum handlers, one module per resource.

pub mod auth;
pub mod downloads;
pub mod pages;
pub mod pose;
