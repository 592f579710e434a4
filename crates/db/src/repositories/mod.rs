//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that take
//! the pool as their first argument.

pub mod user_repo;

pub use user_repo::UserRepo;
