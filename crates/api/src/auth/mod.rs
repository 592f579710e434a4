//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`session`] -- server-side session store and cookie helpers.
//! - [`gate`] -- credential check against the user table.

pub mod gate;
pub mod password;
pub mod session;
