//! Request extractors guarding protected routes.
//!
//! - [`session::SessionUser`] -- the logged-in user, or a redirect to `/login`.

pub mod session;
