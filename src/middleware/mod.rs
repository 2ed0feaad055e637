//! Router-level middleware.
//!
//! - `auth`: revocation / access / role gates (per matched route)
//! - `http`, `cors`, `security_headers`: transport concerns for every response

pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
