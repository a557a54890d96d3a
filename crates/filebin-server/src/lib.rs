//! filebin HTTP server
//!
//! Translates HTTP requests into [`filebin_registry::Registry`] operations:
//! multipart uploads, listings, long-poll change events, inline and
//! attachment downloads, and deletes behind a shared basic-auth credential.

pub mod auth;
pub mod config;
pub mod error;
pub mod mimetype;
pub mod server;

pub use auth::AuthUser;
pub use config::{Credentials, ServerConfig};
pub use error::{AppError, Result, ServerError};
pub use server::{create_router, start_server, AppState, SharedState};
