//! HTTP surface of KeepNote.
//!
//! # Responsibility
//! - Map REST routes onto `keepnote_core` services.
//! - Authenticate callers by bearer token and scope every call to them.
//! - Render core errors as JSON bodies with stable status codes.

pub mod auth;
pub mod config;
pub mod error;
pub mod rest;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use rest::create_router;
pub use state::AppState;
