//! SPM daemon library
//!
//! REST surface over the document version lifecycle engine and the provider
//! registry that binds each governance entity to a backend.

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use api::rest::state::AppState;
pub use config::DaemonConfig;
pub use error::{ApiError, DaemonError};
pub use server::Server;
