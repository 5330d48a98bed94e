//! REST API over the lifecycle engine and provider registry

pub mod handlers;
pub mod router;
pub mod state;
