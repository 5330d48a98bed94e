//! Provider bindings for SPM entity ports.
//!
//! A [`BindingConfig`] names a [`BindingMode`] per [`Entity`]; the
//! [`ProviderRegistry`] turns that into port implementations on demand.
//!
//! ```no_run
//! # async fn demo() -> Result<(), spm_bindings::BindingError> {
//! use spm_bindings::ProviderRegistry;
//!
//! let registry = ProviderRegistry::from_env()?;
//! let documents = registry.documents().await?;
//! # let _ = documents;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod config;
mod diagnostics;
mod error;
mod registry;

pub use config::{
    BindingConfig, BindingMode, Entity, PoolSettings, ProviderModes, DATABASE_URL_VAR, MODE_VAR,
};
pub use diagnostics::BindingDiagnostics;
pub use error::{BindingError, BindingResult};
pub use registry::ProviderRegistry;
