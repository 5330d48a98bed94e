//! Document version lifecycle for SPM governance.
//!
//! [`VersionLifecycle`] enforces the transition table from
//! [`spm_types::LifecycleStatus`] on every mutation, keeps the provenance chain
//! (`previous_version_id` / `superseded_by`) and content checksums, and
//! publishes versions atomically through the storage port.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod checksum;
mod diff;
mod engine;
mod error;
mod timeline;

pub use checksum::calculate_checksum;
pub use diff::VersionDiff;
pub use engine::{SourceFile, VersionLifecycle};
pub use error::{LifecycleError, Result};
pub use timeline::{TimelineEntry, VersionStats};
