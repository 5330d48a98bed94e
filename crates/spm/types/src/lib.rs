//! Domain types for the SPM governance core.
//!
//! - identifiers ([`TenantId`], [`DocumentId`], [`VersionId`], ...)
//! - the document version lifecycle ([`LifecycleStatus`]) and its transition table
//! - semantic version numbers ([`VersionNumber`]) and their increment rules
//! - governance records exposed through the provider ports

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod checksum;
mod document;
mod error;
mod governance;
mod ids;
mod lifecycle;
mod version;

pub use document::{version_label, ContentFormat, DocumentVersion};
pub use error::TypesError;
pub use governance::{
    Committee, CommitteeMember, CommitteeRole, DecisionThreshold, Policy, PolicyStatus,
};
pub use ids::{CommitteeId, DocumentId, PolicyId, TenantId, VersionId};
pub use lifecycle::{ChangeType, LifecycleStatus, TransitionCheck};
pub use version::VersionNumber;
