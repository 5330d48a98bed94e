//! Storage ports and adapters for SPM governance entities.
//!
//! Each entity (documents, policies, committees, audit, search) is reached
//! through an async trait. Two adapters implement every port:
//! - [`InMemoryGovernanceStore`]: the synthetic backend, seeded with demo data
//! - `postgres::PostgresGovernanceStore`: the live backend (`postgres` feature)
//!
//! Uploaded source files go through [`FileStoragePort`], implemented locally
//! by [`LocalFileStorage`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]
#![warn(rust_2018_idioms)]

mod audit;
mod error;
mod files;
mod fixtures;
pub mod memory;
mod model;
#[cfg(feature = "postgres")]
pub mod postgres;
mod search;
mod traits;

pub use audit::verify_chain;
pub use error::{StorageError, StorageResult};
pub use files::LocalFileStorage;
pub use fixtures::{seed_synthetic, SYNTHETIC_TENANT};
pub use memory::InMemoryGovernanceStore;
pub use model::{
    ApprovalUpdate, AuditAppend, AuditRecord, PublishOutcome, SearchEntity, SearchHit,
    StatusChange, StoredFile,
};
pub use traits::{
    AuditStore, CommitteeStore, DocumentVersionStore, FileStoragePort, PolicyStore, QueryWindow,
    SearchStore,
};
