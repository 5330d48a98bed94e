//! Application state for API handlers

use crate::error::ApiResult;
use spm_bindings::ProviderRegistry;
use spm_lifecycle::VersionLifecycle;
use spm_storage::FileStoragePort;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Entity port resolution
    pub registry: Arc<ProviderRegistry>,

    /// Storage for uploaded source files
    pub files: Arc<dyn FileStoragePort>,

    /// Daemon version
    pub version: String,

    /// Daemon start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(registry: Arc<ProviderRegistry>, files: Arc<dyn FileStoragePort>) -> Self {
        Self {
            registry,
            files,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Lifecycle engine wired to the currently bound document and audit ports.
    pub async fn lifecycle(&self) -> ApiResult<VersionLifecycle> {
        let documents = self.registry.documents().await?;
        let audit = self.registry.audit().await?;
        Ok(VersionLifecycle::new(documents)
            .with_audit(audit)
            .with_files(Arc::clone(&self.files)))
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
