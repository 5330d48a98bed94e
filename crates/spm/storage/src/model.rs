use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use spm_types::{DocumentVersion, LifecycleStatus, TenantId};

/// Effect of a status change on the approval fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ApprovalUpdate {
    /// Leave `approved_*` and `approval_comments` untouched.
    #[default]
    Keep,
    /// Stamp the actor as approver; `approval_comments` is replaced, also
    /// when `None`.
    Grant { comments: Option<String> },
    /// Clear `approved_*` and record the reason in `approval_comments`.
    Revoke { reason: String },
}

/// In-place status update applied to an existing version.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub to: LifecycleStatus,
    pub actor: String,
    pub at: DateTime<Utc>,
    pub approval: ApprovalUpdate,
}

impl StatusChange {
    pub fn new(to: LifecycleStatus, actor: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            to,
            actor: actor.into(),
            at,
            approval: ApprovalUpdate::Keep,
        }
    }

    pub fn with_approval(mut self, comments: Option<String>) -> Self {
        self.approval = ApprovalUpdate::Grant { comments };
        self
    }

    pub fn with_rejection(mut self, reason: impl Into<String>) -> Self {
        self.approval = ApprovalUpdate::Revoke {
            reason: reason.into(),
        };
        self
    }

    pub(crate) fn apply(&self, version: &mut DocumentVersion) {
        version.lifecycle_status = self.to;
        version.modified_by = Some(self.actor.clone());
        version.modified_at = Some(self.at);
        match &self.approval {
            ApprovalUpdate::Keep => {}
            ApprovalUpdate::Grant { comments } => {
                version.approved_by = Some(self.actor.clone());
                version.approved_at = Some(self.at);
                version.approval_comments = comments.clone();
            }
            ApprovalUpdate::Revoke { reason } => {
                version.approved_by = None;
                version.approved_at = None;
                version.approval_comments = Some(reason.clone());
            }
        }
    }
}

/// Result of an atomic publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub published: DocumentVersion,
    /// Previous ACTIVE_FINAL holder, now SUPERSEDED.
    pub superseded: Option<DocumentVersion>,
}

/// Audit append payload. Hashes and sequencing are assigned by storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditAppend {
    pub tenant_id: TenantId,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub message: String,
    #[serde(default)]
    pub payload: Value,
}

/// Persistent tamper-evident audit record. Chains are per tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_id: String,
    pub tenant_id: TenantId,
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub message: String,
    pub payload: Value,
    pub previous_hash: Option<String>,
    pub hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEntity {
    Document,
    Policy,
    Committee,
}

/// Cross-entity search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub entity: SearchEntity,
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

/// Metadata for a blob held by a file storage port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub key: String,
    pub url: String,
    pub size: u64,
    pub checksum: String,
    pub content_type: Option<String>,
    pub modified_at: DateTime<Utc>,
}
