use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChangeType, DocumentId, LifecycleStatus, TenantId, VersionId, VersionNumber};

/// Encoding of a version's text payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    PlainText,
    Markdown,
}

impl ContentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentFormat::PlainText => "plain_text",
            ContentFormat::Markdown => "markdown",
        }
    }
}

/// Immutable snapshot of a document at one point in its lifecycle.
///
/// Content fields are written once. Only the status-transition fields
/// (status, modifier, approver, publisher, supersession) change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: VersionId,
    pub document_id: DocumentId,
    pub tenant_id: TenantId,

    pub version_number: VersionNumber,
    pub version_label: String,
    pub change_type: ChangeType,
    #[serde(default)]
    pub change_description: Option<String>,

    pub lifecycle_status: LifecycleStatus,

    pub content: String,
    pub content_format: ContentFormat,
    pub checksum: String,
    pub file_size: u64,

    pub previous_version_id: Option<VersionId>,
    pub superseded_by: Option<VersionId>,
    pub source_file_url: Option<String>,
    pub source_file_name: Option<String>,
    pub source_file_type: Option<String>,

    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub modified_by: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_comments: Option<String>,
    pub published_by: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

impl DocumentVersion {
    /// Most recent actor to touch this version.
    pub fn last_actor(&self) -> &str {
        self.modified_by.as_deref().unwrap_or(&self.created_by)
    }

    /// Most recent change time.
    pub fn last_modified_at(&self) -> DateTime<Utc> {
        self.modified_at.unwrap_or(self.created_at)
    }

    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// Human-readable label such as `v1.1.0 (Processed)`, naming the stage the
/// version was created in.
pub fn version_label(number: &VersionNumber, status: LifecycleStatus) -> String {
    format!("v{number} ({})", status.display_name())
}
