//! Read-only views over a document's version history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spm_types::{ChangeType, DocumentId, DocumentVersion, LifecycleStatus, VersionId, VersionNumber};
use std::collections::BTreeMap;

/// One step of a document's history, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub version_id: VersionId,
    pub version_number: VersionNumber,
    pub version_label: String,
    pub status: LifecycleStatus,
    pub change_type: ChangeType,
    pub summary: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub previous_version_id: Option<VersionId>,
}

/// Aggregate counts for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionStats {
    pub document_id: DocumentId,
    pub total_versions: usize,
    pub by_status: BTreeMap<LifecycleStatus, usize>,
    pub latest_version: Option<VersionNumber>,
    pub active_version: Option<VersionNumber>,
    pub first_created_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
}

/// `versions` must already be ordered by version number.
pub(crate) fn build_timeline(versions: &[DocumentVersion]) -> Vec<TimelineEntry> {
    versions
        .iter()
        .map(|v| TimelineEntry {
            version_id: v.id,
            version_number: v.version_number.clone(),
            version_label: v.version_label.clone(),
            status: v.lifecycle_status,
            change_type: v.change_type,
            summary: summarize(v),
            actor: v.last_actor().to_string(),
            timestamp: v.last_modified_at(),
            previous_version_id: v.previous_version_id,
        })
        .collect()
}

fn summarize(v: &DocumentVersion) -> String {
    let base = match v.lifecycle_status {
        LifecycleStatus::Raw => format!(
            "Imported {}",
            v.source_file_name.as_deref().unwrap_or("source file")
        ),
        LifecycleStatus::Processed => format!("Processed to markdown ({} lines)", v.line_count()),
        LifecycleStatus::Draft => match &v.approval_comments {
            Some(reason) => format!("Returned to draft: {reason}"),
            _ => "Draft created".to_string(),
        },
        LifecycleStatus::UnderReview => format!("Submitted for review by {}", v.last_actor()),
        LifecycleStatus::Approved => format!(
            "Approved by {}",
            v.approved_by.as_deref().unwrap_or(v.last_actor())
        ),
        LifecycleStatus::ActiveFinal => format!(
            "Published by {}",
            v.published_by.as_deref().unwrap_or(v.last_actor())
        ),
        LifecycleStatus::Superseded => match v.superseded_by {
            Some(next) => format!("Superseded by {next}"),
            None => "Superseded".to_string(),
        },
        LifecycleStatus::Archived => format!("Archived by {}", v.last_actor()),
    };
    match &v.change_description {
        Some(notes) if !notes.is_empty() => format!("{base} - {notes}"),
        _ => base,
    }
}

pub(crate) fn build_stats(document_id: DocumentId, versions: &[DocumentVersion]) -> VersionStats {
    let mut by_status = BTreeMap::new();
    for v in versions {
        *by_status.entry(v.lifecycle_status).or_insert(0) += 1;
    }

    VersionStats {
        document_id,
        total_versions: versions.len(),
        by_status,
        latest_version: versions.iter().map(|v| &v.version_number).max().cloned(),
        active_version: versions
            .iter()
            .find(|v| v.lifecycle_status == LifecycleStatus::ActiveFinal)
            .map(|v| v.version_number.clone()),
        first_created_at: versions.iter().map(|v| v.created_at).min(),
        last_modified_at: versions.iter().map(|v| v.last_modified_at()).max(),
    }
}
