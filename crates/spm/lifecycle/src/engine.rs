//! Version lifecycle engine.
//!
//! Creates derived versions (RAW -> PROCESSED -> DRAFT), moves versions through
//! review in place, and publishes them. Every mutation is checked against the
//! transition table before it reaches storage, and storage re-checks the
//! expected source status so concurrent writers cannot skip a state.

use crate::checksum::calculate_checksum;
use crate::diff::{self, VersionDiff};
use crate::error::{LifecycleError, Result};
use crate::timeline::{self, TimelineEntry, VersionStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spm_storage::{
    AuditAppend, AuditStore, DocumentVersionStore, FileStoragePort, PublishOutcome, StatusChange,
};
use spm_types::{
    version_label, ChangeType, ContentFormat, DocumentId, DocumentVersion, LifecycleStatus,
    TenantId, TransitionCheck, VersionId, VersionNumber,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Source file metadata attached to a RAW import.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceFile {
    pub url: Option<String>,
    pub name: Option<String>,
    pub file_type: Option<String>,
    #[serde(default)]
    pub size: u64,
}

/// Lifecycle engine over a document version store.
#[derive(Clone)]
pub struct VersionLifecycle {
    versions: Arc<dyn DocumentVersionStore>,
    audit: Option<Arc<dyn AuditStore>>,
    files: Option<Arc<dyn FileStoragePort>>,
}

impl VersionLifecycle {
    pub fn new(versions: Arc<dyn DocumentVersionStore>) -> Self {
        Self {
            versions,
            audit: None,
            files: None,
        }
    }

    /// Record every state change in `audit`.
    pub fn with_audit(mut self, audit: Arc<dyn AuditStore>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Enable [`VersionLifecycle::import_upload`].
    pub fn with_files(mut self, files: Arc<dyn FileStoragePort>) -> Self {
        self.files = Some(files);
        self
    }

    /// Create a RAW version for a new or existing document.
    ///
    /// Numbered as the next MAJOR after the document's latest version, or
    /// `1.0.0` for a new document.
    #[instrument(skip_all, fields(tenant = %tenant_id))]
    pub async fn import_raw(
        &self,
        tenant_id: &TenantId,
        document_id: Option<DocumentId>,
        source: SourceFile,
        created_by: &str,
    ) -> Result<DocumentVersion> {
        require("created_by", created_by)?;
        let document_id = document_id.unwrap_or_else(DocumentId::generate);
        let number = self
            .get_next_version_number(tenant_id, &document_id, ChangeType::Major)
            .await?;

        let mut version = new_version(
            tenant_id,
            document_id,
            number,
            ChangeType::Major,
            LifecycleStatus::Raw,
            String::new(),
            ContentFormat::PlainText,
            created_by,
        );
        version.file_size = source.size;
        version.source_file_url = source.url;
        version.source_file_name = source.name;
        version.source_file_type = source.file_type;

        self.versions.insert_version(version.clone()).await?;
        info!(
            document_id = %version.document_id,
            version_id = %version.id,
            version = %version.version_number,
            "imported raw version"
        );
        self.record(created_by, "version.imported", &version, None)
            .await;
        Ok(version)
    }

    /// Store uploaded bytes through the file port, then import them as RAW.
    /// The stored bytes are removed again when the import fails.
    #[instrument(skip_all, fields(tenant = %tenant_id, file_name = %file_name))]
    pub async fn import_upload(
        &self,
        tenant_id: &TenantId,
        document_id: Option<DocumentId>,
        file_name: &str,
        file_type: Option<&str>,
        bytes: &[u8],
        created_by: &str,
    ) -> Result<DocumentVersion> {
        let files = self
            .files
            .as_ref()
            .ok_or_else(|| LifecycleError::Unavailable("file storage not configured".to_string()))?;
        require("file_name", file_name)?;
        require("created_by", created_by)?;

        let document_id = document_id.unwrap_or_else(DocumentId::generate);
        let key = format!(
            "{tenant_id}/{document_id}/{}-{}",
            Utc::now().timestamp_millis(),
            file_name.replace(['/', '\\'], "_")
        );
        let stored = files.upload(&key, bytes, file_type).await?;

        let source = SourceFile {
            url: Some(stored.url),
            name: Some(file_name.to_string()),
            file_type: stored.content_type,
            size: stored.size,
        };
        let imported = self
            .import_raw(tenant_id, Some(document_id), source, created_by)
            .await;
        if imported.is_err() {
            // No version references the blob.
            if let Err(err) = files.delete(&key).await {
                warn!(key = %key, error = %err, "failed to remove orphaned upload");
            }
        }
        imported
    }

    /// Derive a PROCESSED markdown version from a RAW one.
    #[instrument(skip_all, fields(tenant = %tenant_id, version_id = %raw_version_id))]
    pub async fn process_to_markdown(
        &self,
        tenant_id: &TenantId,
        raw_version_id: &VersionId,
        processed_content: &str,
        processed_by: &str,
        notes: Option<String>,
    ) -> Result<DocumentVersion> {
        require("processed_by", processed_by)?;
        let source = self.load(tenant_id, raw_version_id).await?;
        ensure_transition(&source, LifecycleStatus::Processed)?;

        let number = self
            .get_next_version_number(tenant_id, &source.document_id, ChangeType::Minor)
            .await?;
        let mut version = new_version(
            tenant_id,
            source.document_id,
            number,
            ChangeType::Minor,
            LifecycleStatus::Processed,
            processed_content.to_string(),
            ContentFormat::Markdown,
            processed_by,
        );
        version.previous_version_id = Some(source.id);
        version.change_description = notes;
        inherit_source_file(&mut version, &source);

        self.insert_derived(version, &source, processed_by, "version.processed")
            .await
    }

    /// Derive a DRAFT version; content defaults to the source's.
    #[instrument(skip_all, fields(tenant = %tenant_id, version_id = %version_id))]
    pub async fn transition_to_draft(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        draft_content: Option<String>,
        transitioned_by: &str,
        change_description: Option<String>,
    ) -> Result<DocumentVersion> {
        require("transitioned_by", transitioned_by)?;
        let source = self.load(tenant_id, version_id).await?;
        ensure_transition(&source, LifecycleStatus::Draft)?;

        let number = self
            .get_next_version_number(tenant_id, &source.document_id, ChangeType::Minor)
            .await?;
        let content = draft_content.unwrap_or_else(|| source.content.clone());
        let mut version = new_version(
            tenant_id,
            source.document_id,
            number,
            ChangeType::Minor,
            LifecycleStatus::Draft,
            content,
            source.content_format,
            transitioned_by,
        );
        version.previous_version_id = Some(source.id);
        version.change_description = change_description;
        inherit_source_file(&mut version, &source);

        self.insert_derived(version, &source, transitioned_by, "version.drafted")
            .await
    }

    pub async fn submit_for_review(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        submitted_by: &str,
    ) -> Result<DocumentVersion> {
        require("submitted_by", submitted_by)?;
        let change = StatusChange::new(LifecycleStatus::UnderReview, submitted_by, Utc::now());
        self.transition(tenant_id, version_id, change, "version.submitted")
            .await
    }

    /// Approve in place, stamping approver and time.
    pub async fn approve(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        approved_by: &str,
        comments: Option<String>,
    ) -> Result<DocumentVersion> {
        require("approved_by", approved_by)?;
        let change = StatusChange::new(LifecycleStatus::Approved, approved_by, Utc::now())
            .with_approval(comments.filter(|c| !c.trim().is_empty()));
        self.transition(tenant_id, version_id, change, "version.approved")
            .await
    }

    /// Return a version to DRAFT in place; `reason` lands in `approval_comments`
    /// and any earlier approval stamp is cleared.
    pub async fn reject(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        rejected_by: &str,
        reason: &str,
    ) -> Result<DocumentVersion> {
        require("rejected_by", rejected_by)?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(LifecycleError::validation(
                "reason",
                "a rejection reason is required",
            ));
        }
        let change = StatusChange::new(LifecycleStatus::Draft, rejected_by, Utc::now())
            .with_rejection(reason);
        self.transition(tenant_id, version_id, change, "version.rejected")
            .await
    }

    /// Promote an APPROVED version to ACTIVE_FINAL, superseding the current
    /// holder in the same atomic step.
    #[instrument(skip_all, fields(tenant = %tenant_id, version_id = %version_id))]
    pub async fn publish_to_active(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        published_by: &str,
    ) -> Result<PublishOutcome> {
        require("published_by", published_by)?;
        let current = self.load(tenant_id, version_id).await?;
        ensure_transition(&current, LifecycleStatus::ActiveFinal)?;

        let outcome = self
            .versions
            .publish(
                tenant_id,
                version_id,
                current.lifecycle_status,
                published_by,
                Utc::now(),
            )
            .await?;

        info!(
            document_id = %outcome.published.document_id,
            version = %outcome.published.version_number,
            superseded = ?outcome.superseded.as_ref().map(|v| v.id),
            "published version"
        );
        if let Some(previous) = &outcome.superseded {
            self.record(
                published_by,
                "version.superseded",
                previous,
                Some(LifecycleStatus::ActiveFinal),
            )
            .await;
        }
        self.record(
            published_by,
            "version.published",
            &outcome.published,
            Some(current.lifecycle_status),
        )
        .await;
        Ok(outcome)
    }

    pub async fn archive(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        archived_by: &str,
    ) -> Result<DocumentVersion> {
        require("archived_by", archived_by)?;
        let change = StatusChange::new(LifecycleStatus::Archived, archived_by, Utc::now());
        self.transition(tenant_id, version_id, change, "version.archived")
            .await
    }

    /// Side-effect free legality check. Missing versions are reported as
    /// not allowed rather than as an error.
    pub async fn can_transition(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        new_status: LifecycleStatus,
    ) -> Result<TransitionCheck> {
        match self.versions.get_version(tenant_id, version_id).await? {
            Some(version) => Ok(version.lifecycle_status.check_transition(new_status)),
            None => Ok(TransitionCheck::denied(format!(
                "version {version_id} not found"
            ))),
        }
    }

    pub async fn compare_versions(
        &self,
        tenant_id: &TenantId,
        version_a: &VersionId,
        version_b: &VersionId,
    ) -> Result<VersionDiff> {
        let a = self.load(tenant_id, version_a).await?;
        let b = self.load(tenant_id, version_b).await?;
        Ok(diff::compare(&a, &b))
    }

    pub async fn get_timeline(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<Vec<TimelineEntry>> {
        let versions = self.load_document(tenant_id, document_id).await?;
        Ok(timeline::build_timeline(&versions))
    }

    pub async fn get_version_stats(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<VersionStats> {
        let versions = self.load_document(tenant_id, document_id).await?;
        Ok(timeline::build_stats(*document_id, &versions))
    }

    /// Latest version with `change_type` applied; `1.0.0` for a new document.
    pub async fn get_next_version_number(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
        change_type: ChangeType,
    ) -> Result<VersionNumber> {
        Ok(self
            .versions
            .latest_version(tenant_id, document_id)
            .await?
            .map(|latest| latest.version_number.bump(change_type))
            .unwrap_or_else(VersionNumber::initial))
    }

    pub fn calculate_checksum(&self, content: &str) -> String {
        calculate_checksum(content)
    }

    pub async fn get_version(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
    ) -> Result<DocumentVersion> {
        self.load(tenant_id, version_id).await
    }

    pub async fn list_versions(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<Vec<DocumentVersion>> {
        Ok(self.versions.list_versions(tenant_id, document_id).await?)
    }

    pub async fn get_active_version(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<Option<DocumentVersion>> {
        Ok(self.versions.active_version(tenant_id, document_id).await?)
    }

    async fn load(&self, tenant_id: &TenantId, version_id: &VersionId) -> Result<DocumentVersion> {
        self.versions
            .get_version(tenant_id, version_id)
            .await?
            .ok_or_else(|| LifecycleError::version_not_found(version_id))
    }

    async fn load_document(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> Result<Vec<DocumentVersion>> {
        let versions = self.versions.list_versions(tenant_id, document_id).await?;
        if versions.is_empty() {
            return Err(LifecycleError::NotFound(format!("document {document_id}")));
        }
        Ok(versions)
    }

    async fn transition(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        change: StatusChange,
        action: &str,
    ) -> Result<DocumentVersion> {
        let current = self.load(tenant_id, version_id).await?;
        ensure_transition(&current, change.to)?;

        let actor = change.actor.clone();
        let updated = self
            .versions
            .apply_transition(tenant_id, version_id, current.lifecycle_status, change)
            .await?;

        info!(
            tenant = %tenant_id,
            version_id = %version_id,
            from = %current.lifecycle_status,
            to = %updated.lifecycle_status,
            "version transitioned"
        );
        self.record(&actor, action, &updated, Some(current.lifecycle_status))
            .await;
        Ok(updated)
    }

    async fn insert_derived(
        &self,
        version: DocumentVersion,
        source: &DocumentVersion,
        actor: &str,
        action: &str,
    ) -> Result<DocumentVersion> {
        self.versions.insert_version(version.clone()).await?;
        info!(
            document_id = %version.document_id,
            source_version_id = %source.id,
            version_id = %version.id,
            version = %version.version_number,
            status = %version.lifecycle_status,
            "derived new version"
        );
        self.record(actor, action, &version, Some(source.lifecycle_status))
            .await;
        Ok(version)
    }

    /// Append an audit event. The lifecycle write has already committed, so a
    /// failure here is logged and not returned.
    async fn record(
        &self,
        actor: &str,
        action: &str,
        version: &DocumentVersion,
        from: Option<LifecycleStatus>,
    ) {
        let Some(audit) = &self.audit else {
            return;
        };
        let event = AuditAppend {
            tenant_id: version.tenant_id.clone(),
            timestamp: Utc::now(),
            actor: actor.to_string(),
            action: action.to_string(),
            entity_type: "document_version".to_string(),
            entity_id: version.id.to_string(),
            message: format!("{} -> {}", version.version_label, version.lifecycle_status),
            payload: serde_json::json!({
                "document_id": version.document_id,
                "version": version.version_number,
                "from": from,
                "to": version.lifecycle_status,
            }),
        };
        if let Err(err) = audit.append_audit(event).await {
            warn!(
                version_id = %version.id,
                action,
                error = %err,
                "failed to append audit event"
            );
        }
    }
}

fn ensure_transition(version: &DocumentVersion, to: LifecycleStatus) -> Result<()> {
    if version.lifecycle_status.can_transition_to(to) {
        Ok(())
    } else {
        Err(LifecycleError::InvalidTransition {
            version_id: version.id,
            from: version.lifecycle_status,
            to,
        })
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(LifecycleError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

fn inherit_source_file(version: &mut DocumentVersion, source: &DocumentVersion) {
    version.source_file_url = source.source_file_url.clone();
    version.source_file_name = source.source_file_name.clone();
    version.source_file_type = source.source_file_type.clone();
}

#[allow(clippy::too_many_arguments)]
fn new_version(
    tenant_id: &TenantId,
    document_id: DocumentId,
    number: VersionNumber,
    change_type: ChangeType,
    status: LifecycleStatus,
    content: String,
    content_format: ContentFormat,
    created_by: &str,
) -> DocumentVersion {
    let created_at: DateTime<Utc> = Utc::now();
    DocumentVersion {
        id: VersionId::generate(),
        document_id,
        tenant_id: tenant_id.clone(),
        version_label: version_label(&number, status),
        version_number: number,
        change_type,
        change_description: None,
        lifecycle_status: status,
        checksum: calculate_checksum(&content),
        file_size: content.len() as u64,
        content,
        content_format,
        previous_version_id: None,
        superseded_by: None,
        source_file_url: None,
        source_file_name: None,
        source_file_type: None,
        created_by: created_by.to_string(),
        created_at,
        modified_by: None,
        modified_at: None,
        approved_by: None,
        approved_at: None,
        approval_comments: None,
        published_by: None,
        published_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spm_storage::{AuditStore, InMemoryGovernanceStore, QueryWindow};

    fn engine() -> (VersionLifecycle, Arc<InMemoryGovernanceStore>) {
        let store = Arc::new(InMemoryGovernanceStore::new());
        let engine = VersionLifecycle::new(store.clone()).with_audit(store.clone());
        (engine, store)
    }

    fn source(name: &str) -> SourceFile {
        SourceFile {
            name: Some(name.to_string()),
            ..SourceFile::default()
        }
    }

    #[tokio::test]
    async fn raw_import_of_existing_document_bumps_major() {
        let (engine, _) = engine();
        let tenant = TenantId::new("t1");

        let first = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();
        let second = engine
            .import_raw(&tenant, Some(first.document_id), source("b.pdf"), "u1")
            .await
            .unwrap();

        assert_eq!(first.version_number.to_string(), "1.0.0");
        assert_eq!(second.version_number.to_string(), "2.0.0");
        assert_eq!(second.version_label, "v2.0.0 (Raw)");
    }

    #[tokio::test]
    async fn process_requires_raw_source() {
        let (engine, _) = engine();
        let tenant = TenantId::new("t1");
        let raw = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();
        let processed = engine
            .process_to_markdown(&tenant, &raw.id, "# A", "u1", None)
            .await
            .unwrap();

        let err = engine
            .process_to_markdown(&tenant, &processed.id, "# B", "u1", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: LifecycleStatus::Processed,
                to: LifecycleStatus::Processed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn draft_defaults_to_source_content() {
        let (engine, _) = engine();
        let tenant = TenantId::new("t1");
        let raw = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();
        let processed = engine
            .process_to_markdown(&tenant, &raw.id, "# A\nbody", "u1", Some("ocr".into()))
            .await
            .unwrap();

        let draft = engine
            .transition_to_draft(&tenant, &processed.id, None, "u2", Some("first pass".into()))
            .await
            .unwrap();
        assert_eq!(draft.content, processed.content);
        assert_eq!(draft.checksum, processed.checksum);
        assert_eq!(draft.version_number.to_string(), "1.2.0");
        assert_eq!(draft.previous_version_id, Some(processed.id));
        assert_eq!(draft.source_file_name.as_deref(), Some("a.pdf"));

        let override_draft = engine
            .transition_to_draft(&tenant, &processed.id, Some("# B".into()), "u2", None)
            .await
            .unwrap();
        assert_eq!(override_draft.content, "# B");
        assert_eq!(override_draft.version_number.to_string(), "1.3.0");
    }

    #[tokio::test]
    async fn review_cycle_and_rejection() {
        let (engine, _) = engine();
        let tenant = TenantId::new("t1");
        let raw = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();
        let processed = engine
            .process_to_markdown(&tenant, &raw.id, "# A", "u1", None)
            .await
            .unwrap();
        let draft = engine
            .transition_to_draft(&tenant, &processed.id, None, "u1", None)
            .await
            .unwrap();

        let reviewing = engine
            .submit_for_review(&tenant, &draft.id, "u1")
            .await
            .unwrap();
        assert_eq!(reviewing.lifecycle_status, LifecycleStatus::UnderReview);
        assert_eq!(reviewing.id, draft.id);

        let err = engine
            .reject(&tenant, &draft.id, "u2", "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation { .. }));

        let rejected = engine
            .reject(&tenant, &draft.id, "u2", "missing clawback terms")
            .await
            .unwrap();
        assert_eq!(rejected.lifecycle_status, LifecycleStatus::Draft);
        assert_eq!(
            rejected.approval_comments.as_deref(),
            Some("missing clawback terms")
        );

        engine
            .submit_for_review(&tenant, &draft.id, "u1")
            .await
            .unwrap();
        let approved = engine
            .approve(&tenant, &draft.id, "u3", Some("looks good".into()))
            .await
            .unwrap();
        assert_eq!(approved.approved_by.as_deref(), Some("u3"));
        assert!(approved.approved_at.is_some());
        assert_eq!(approved.approval_comments.as_deref(), Some("looks good"));
    }

    #[tokio::test]
    async fn rejecting_an_approval_clears_the_stamp() {
        let (engine, _) = engine();
        let tenant = TenantId::new("t1");
        let raw = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();
        let processed = engine
            .process_to_markdown(&tenant, &raw.id, "# A", "u1", None)
            .await
            .unwrap();
        let draft = engine
            .transition_to_draft(&tenant, &processed.id, None, "u1", None)
            .await
            .unwrap();
        engine
            .submit_for_review(&tenant, &draft.id, "u1")
            .await
            .unwrap();
        engine
            .approve(&tenant, &draft.id, "boss", Some("ship it".into()))
            .await
            .unwrap();

        let rejected = engine
            .reject(&tenant, &draft.id, "boss", "missing clawback terms")
            .await
            .unwrap();
        assert_eq!(rejected.lifecycle_status, LifecycleStatus::Draft);
        assert!(rejected.approved_by.is_none());
        assert!(rejected.approved_at.is_none());

        engine
            .submit_for_review(&tenant, &draft.id, "u1")
            .await
            .unwrap();
        let approved = engine
            .approve(&tenant, &draft.id, "boss", None)
            .await
            .unwrap();
        assert_eq!(approved.approved_by.as_deref(), Some("boss"));
        assert_eq!(approved.approval_comments, None);
    }

    #[tokio::test]
    async fn approve_requires_review() {
        let (engine, _) = engine();
        let tenant = TenantId::new("t1");
        let raw = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();

        let err = engine.approve(&tenant, &raw.id, "u1", None).await.unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn mutations_are_audited() {
        let (engine, store) = engine();
        let tenant = TenantId::new("t1");
        let raw = engine
            .import_raw(&tenant, None, source("a.pdf"), "u1")
            .await
            .unwrap();
        engine.archive(&tenant, &raw.id, "u1").await.unwrap();

        let events = store
            .list_audit(&tenant, QueryWindow::default())
            .await
            .unwrap();
        let actions: Vec<_> = events.iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, ["version.archived", "version.imported"]);
        assert_eq!(events[0].payload["from"], "RAW");
        assert_eq!(events[0].payload["to"], "ARCHIVED");
    }

    #[tokio::test]
    async fn upload_without_file_port_is_unavailable() {
        let (engine, _) = engine();
        let err = engine
            .import_upload(&TenantId::new("t1"), None, "a.pdf", None, b"x", "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Unavailable(_)));
    }
}
