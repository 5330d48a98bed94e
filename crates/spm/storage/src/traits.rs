use crate::model::{
    AuditAppend, AuditRecord, PublishOutcome, SearchHit, StatusChange, StoredFile,
};
use crate::StorageResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spm_types::{
    Committee, CommitteeId, DocumentId, DocumentVersion, LifecycleStatus, Policy, PolicyId,
    TenantId, VersionId,
};

/// Generic query window for paged reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

/// Document port: immutable version records and their status fields.
///
/// Every id-keyed read filters by tenant; a record owned by another tenant
/// is reported as absent.
#[async_trait]
pub trait DocumentVersionStore: Send + Sync {
    /// Insert a new version. Fails with `Conflict` when the id or the
    /// `(document_id, version_number)` pair already exists.
    async fn insert_version(&self, version: DocumentVersion) -> StorageResult<()>;

    async fn get_version(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
    ) -> StorageResult<Option<DocumentVersion>>;

    /// All versions of a document ordered by version number ascending.
    async fn list_versions(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Vec<DocumentVersion>>;

    /// Update status fields if the version is still in `expected_from`.
    ///
    /// `change.to` must not be `ACTIVE_FINAL`; promotion goes through
    /// [`DocumentVersionStore::publish`].
    async fn apply_transition(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        expected_from: LifecycleStatus,
        change: StatusChange,
    ) -> StorageResult<DocumentVersion>;

    /// Demote the document's current ACTIVE_FINAL version (if any) and promote
    /// `version_id`, as one all-or-nothing unit.
    async fn publish(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        expected_from: LifecycleStatus,
        published_by: &str,
        published_at: DateTime<Utc>,
    ) -> StorageResult<PublishOutcome>;

    async fn latest_version(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Option<DocumentVersion>> {
        Ok(self.list_versions(tenant_id, document_id).await?.pop())
    }

    async fn active_version(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Option<DocumentVersion>> {
        Ok(self
            .list_versions(tenant_id, document_id)
            .await?
            .into_iter()
            .find(|v| v.lifecycle_status == LifecycleStatus::ActiveFinal))
    }
}

/// Policy port.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn upsert_policy(&self, policy: Policy) -> StorageResult<()>;
    async fn get_policy(
        &self,
        tenant_id: &TenantId,
        policy_id: &PolicyId,
    ) -> StorageResult<Option<Policy>>;
    async fn list_policies(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Policy>>;
}

/// Committee port.
#[async_trait]
pub trait CommitteeStore: Send + Sync {
    async fn upsert_committee(&self, committee: Committee) -> StorageResult<()>;
    async fn get_committee(
        &self,
        tenant_id: &TenantId,
        committee_id: &CommitteeId,
    ) -> StorageResult<Option<Committee>>;
    async fn list_committees(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Committee>>;
}

/// Append-only audit trail, hash-chained per tenant.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Append an event and return the canonical, hash-linked stored record.
    async fn append_audit(&self, event: AuditAppend) -> StorageResult<AuditRecord>;

    /// Read a tenant's events newest-first.
    async fn list_audit(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditRecord>>;

    /// Hash of the tenant's newest event, `None` before the first append.
    async fn latest_audit_hash(&self, tenant_id: &TenantId) -> StorageResult<Option<String>>;
}

/// Free-text search across documents, policies and committees.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Hits ordered by descending score; `limit == 0` means unbounded.
    async fn search(
        &self,
        tenant_id: &TenantId,
        query: &str,
        limit: usize,
    ) -> StorageResult<Vec<SearchHit>>;
}

/// Raw bytes storage for uploaded source files.
#[async_trait]
pub trait FileStoragePort: Send + Sync {
    async fn upload(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: Option<&str>,
    ) -> StorageResult<StoredFile>;
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;
    async fn checksum(&self, key: &str) -> StorageResult<String>;
    async fn exists(&self, key: &str) -> StorageResult<bool>;
    async fn metadata(&self, key: &str) -> StorageResult<StoredFile>;
    async fn delete(&self, key: &str) -> StorageResult<()>;
}
