//! PostgreSQL adapter for the governance ports.
//!
//! Backs the `live` binding mode. Tenant isolation at the schema level is
//! configured through the connection string (`?schema=<name>` becomes the
//! session `search_path`); row-level isolation is enforced by filtering every
//! id-keyed statement on `tenant_id`.

use crate::audit::{compute_audit_hash, normalize_timestamp};
use crate::memory::document_title;
use crate::model::{
    ApprovalUpdate, AuditAppend, AuditRecord, PublishOutcome, SearchEntity, SearchHit,
    StatusChange,
};
use crate::search;
use crate::traits::{
    AuditStore, CommitteeStore, DocumentVersionStore, PolicyStore, QueryWindow, SearchStore,
};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spm_types::{
    ChangeType, Committee, CommitteeId, ContentFormat, DocumentId, DocumentVersion,
    LifecycleStatus, Policy, PolicyId, PolicyStatus, TenantId, VersionId, VersionNumber,
};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

const VERSION_COLUMNS: &str = "id, document_id, tenant_id, version_major, version_minor, \
    version_patch, version_label, change_type, change_description, lifecycle_status, content, \
    content_format, checksum, file_size, previous_version_id, superseded_by, source_file_url, \
    source_file_name, source_file_type, created_by, created_at, modified_by, modified_at, \
    approved_by, approved_at, approval_comments, published_by, published_at";

const POLICY_COLUMNS: &str = "id, tenant_id, code, title, category, status, effective_date, \
    summary, created_at, updated_at, additional_properties";

const COMMITTEE_COLUMNS: &str =
    "id, tenant_id, name, description, members, decision_threshold, quorum, created_at";

const AUDIT_COLUMNS: &str = "event_id, tenant_id, sequence, timestamp, actor, action, \
    entity_type, entity_id, message, payload, previous_hash, hash";

/// PostgreSQL-backed storage adapter.
#[derive(Clone)]
pub struct PostgresGovernanceStore {
    pool: PgPool,
}

impl PostgresGovernanceStore {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let (url, schema) = split_schema_param(database_url)?;
        let mut options = PgConnectOptions::from_str(&url)
            .map_err(|e| StorageError::InvalidInput(format!("invalid database url: {e}")))?;
        if let Some(schema) = &schema {
            options = options.options([("search_path", schema.as_str())]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Unavailable(format!("failed to connect postgres: {e}")))?;
        tracing::info!(schema = schema.as_deref().unwrap_or("public"), "connected to postgres");

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS spm_document_versions (
                id UUID PRIMARY KEY,
                document_id UUID NOT NULL,
                tenant_id TEXT NOT NULL,
                version_major BIGINT NOT NULL,
                version_minor BIGINT NOT NULL,
                version_patch BIGINT NOT NULL,
                version_label TEXT NOT NULL,
                change_type TEXT NOT NULL,
                change_description TEXT,
                lifecycle_status TEXT NOT NULL,
                content TEXT NOT NULL,
                content_format TEXT NOT NULL,
                checksum TEXT NOT NULL,
                file_size BIGINT NOT NULL,
                previous_version_id UUID,
                superseded_by UUID,
                source_file_url TEXT,
                source_file_name TEXT,
                source_file_type TEXT,
                created_by TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                modified_by TEXT,
                modified_at TIMESTAMPTZ,
                approved_by TEXT,
                approved_at TIMESTAMPTZ,
                approval_comments TEXT,
                published_by TEXT,
                published_at TIMESTAMPTZ,
                UNIQUE (document_id, version_major, version_minor, version_patch)
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS spm_document_versions_single_active
                ON spm_document_versions (document_id)
             WHERE lifecycle_status = 'ACTIVE_FINAL'
            "#,
            r#"
            CREATE INDEX IF NOT EXISTS spm_document_versions_tenant_document
                ON spm_document_versions (tenant_id, document_id)
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS spm_policies (
                id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                code TEXT NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                status TEXT NOT NULL,
                effective_date DATE,
                summary TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                additional_properties JSONB NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS spm_committees (
                id UUID PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                members JSONB NOT NULL,
                decision_threshold JSONB NOT NULL,
                quorum BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS spm_audit_events (
                event_id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                sequence BIGINT NOT NULL,
                timestamp TIMESTAMPTZ NOT NULL,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                message TEXT NOT NULL,
                payload JSONB NOT NULL,
                previous_hash TEXT,
                hash TEXT NOT NULL,
                UNIQUE (tenant_id, sequence)
            )
            "#,
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentVersionStore for PostgresGovernanceStore {
    async fn insert_version(&self, version: DocumentVersion) -> StorageResult<()> {
        if version.lifecycle_status == LifecycleStatus::ActiveFinal {
            return Err(StorageError::InvalidInput(
                "versions are promoted to ACTIVE_FINAL through publish".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(version.document_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        // A document belongs to the tenant that created it.
        let foreign = sqlx::query(
            "SELECT 1 FROM spm_document_versions \
              WHERE document_id = $1 AND tenant_id <> $2 LIMIT 1",
        )
        .bind(*version.document_id.as_uuid())
        .bind(version.tenant_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if foreign.is_some() {
            return Err(StorageError::NotFound(format!(
                "document {} not found",
                version.document_id
            )));
        }

        sqlx::query(&format!(
            "INSERT INTO spm_document_versions ({VERSION_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
              $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28)"
        ))
        .bind(*version.id.as_uuid())
        .bind(*version.document_id.as_uuid())
        .bind(version.tenant_id.as_str())
        .bind(to_i64(version.version_number.major())?)
        .bind(to_i64(version.version_number.minor())?)
        .bind(to_i64(version.version_number.patch())?)
        .bind(&version.version_label)
        .bind(version.change_type.as_str())
        .bind(&version.change_description)
        .bind(version.lifecycle_status.as_str())
        .bind(&version.content)
        .bind(version.content_format.as_str())
        .bind(&version.checksum)
        .bind(to_i64(version.file_size)?)
        .bind(version.previous_version_id.map(|id| *id.as_uuid()))
        .bind(version.superseded_by.map(|id| *id.as_uuid()))
        .bind(&version.source_file_url)
        .bind(&version.source_file_name)
        .bind(&version.source_file_type)
        .bind(&version.created_by)
        .bind(version.created_at)
        .bind(&version.modified_by)
        .bind(version.modified_at)
        .bind(&version.approved_by)
        .bind(version.approved_at)
        .bind(&version.approval_comments)
        .bind(&version.published_by)
        .bind(version.published_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        Ok(())
    }

    async fn get_version(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
    ) -> StorageResult<Option<DocumentVersion>> {
        let row = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM spm_document_versions WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(*version_id.as_uuid())
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(version_row_to_record).transpose()
    }

    async fn list_versions(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Vec<DocumentVersion>> {
        let rows = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM spm_document_versions \
              WHERE tenant_id = $1 AND document_id = $2 \
              ORDER BY version_major, version_minor, version_patch"
        ))
        .bind(tenant_id.as_str())
        .bind(*document_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(version_row_to_record).collect()
    }

    async fn latest_version(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Option<DocumentVersion>> {
        let row = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM spm_document_versions \
              WHERE tenant_id = $1 AND document_id = $2 \
              ORDER BY version_major DESC, version_minor DESC, version_patch DESC \
              LIMIT 1"
        ))
        .bind(tenant_id.as_str())
        .bind(*document_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(version_row_to_record).transpose()
    }

    async fn active_version(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Option<DocumentVersion>> {
        let row = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM spm_document_versions \
              WHERE tenant_id = $1 AND document_id = $2 AND lifecycle_status = 'ACTIVE_FINAL'"
        ))
        .bind(tenant_id.as_str())
        .bind(*document_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(version_row_to_record).transpose()
    }

    async fn apply_transition(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        expected_from: LifecycleStatus,
        change: StatusChange,
    ) -> StorageResult<DocumentVersion> {
        if change.to == LifecycleStatus::ActiveFinal {
            return Err(StorageError::InvalidInput(
                "versions are promoted to ACTIVE_FINAL through publish".to_string(),
            ));
        }

        let (approval_mode, approval_comments) = match &change.approval {
            ApprovalUpdate::Keep => ("keep", None),
            ApprovalUpdate::Grant { comments } => ("grant", comments.clone()),
            ApprovalUpdate::Revoke { reason } => ("revoke", Some(reason.clone())),
        };

        let row = sqlx::query(&format!(
            "UPDATE spm_document_versions \
                SET lifecycle_status = $1, \
                    modified_by = $2, \
                    modified_at = $3, \
                    approved_by = CASE $4 WHEN 'grant' THEN $2 \
                                          WHEN 'revoke' THEN NULL \
                                          ELSE approved_by END, \
                    approved_at = CASE $4 WHEN 'grant' THEN $3 \
                                          WHEN 'revoke' THEN NULL \
                                          ELSE approved_at END, \
                    approval_comments = CASE $4 WHEN 'keep' THEN approval_comments \
                                                ELSE $5 END \
              WHERE id = $6 AND tenant_id = $7 AND lifecycle_status = $8 \
          RETURNING {VERSION_COLUMNS}"
        ))
        .bind(change.to.as_str())
        .bind(&change.actor)
        .bind(change.at)
        .bind(approval_mode)
        .bind(approval_comments)
        .bind(*version_id.as_uuid())
        .bind(tenant_id.as_str())
        .bind(expected_from.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        match row {
            Some(row) => version_row_to_record(row),
            None => match self.get_version(tenant_id, version_id).await? {
                Some(current) => Err(StorageError::InvariantViolation(format!(
                    "version {version_id}: expected {expected_from}, found {}",
                    current.lifecycle_status
                ))),
                None => Err(StorageError::NotFound(format!(
                    "document version {version_id} not found"
                ))),
            },
        }
    }

    async fn publish(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        expected_from: LifecycleStatus,
        published_by: &str,
        published_at: DateTime<Utc>,
    ) -> StorageResult<PublishOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let target = sqlx::query(&format!(
            "SELECT {VERSION_COLUMNS} FROM spm_document_versions \
              WHERE id = $1 AND tenant_id = $2 FOR UPDATE"
        ))
        .bind(*version_id.as_uuid())
        .bind(tenant_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?
        .map(version_row_to_record)
        .transpose()?
        .ok_or_else(|| StorageError::NotFound(format!("document version {version_id} not found")))?;

        if target.lifecycle_status != expected_from {
            return Err(StorageError::InvariantViolation(format!(
                "version {version_id}: expected {expected_from}, found {}",
                target.lifecycle_status
            )));
        }

        // Serializes concurrent publishers of the same document.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(target.document_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let superseded = sqlx::query(&format!(
            "UPDATE spm_document_versions \
                SET lifecycle_status = 'SUPERSEDED', \
                    superseded_by = $1, \
                    modified_by = $2, \
                    modified_at = $3 \
              WHERE document_id = $4 AND tenant_id = $5 \
                AND lifecycle_status = 'ACTIVE_FINAL' AND id <> $1 \
          RETURNING {VERSION_COLUMNS}"
        ))
        .bind(*version_id.as_uuid())
        .bind(published_by)
        .bind(published_at)
        .bind(*target.document_id.as_uuid())
        .bind(tenant_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?
        .map(version_row_to_record)
        .transpose()?;

        let published = sqlx::query(&format!(
            "UPDATE spm_document_versions \
                SET lifecycle_status = 'ACTIVE_FINAL', \
                    published_by = $1, \
                    published_at = $2, \
                    modified_by = $1, \
                    modified_at = $2 \
              WHERE id = $3 \
          RETURNING {VERSION_COLUMNS}"
        ))
        .bind(published_by)
        .bind(published_at)
        .bind(*version_id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx)
        .and_then(version_row_to_record)?;

        tx.commit().await.map_err(map_sqlx)?;

        Ok(PublishOutcome {
            published,
            superseded,
        })
    }
}

#[async_trait]
impl PolicyStore for PostgresGovernanceStore {
    async fn upsert_policy(&self, policy: Policy) -> StorageResult<()> {
        let properties = serde_json::to_value(&policy.additional_properties)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let result = sqlx::query(&format!(
            "INSERT INTO spm_policies ({POLICY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE SET \
                code = EXCLUDED.code, \
                title = EXCLUDED.title, \
                category = EXCLUDED.category, \
                status = EXCLUDED.status, \
                effective_date = EXCLUDED.effective_date, \
                summary = EXCLUDED.summary, \
                updated_at = EXCLUDED.updated_at, \
                additional_properties = EXCLUDED.additional_properties \
             WHERE spm_policies.tenant_id = EXCLUDED.tenant_id"
        ))
        .bind(*policy.id.as_uuid())
        .bind(policy.tenant_id.as_str())
        .bind(&policy.code)
        .bind(&policy.title)
        .bind(&policy.category)
        .bind(policy_status_to_str(policy.status))
        .bind(policy.effective_date)
        .bind(&policy.summary)
        .bind(policy.created_at)
        .bind(policy.updated_at)
        .bind(properties)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "policy {} belongs to another tenant",
                policy.id
            )));
        }
        Ok(())
    }

    async fn get_policy(
        &self,
        tenant_id: &TenantId,
        policy_id: &PolicyId,
    ) -> StorageResult<Option<Policy>> {
        let row = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM spm_policies WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(*policy_id.as_uuid())
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(policy_row_to_record).transpose()
    }

    async fn list_policies(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Policy>> {
        let rows = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM spm_policies WHERE tenant_id = $1 \
              ORDER BY code LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id.as_str())
        .bind(limit_param(window)?)
        .bind(to_i64(window.offset as u64)?)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(policy_row_to_record).collect()
    }
}

#[async_trait]
impl CommitteeStore for PostgresGovernanceStore {
    async fn upsert_committee(&self, committee: Committee) -> StorageResult<()> {
        let members = serde_json::to_value(&committee.members)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let threshold = serde_json::to_value(committee.decision_threshold)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let result = sqlx::query(&format!(
            "INSERT INTO spm_committees ({COMMITTEE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                description = EXCLUDED.description, \
                members = EXCLUDED.members, \
                decision_threshold = EXCLUDED.decision_threshold, \
                quorum = EXCLUDED.quorum \
             WHERE spm_committees.tenant_id = EXCLUDED.tenant_id"
        ))
        .bind(*committee.id.as_uuid())
        .bind(committee.tenant_id.as_str())
        .bind(&committee.name)
        .bind(&committee.description)
        .bind(members)
        .bind(threshold)
        .bind(i64::from(committee.quorum))
        .bind(committee.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "committee {} belongs to another tenant",
                committee.id
            )));
        }
        Ok(())
    }

    async fn get_committee(
        &self,
        tenant_id: &TenantId,
        committee_id: &CommitteeId,
    ) -> StorageResult<Option<Committee>> {
        let row = sqlx::query(&format!(
            "SELECT {COMMITTEE_COLUMNS} FROM spm_committees WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(*committee_id.as_uuid())
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(committee_row_to_record).transpose()
    }

    async fn list_committees(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Committee>> {
        let rows = sqlx::query(&format!(
            "SELECT {COMMITTEE_COLUMNS} FROM spm_committees WHERE tenant_id = $1 \
              ORDER BY name LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id.as_str())
        .bind(limit_param(window)?)
        .bind(to_i64(window.offset as u64)?)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(committee_row_to_record).collect()
    }
}

#[async_trait]
impl AuditStore for PostgresGovernanceStore {
    async fn append_audit(&self, mut event: AuditAppend) -> StorageResult<AuditRecord> {
        normalize_timestamp(&mut event);
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // Chains are per tenant; lock only this tenant's chain head.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("audit:{}", event.tenant_id))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        let last = sqlx::query(
            "SELECT sequence, hash FROM spm_audit_events \
              WHERE tenant_id = $1 ORDER BY sequence DESC LIMIT 1",
        )
        .bind(event.tenant_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        let (sequence, previous_hash) = match last {
            Some(row) => {
                let seq: i64 = col(&row, "sequence")?;
                let prev: String = col(&row, "hash")?;
                (seq + 1, Some(prev))
            }
            None => (1_i64, None),
        };

        let hash = compute_audit_hash(&event, previous_hash.as_deref(), sequence as u64)?;
        let event_id = format!("audit-{}", Uuid::new_v4());

        sqlx::query(&format!(
            "INSERT INTO spm_audit_events ({AUDIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(&event_id)
        .bind(event.tenant_id.as_str())
        .bind(sequence)
        .bind(event.timestamp)
        .bind(&event.actor)
        .bind(&event.action)
        .bind(&event.entity_type)
        .bind(&event.entity_id)
        .bind(&event.message)
        .bind(&event.payload)
        .bind(&previous_hash)
        .bind(&hash)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;

        Ok(AuditRecord {
            event_id,
            tenant_id: event.tenant_id,
            sequence: sequence as u64,
            timestamp: event.timestamp,
            actor: event.actor,
            action: event.action,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            message: event.message,
            payload: event.payload,
            previous_hash,
            hash,
        })
    }

    async fn list_audit(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {AUDIT_COLUMNS} FROM spm_audit_events WHERE tenant_id = $1 \
              ORDER BY sequence DESC LIMIT $2 OFFSET $3"
        ))
        .bind(tenant_id.as_str())
        .bind(limit_param(window)?)
        .bind(to_i64(window.offset as u64)?)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(audit_row_to_record).collect()
    }

    async fn latest_audit_hash(&self, tenant_id: &TenantId) -> StorageResult<Option<String>> {
        let row = sqlx::query(
            "SELECT hash FROM spm_audit_events WHERE tenant_id = $1 \
              ORDER BY sequence DESC LIMIT 1",
        )
        .bind(tenant_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx)?;

        row.map(|r| col::<String>(&r, "hash")).transpose()
    }
}

#[async_trait]
impl SearchStore for PostgresGovernanceStore {
    async fn search(
        &self,
        tenant_id: &TenantId,
        query: &str,
        limit: usize,
    ) -> StorageResult<Vec<SearchHit>> {
        let terms = search::query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        let patterns = terms
            .iter()
            .map(|t| format!("%{}%", escape_like(t)))
            .collect::<Vec<_>>();
        let mut hits = Vec::new();

        let documents = sqlx::query(&format!(
            "SELECT DISTINCT ON (document_id) {VERSION_COLUMNS} FROM spm_document_versions \
              WHERE tenant_id = $1 \
                AND (content ILIKE ANY($2) OR source_file_name ILIKE ANY($2)) \
              ORDER BY document_id, (lifecycle_status = 'ACTIVE_FINAL') DESC, \
                       version_major DESC, version_minor DESC, version_patch DESC"
        ))
        .bind(tenant_id.as_str())
        .bind(&patterns)
        .fetch_all(&self.pool)
        .await;
        for row in tolerate_missing_table(documents, "spm_document_versions")? {
            let version = version_row_to_record(row)?;
            hits.extend(search::hit(
                SearchEntity::Document,
                version.document_id.to_string(),
                document_title(&version),
                &version.content,
                &terms,
            ));
        }

        let policies = sqlx::query(&format!(
            "SELECT {POLICY_COLUMNS} FROM spm_policies \
              WHERE tenant_id = $1 \
                AND (title ILIKE ANY($2) OR summary ILIKE ANY($2) OR code ILIKE ANY($2))"
        ))
        .bind(tenant_id.as_str())
        .bind(&patterns)
        .fetch_all(&self.pool)
        .await;
        for row in tolerate_missing_table(policies, "spm_policies")? {
            let policy = policy_row_to_record(row)?;
            let body = format!("{}\n{}\n{}", policy.code, policy.category, policy.summary);
            hits.extend(search::hit(
                SearchEntity::Policy,
                policy.id.to_string(),
                policy.title,
                &body,
                &terms,
            ));
        }

        let committees = sqlx::query(&format!(
            "SELECT {COMMITTEE_COLUMNS} FROM spm_committees \
              WHERE tenant_id = $1 AND (name ILIKE ANY($2) OR description ILIKE ANY($2))"
        ))
        .bind(tenant_id.as_str())
        .bind(&patterns)
        .fetch_all(&self.pool)
        .await;
        for row in tolerate_missing_table(committees, "spm_committees")? {
            let committee = committee_row_to_record(row)?;
            hits.extend(search::hit(
                SearchEntity::Committee,
                committee.id.to_string(),
                committee.name,
                &committee.description,
                &terms,
            ));
        }

        Ok(search::rank(hits, limit))
    }
}

/// Split a `schema=<name>` parameter off a connection string.
///
/// Returns the URL without the parameter and the schema name, if any.
pub fn split_schema_param(database_url: &str) -> StorageResult<(String, Option<String>)> {
    let mut url = Url::parse(database_url)
        .map_err(|e| StorageError::InvalidInput(format!("invalid database url: {e}")))?;

    let mut schema = None;
    let retained = url
        .query_pairs()
        .filter_map(|(key, value)| {
            if key == "schema" {
                schema = Some(value.into_owned());
                None
            } else {
                Some((key.into_owned(), value.into_owned()))
            }
        })
        .collect::<Vec<_>>();

    if retained.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(retained);
    }
    Ok((url.to_string(), schema.filter(|s| !s.is_empty())))
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> StorageResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| StorageError::Backend(format!("column `{name}`: {e}")))
}

fn version_row_to_record(row: PgRow) -> StorageResult<DocumentVersion> {
    let status: String = col(&row, "lifecycle_status")?;
    let change_type: String = col(&row, "change_type")?;
    let content_format: String = col(&row, "content_format")?;

    Ok(DocumentVersion {
        id: VersionId::from_uuid(col(&row, "id")?),
        document_id: DocumentId::from_uuid(col(&row, "document_id")?),
        tenant_id: TenantId::new(col::<String>(&row, "tenant_id")?),
        version_number: VersionNumber::new(
            to_u64(col(&row, "version_major")?)?,
            to_u64(col(&row, "version_minor")?)?,
            to_u64(col(&row, "version_patch")?)?,
        ),
        version_label: col(&row, "version_label")?,
        change_type: ChangeType::from_str(&change_type)
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        change_description: col(&row, "change_description")?,
        lifecycle_status: LifecycleStatus::from_str(&status)
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        content: col(&row, "content")?,
        content_format: parse_content_format(&content_format)?,
        checksum: col(&row, "checksum")?,
        file_size: to_u64(col(&row, "file_size")?)?,
        previous_version_id: col::<Option<Uuid>>(&row, "previous_version_id")?
            .map(VersionId::from_uuid),
        superseded_by: col::<Option<Uuid>>(&row, "superseded_by")?.map(VersionId::from_uuid),
        source_file_url: col(&row, "source_file_url")?,
        source_file_name: col(&row, "source_file_name")?,
        source_file_type: col(&row, "source_file_type")?,
        created_by: col(&row, "created_by")?,
        created_at: col(&row, "created_at")?,
        modified_by: col(&row, "modified_by")?,
        modified_at: col(&row, "modified_at")?,
        approved_by: col(&row, "approved_by")?,
        approved_at: col(&row, "approved_at")?,
        approval_comments: col(&row, "approval_comments")?,
        published_by: col(&row, "published_by")?,
        published_at: col(&row, "published_at")?,
    })
}

fn policy_row_to_record(row: PgRow) -> StorageResult<Policy> {
    let status: String = col(&row, "status")?;
    let properties: serde_json::Value = col(&row, "additional_properties")?;

    Ok(Policy {
        id: PolicyId::from_uuid(col(&row, "id")?),
        tenant_id: TenantId::new(col::<String>(&row, "tenant_id")?),
        code: col(&row, "code")?,
        title: col(&row, "title")?,
        category: col(&row, "category")?,
        status: parse_policy_status(&status)?,
        effective_date: col(&row, "effective_date")?,
        summary: col(&row, "summary")?,
        created_at: col(&row, "created_at")?,
        updated_at: col(&row, "updated_at")?,
        additional_properties: serde_json::from_value(properties)
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
    })
}

fn committee_row_to_record(row: PgRow) -> StorageResult<Committee> {
    let members: serde_json::Value = col(&row, "members")?;
    let threshold: serde_json::Value = col(&row, "decision_threshold")?;
    let quorum: i64 = col(&row, "quorum")?;

    Ok(Committee {
        id: CommitteeId::from_uuid(col(&row, "id")?),
        tenant_id: TenantId::new(col::<String>(&row, "tenant_id")?),
        name: col(&row, "name")?,
        description: col(&row, "description")?,
        members: serde_json::from_value(members)
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        decision_threshold: serde_json::from_value(threshold)
            .map_err(|e| StorageError::Serialization(e.to_string()))?,
        quorum: u32::try_from(quorum)
            .map_err(|_| StorageError::Serialization(format!("quorum {quorum} out of range")))?,
        created_at: col(&row, "created_at")?,
    })
}

fn audit_row_to_record(row: PgRow) -> StorageResult<AuditRecord> {
    Ok(AuditRecord {
        event_id: col(&row, "event_id")?,
        tenant_id: TenantId::new(col::<String>(&row, "tenant_id")?),
        sequence: to_u64(col(&row, "sequence")?)?,
        timestamp: col(&row, "timestamp")?,
        actor: col(&row, "actor")?,
        action: col(&row, "action")?,
        entity_type: col(&row, "entity_type")?,
        entity_id: col(&row, "entity_id")?,
        message: col(&row, "message")?,
        payload: col(&row, "payload")?,
        previous_hash: col(&row, "previous_hash")?,
        hash: col(&row, "hash")?,
    })
}

fn parse_content_format(raw: &str) -> StorageResult<ContentFormat> {
    match raw {
        "plain_text" => Ok(ContentFormat::PlainText),
        "markdown" => Ok(ContentFormat::Markdown),
        _ => Err(StorageError::Serialization(format!(
            "unknown content format `{raw}`"
        ))),
    }
}

fn policy_status_to_str(status: PolicyStatus) -> &'static str {
    match status {
        PolicyStatus::Draft => "draft",
        PolicyStatus::Active => "active",
        PolicyStatus::Retired => "retired",
    }
}

fn parse_policy_status(raw: &str) -> StorageResult<PolicyStatus> {
    match raw {
        "draft" => Ok(PolicyStatus::Draft),
        "active" => Ok(PolicyStatus::Active),
        "retired" => Ok(PolicyStatus::Retired),
        _ => Err(StorageError::Serialization(format!(
            "unknown policy status `{raw}`"
        ))),
    }
}

/// Entity tables may legitimately be absent in a deployment; search treats
/// that as no hits.
fn tolerate_missing_table(
    result: Result<Vec<PgRow>, sqlx::Error>,
    table: &str,
) -> StorageResult<Vec<PgRow>> {
    match result {
        Ok(rows) => Ok(rows),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("42P01") => {
            tracing::warn!(table, "search skipped missing table");
            Ok(Vec::new())
        }
        Err(err) => Err(map_sqlx(err)),
    }
}

fn map_sqlx(err: sqlx::Error) -> StorageError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StorageError::Conflict(db_err.message().to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(err.to_string())
        }
        _ => StorageError::Backend(err.to_string()),
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `LIMIT NULL` reads everything.
fn limit_param(window: QueryWindow) -> StorageResult<Option<i64>> {
    if window.limit == 0 {
        Ok(None)
    } else {
        to_i64(window.limit as u64).map(Some)
    }
}

fn to_i64(value: u64) -> StorageResult<i64> {
    i64::try_from(value).map_err(|_| StorageError::InvalidInput(format!("{value} out of range")))
}

fn to_u64(value: i64) -> StorageResult<u64> {
    u64::try_from(value)
        .map_err(|_| StorageError::Serialization(format!("negative value {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_param_is_split_from_url() {
        let (url, schema) =
            split_schema_param("postgres://u:p@db:5432/spm?schema=tenant_a&sslmode=require")
                .unwrap();
        assert_eq!(url, "postgres://u:p@db:5432/spm?sslmode=require");
        assert_eq!(schema.as_deref(), Some("tenant_a"));

        let (url, schema) = split_schema_param("postgres://db/spm?schema=x").unwrap();
        assert_eq!(url, "postgres://db/spm");
        assert_eq!(schema.as_deref(), Some("x"));

        let (_, schema) = split_schema_param("postgres://db/spm").unwrap();
        assert!(schema.is_none());
    }

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    }
}
