//! In-memory implementation of the governance ports.
//!
//! Backs the `synthetic` binding mode. Deterministic and test-friendly;
//! contents live for the lifetime of the process.

use crate::audit::{compute_audit_hash, normalize_timestamp};
use crate::model::{
    AuditAppend, AuditRecord, PublishOutcome, SearchEntity, SearchHit, StatusChange,
};
use crate::search;
use crate::traits::{
    AuditStore, CommitteeStore, DocumentVersionStore, PolicyStore, QueryWindow, SearchStore,
};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spm_types::{
    Committee, CommitteeId, DocumentId, DocumentVersion, LifecycleStatus, Policy, PolicyId,
    TenantId, VersionId,
};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory governance storage adapter.
#[derive(Default)]
pub struct InMemoryGovernanceStore {
    versions: RwLock<HashMap<VersionId, DocumentVersion>>,
    policies: RwLock<HashMap<PolicyId, Policy>>,
    committees: RwLock<HashMap<CommitteeId, Committee>>,
    audits: RwLock<HashMap<TenantId, Vec<AuditRecord>>>,
}

impl InMemoryGovernanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(what: &str) -> StorageError {
    StorageError::Backend(format!("{what} lock poisoned"))
}

fn owned_by<'a>(
    map: &'a HashMap<VersionId, DocumentVersion>,
    tenant_id: &TenantId,
    version_id: &VersionId,
) -> Option<&'a DocumentVersion> {
    map.get(version_id).filter(|v| &v.tenant_id == tenant_id)
}

fn version_not_found(version_id: &VersionId) -> StorageError {
    StorageError::NotFound(format!("document version {version_id} not found"))
}

#[async_trait]
impl DocumentVersionStore for InMemoryGovernanceStore {
    async fn insert_version(&self, version: DocumentVersion) -> StorageResult<()> {
        let mut guard = self.versions.write().map_err(|_| poisoned("versions"))?;

        if guard.contains_key(&version.id) {
            return Err(StorageError::Conflict(format!(
                "document version {} already exists",
                version.id
            )));
        }
        if guard
            .values()
            .any(|v| v.document_id == version.document_id && v.tenant_id != version.tenant_id)
        {
            return Err(StorageError::NotFound(format!(
                "document {} not found",
                version.document_id
            )));
        }
        if guard.values().any(|v| {
            v.document_id == version.document_id && v.version_number == version.version_number
        }) {
            return Err(StorageError::Conflict(format!(
                "document {} already has version {}",
                version.document_id, version.version_number
            )));
        }
        if version.lifecycle_status == LifecycleStatus::ActiveFinal {
            return Err(StorageError::InvalidInput(
                "versions are promoted to ACTIVE_FINAL through publish".to_string(),
            ));
        }

        guard.insert(version.id, version);
        Ok(())
    }

    async fn get_version(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
    ) -> StorageResult<Option<DocumentVersion>> {
        let guard = self.versions.read().map_err(|_| poisoned("versions"))?;
        Ok(owned_by(&guard, tenant_id, version_id).cloned())
    }

    async fn list_versions(
        &self,
        tenant_id: &TenantId,
        document_id: &DocumentId,
    ) -> StorageResult<Vec<DocumentVersion>> {
        let guard = self.versions.read().map_err(|_| poisoned("versions"))?;
        let mut values = guard
            .values()
            .filter(|v| &v.tenant_id == tenant_id && &v.document_id == document_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.version_number.cmp(&b.version_number));
        Ok(values)
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

        let mut guard = self.versions.write().map_err(|_| poisoned("versions"))?;
        let record = guard
            .get_mut(version_id)
            .filter(|v| &v.tenant_id == tenant_id)
            .ok_or_else(|| version_not_found(version_id))?;

        if record.lifecycle_status != expected_from {
            return Err(StorageError::InvariantViolation(format!(
                "version {version_id}: expected {expected_from}, found {}",
                record.lifecycle_status
            )));
        }

        change.apply(record);
        Ok(record.clone())
    }

    async fn publish(
        &self,
        tenant_id: &TenantId,
        version_id: &VersionId,
        expected_from: LifecycleStatus,
        published_by: &str,
        published_at: DateTime<Utc>,
    ) -> StorageResult<PublishOutcome> {
        // One write guard spans demotion and promotion.
        let mut guard = self.versions.write().map_err(|_| poisoned("versions"))?;

        let target = owned_by(&guard, tenant_id, version_id)
            .ok_or_else(|| version_not_found(version_id))?;
        if target.lifecycle_status != expected_from {
            return Err(StorageError::InvariantViolation(format!(
                "version {version_id}: expected {expected_from}, found {}",
                target.lifecycle_status
            )));
        }
        let document_id = target.document_id;

        let previous_id = guard
            .values()
            .find(|v| {
                v.document_id == document_id
                    && v.id != *version_id
                    && v.lifecycle_status == LifecycleStatus::ActiveFinal
            })
            .map(|v| v.id);

        let superseded = match previous_id.and_then(|id| guard.get_mut(&id)) {
            Some(previous) => {
                previous.lifecycle_status = LifecycleStatus::Superseded;
                previous.superseded_by = Some(*version_id);
                previous.modified_by = Some(published_by.to_string());
                previous.modified_at = Some(published_at);
                Some(previous.clone())
            }
            None => None,
        };

        let published = guard
            .get_mut(version_id)
            .ok_or_else(|| version_not_found(version_id))?;
        published.lifecycle_status = LifecycleStatus::ActiveFinal;
        published.published_by = Some(published_by.to_string());
        published.published_at = Some(published_at);
        published.modified_by = Some(published_by.to_string());
        published.modified_at = Some(published_at);

        Ok(PublishOutcome {
            published: published.clone(),
            superseded,
        })
    }
}

#[async_trait]
impl PolicyStore for InMemoryGovernanceStore {
    async fn upsert_policy(&self, policy: Policy) -> StorageResult<()> {
        let mut guard = self.policies.write().map_err(|_| poisoned("policies"))?;
        if let Some(existing) = guard.get(&policy.id) {
            if existing.tenant_id != policy.tenant_id {
                return Err(StorageError::Conflict(format!(
                    "policy {} belongs to another tenant",
                    policy.id
                )));
            }
        }
        guard.insert(policy.id, policy);
        Ok(())
    }

    async fn get_policy(
        &self,
        tenant_id: &TenantId,
        policy_id: &PolicyId,
    ) -> StorageResult<Option<Policy>> {
        let guard = self.policies.read().map_err(|_| poisoned("policies"))?;
        Ok(guard
            .get(policy_id)
            .filter(|p| &p.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_policies(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Policy>> {
        let guard = self.policies.read().map_err(|_| poisoned("policies"))?;
        let mut values = guard
            .values()
            .filter(|p| &p.tenant_id == tenant_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(apply_window(values, window))
    }
}

#[async_trait]
impl CommitteeStore for InMemoryGovernanceStore {
    async fn upsert_committee(&self, committee: Committee) -> StorageResult<()> {
        let mut guard = self.committees.write().map_err(|_| poisoned("committees"))?;
        if let Some(existing) = guard.get(&committee.id) {
            if existing.tenant_id != committee.tenant_id {
                return Err(StorageError::Conflict(format!(
                    "committee {} belongs to another tenant",
                    committee.id
                )));
            }
        }
        guard.insert(committee.id, committee);
        Ok(())
    }

    async fn get_committee(
        &self,
        tenant_id: &TenantId,
        committee_id: &CommitteeId,
    ) -> StorageResult<Option<Committee>> {
        let guard = self.committees.read().map_err(|_| poisoned("committees"))?;
        Ok(guard
            .get(committee_id)
            .filter(|c| &c.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_committees(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<Committee>> {
        let guard = self.committees.read().map_err(|_| poisoned("committees"))?;
        let mut values = guard
            .values()
            .filter(|c| &c.tenant_id == tenant_id)
            .cloned()
            .collect::<Vec<_>>();
        values.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apply_window(values, window))
    }
}

#[async_trait]
impl AuditStore for InMemoryGovernanceStore {
    async fn append_audit(&self, mut event: AuditAppend) -> StorageResult<AuditRecord> {
        normalize_timestamp(&mut event);
        let mut guard = self.audits.write().map_err(|_| poisoned("audit"))?;
        let chain = guard.entry(event.tenant_id.clone()).or_default();

        let previous_hash = chain.last().map(|e| e.hash.clone());
        let sequence = chain.len() as u64 + 1;
        let hash = compute_audit_hash(&event, previous_hash.as_deref(), sequence)?;

        let record = AuditRecord {
            event_id: format!("audit-{}", Uuid::new_v4()),
            tenant_id: event.tenant_id,
            sequence,
            timestamp: event.timestamp,
            actor: event.actor,
            action: event.action,
            entity_type: event.entity_type,
            entity_id: event.entity_id,
            message: event.message,
            payload: event.payload,
            previous_hash,
            hash,
        };

        chain.push(record.clone());
        Ok(record)
    }

    async fn list_audit(
        &self,
        tenant_id: &TenantId,
        window: QueryWindow,
    ) -> StorageResult<Vec<AuditRecord>> {
        let guard = self.audits.read().map_err(|_| poisoned("audit"))?;
        let mut values = guard.get(tenant_id).cloned().unwrap_or_default();
        values.sort_by(|a, b| b.sequence.cmp(&a.sequence));
        Ok(apply_window(values, window))
    }

    async fn latest_audit_hash(&self, tenant_id: &TenantId) -> StorageResult<Option<String>> {
        let guard = self.audits.read().map_err(|_| poisoned("audit"))?;
        Ok(guard
            .get(tenant_id)
            .and_then(|chain| chain.last())
            .map(|e| e.hash.clone()))
    }
}

#[async_trait]
impl SearchStore for InMemoryGovernanceStore {
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
        let mut hits = Vec::new();

        {
            let guard = self.versions.read().map_err(|_| poisoned("versions"))?;
            let mut representative: HashMap<DocumentId, &DocumentVersion> = HashMap::new();
            for version in guard.values().filter(|v| &v.tenant_id == tenant_id) {
                representative
                    .entry(version.document_id)
                    .and_modify(|current| {
                        if prefer_for_search(version, current) {
                            *current = version;
                        }
                    })
                    .or_insert(version);
            }
            hits.extend(representative.into_values().filter_map(|v| {
                search::hit(
                    SearchEntity::Document,
                    v.document_id.to_string(),
                    document_title(v),
                    &v.content,
                    &terms,
                )
            }));
        }

        {
            let guard = self.policies.read().map_err(|_| poisoned("policies"))?;
            hits.extend(
                guard
                    .values()
                    .filter(|p| &p.tenant_id == tenant_id)
                    .filter_map(|p| {
                        let body = format!("{}\n{}\n{}", p.code, p.category, p.summary);
                        search::hit(SearchEntity::Policy, p.id.to_string(), p.title.clone(), &body, &terms)
                    }),
            );
        }

        {
            let guard = self.committees.read().map_err(|_| poisoned("committees"))?;
            hits.extend(
                guard
                    .values()
                    .filter(|c| &c.tenant_id == tenant_id)
                    .filter_map(|c| {
                        search::hit(
                            SearchEntity::Committee,
                            c.id.to_string(),
                            c.name.clone(),
                            &c.description,
                            &terms,
                        )
                    }),
            );
        }

        Ok(search::rank(hits, limit))
    }
}

/// ACTIVE_FINAL wins; otherwise the highest version number.
fn prefer_for_search(candidate: &DocumentVersion, current: &DocumentVersion) -> bool {
    let active = |v: &DocumentVersion| v.lifecycle_status == LifecycleStatus::ActiveFinal;
    match (active(candidate), active(current)) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.version_number > current.version_number,
    }
}

pub(crate) fn document_title(version: &DocumentVersion) -> String {
    version
        .source_file_name
        .clone()
        .unwrap_or_else(|| format!("Document {}", version.document_id))
}

fn apply_window<T>(items: Vec<T>, window: QueryWindow) -> Vec<T> {
    let iter = items.into_iter().skip(window.offset);
    if window.limit == 0 {
        iter.collect()
    } else {
        iter.take(window.limit).collect()
    }
}
