//! Synthetic demo data loaded into the in-memory store.

use crate::memory::InMemoryGovernanceStore;
use crate::traits::{CommitteeStore, DocumentVersionStore, PolicyStore};
use crate::StorageResult;
use chrono::{NaiveDate, Utc};
use serde_json::Map;
use spm_types::{
    checksum, version_label, ChangeType, Committee, CommitteeId, CommitteeMember, CommitteeRole,
    ContentFormat, DecisionThreshold, DocumentId, DocumentVersion, LifecycleStatus, Policy,
    PolicyId, PolicyStatus, TenantId, VersionId, VersionNumber,
};

/// Tenant that owns every synthetic record.
pub const SYNTHETIC_TENANT: &str = "demo";

const COMMISSION_POLICY_MD: &str = "# Commission Plan Policy\n\
\n\
## Scope\n\
Applies to all quota-carrying sellers.\n\
\n\
## Crediting\n\
Bookings are credited on signature.\n\
\n\
## Clawback\n\
Commissions are recovered when a deal cancels within 90 days.\n";

/// Populate `store` with demo policies, committees and one published document.
pub async fn seed_synthetic(store: &InMemoryGovernanceStore) -> StorageResult<()> {
    let tenant = TenantId::new(SYNTHETIC_TENANT);
    let now = Utc::now();

    let policies = [
        (
            "SPM-001",
            "Commission Plan Governance",
            "compensation",
            PolicyStatus::Active,
            "Annual plan design, approval and publication rules.",
        ),
        (
            "SPM-014",
            "Quota Adjustment Policy",
            "quota",
            PolicyStatus::Active,
            "Mid-year quota relief requires committee approval.",
        ),
        (
            "SPM-022",
            "Clawback Policy",
            "compensation",
            PolicyStatus::Draft,
            "Recovery of commissions on cancelled or refunded deals.",
        ),
    ];
    for (code, title, category, status, summary) in policies {
        store
            .upsert_policy(Policy {
                id: PolicyId::generate(),
                tenant_id: tenant.clone(),
                code: code.to_string(),
                title: title.to_string(),
                category: category.to_string(),
                status,
                effective_date: NaiveDate::from_ymd_opt(2025, 1, 1),
                summary: summary.to_string(),
                created_at: now,
                updated_at: now,
                additional_properties: Map::new(),
            })
            .await?;
    }

    store
        .upsert_committee(Committee {
            id: CommitteeId::generate(),
            tenant_id: tenant.clone(),
            name: "Sales Compensation Committee".to_string(),
            description: "Approves commission plans and policy exceptions.".to_string(),
            members: vec![
                member("cro", CommitteeRole::Chair),
                member("cfo", CommitteeRole::Member),
                member("vp-sales-ops", CommitteeRole::Member),
                member("comp-analyst", CommitteeRole::Secretary),
            ],
            decision_threshold: DecisionThreshold::Supermajority { percent: 67 },
            quorum: 3,
            created_at: now,
        })
        .await?;
    store
        .upsert_committee(Committee {
            id: CommitteeId::generate(),
            tenant_id: tenant.clone(),
            name: "Deal Desk Review Board".to_string(),
            description: "Reviews non-standard deal terms and quota relief.".to_string(),
            members: vec![
                member("deal-desk-lead", CommitteeRole::Chair),
                member("legal", CommitteeRole::Member),
                member("finance", CommitteeRole::Member),
            ],
            decision_threshold: DecisionThreshold::SimpleMajority,
            quorum: 2,
            created_at: now,
        })
        .await?;

    let document_id = DocumentId::generate();
    let raw = fixture_version(
        &tenant,
        document_id,
        VersionNumber::initial(),
        ChangeType::Major,
        LifecycleStatus::Raw,
        String::new(),
        None,
    );
    let processed = fixture_version(
        &tenant,
        document_id,
        VersionNumber::new(1, 1, 0),
        ChangeType::Minor,
        LifecycleStatus::Processed,
        COMMISSION_POLICY_MD.to_string(),
        Some(raw.id),
    );
    let approved = fixture_version(
        &tenant,
        document_id,
        VersionNumber::new(1, 2, 0),
        ChangeType::Minor,
        LifecycleStatus::Approved,
        COMMISSION_POLICY_MD.to_string(),
        Some(processed.id),
    );
    let approved_id = approved.id;

    store.insert_version(raw).await?;
    store.insert_version(processed).await?;
    store.insert_version(approved).await?;
    store
        .publish(&tenant, &approved_id, LifecycleStatus::Approved, "system", now)
        .await?;

    tracing::debug!(tenant = SYNTHETIC_TENANT, "seeded synthetic governance data");
    Ok(())
}

fn member(user_id: &str, role: CommitteeRole) -> CommitteeMember {
    CommitteeMember {
        user_id: user_id.to_string(),
        role,
    }
}

fn fixture_version(
    tenant: &TenantId,
    document_id: DocumentId,
    number: VersionNumber,
    change_type: ChangeType,
    status: LifecycleStatus,
    content: String,
    previous_version_id: Option<VersionId>,
) -> DocumentVersion {
    let format = if content.is_empty() {
        ContentFormat::PlainText
    } else {
        ContentFormat::Markdown
    };
    DocumentVersion {
        id: VersionId::generate(),
        document_id,
        tenant_id: tenant.clone(),
        version_label: version_label(&number, status),
        version_number: number,
        change_type,
        change_description: None,
        lifecycle_status: status,
        checksum: checksum::sha256_hex(content.as_bytes()),
        file_size: content.len() as u64,
        content,
        content_format: format,
        previous_version_id,
        superseded_by: None,
        source_file_url: None,
        source_file_name: Some("commission-plan-policy.pdf".to_string()),
        source_file_type: Some("application/pdf".to_string()),
        created_by: "system".to_string(),
        created_at: Utc::now(),
        modified_by: None,
        modified_at: None,
        approved_by: (status == LifecycleStatus::Approved).then(|| "system".to_string()),
        approved_at: None,
        approval_comments: None,
        published_by: None,
        published_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{QueryWindow, SearchStore};

    #[tokio::test]
    async fn seeded_store_is_searchable() {
        let store = InMemoryGovernanceStore::new();
        seed_synthetic(&store).await.unwrap();
        let tenant = TenantId::new(SYNTHETIC_TENANT);

        let policies = store.list_policies(&tenant, QueryWindow::default()).await.unwrap();
        assert_eq!(policies.len(), 3);

        let hits = store.search(&tenant, "clawback", 10).await.unwrap();
        assert!(hits.len() >= 2, "policy and document should both match");

        let other = store.search(&TenantId::new("other"), "clawback", 10).await.unwrap();
        assert!(other.is_empty());
    }
}
