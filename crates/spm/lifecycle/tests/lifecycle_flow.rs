//! End-to-end lifecycle flows against the in-memory store.

use proptest::prelude::*;
use spm_lifecycle::{calculate_checksum, LifecycleError, SourceFile, VersionLifecycle};
use spm_storage::{
    verify_chain, AuditStore, DocumentVersionStore, InMemoryGovernanceStore, LocalFileStorage,
    QueryWindow,
};
use spm_types::{ChangeType, DocumentId, DocumentVersion, LifecycleStatus, TenantId, VersionId};
use std::sync::Arc;

fn setup() -> (VersionLifecycle, Arc<InMemoryGovernanceStore>, TenantId) {
    let store = Arc::new(InMemoryGovernanceStore::new());
    let engine = VersionLifecycle::new(store.clone()).with_audit(store.clone());
    (engine, store, TenantId::new("t1"))
}

fn policy_pdf() -> SourceFile {
    SourceFile {
        name: Some("policy.pdf".to_string()),
        file_type: Some("application/pdf".to_string()),
        ..SourceFile::default()
    }
}

/// RAW -> PROCESSED -> DRAFT -> UNDER_REVIEW -> APPROVED, returning the approved version.
async fn approved_version(
    engine: &VersionLifecycle,
    tenant: &TenantId,
    document_id: Option<DocumentId>,
    content: &str,
) -> DocumentVersion {
    let raw = engine
        .import_raw(tenant, document_id, policy_pdf(), "u1")
        .await
        .unwrap();
    let processed = engine
        .process_to_markdown(tenant, &raw.id, content, "u1", None)
        .await
        .unwrap();
    let draft = engine
        .transition_to_draft(tenant, &processed.id, None, "u1", None)
        .await
        .unwrap();
    engine.submit_for_review(tenant, &draft.id, "u1").await.unwrap();
    engine.approve(tenant, &draft.id, "u2", None).await.unwrap()
}

async fn active_count(store: &InMemoryGovernanceStore, tenant: &TenantId, doc: &DocumentId) -> usize {
    store
        .list_versions(tenant, doc)
        .await
        .unwrap()
        .iter()
        .filter(|v| v.lifecycle_status == LifecycleStatus::ActiveFinal)
        .count()
}

#[tokio::test]
async fn import_raw_creates_initial_version() {
    let (engine, _, tenant) = setup();

    let raw = engine
        .import_raw(&tenant, None, policy_pdf(), "u1")
        .await
        .unwrap();

    assert_eq!(raw.version_number.to_string(), "1.0.0");
    assert_eq!(raw.lifecycle_status, LifecycleStatus::Raw);
    assert_eq!(raw.content, "");
    assert_eq!(raw.source_file_name.as_deref(), Some("policy.pdf"));
    assert_eq!(raw.created_by, "u1");
}

#[tokio::test]
async fn process_to_markdown_links_provenance() {
    let (engine, _, tenant) = setup();
    let raw = engine
        .import_raw(&tenant, None, policy_pdf(), "u1")
        .await
        .unwrap();

    let markdown = "# Policy\n\nCommissions are paid monthly.";
    let processed = engine
        .process_to_markdown(&tenant, &raw.id, markdown, "u1", None)
        .await
        .unwrap();

    assert_eq!(processed.version_number.to_string(), "1.1.0");
    assert_eq!(processed.previous_version_id, Some(raw.id));
    assert_eq!(processed.lifecycle_status, LifecycleStatus::Processed);
    assert_eq!(processed.checksum, calculate_checksum(markdown));
    assert_eq!(processed.document_id, raw.document_id);
}

#[tokio::test]
async fn publish_supersedes_previous_active() {
    let (engine, store, tenant) = setup();

    let v1 = approved_version(&engine, &tenant, None, "# Policy v1").await;
    let doc = v1.document_id;
    engine.publish_to_active(&tenant, &v1.id, "u1").await.unwrap();
    let v2 = approved_version(&engine, &tenant, Some(doc), "# Policy v2").await;

    let outcome = engine.publish_to_active(&tenant, &v2.id, "u2").await.unwrap();

    let superseded = outcome.superseded.expect("v1 should be demoted");
    assert_eq!(superseded.id, v1.id);
    assert_eq!(superseded.lifecycle_status, LifecycleStatus::Superseded);
    assert_eq!(superseded.superseded_by, Some(v2.id));
    assert_eq!(outcome.published.lifecycle_status, LifecycleStatus::ActiveFinal);
    assert_eq!(outcome.published.published_by.as_deref(), Some("u2"));

    let stored_v1 = engine.get_version(&tenant, &v1.id).await.unwrap();
    assert_eq!(stored_v1.lifecycle_status, LifecycleStatus::Superseded);
    assert_eq!(active_count(&store, &tenant, &doc).await, 1);
    assert_eq!(
        engine.get_active_version(&tenant, &doc).await.unwrap().map(|v| v.id),
        Some(v2.id)
    );
}

#[tokio::test]
async fn compare_counts_new_lines() {
    let (engine, _, tenant) = setup();
    let base: Vec<String> = (1..=10).map(|i| format!("line {i}")).collect();
    let mut next = base[..9].to_vec();
    next.extend(["new a", "new b", "new c"].map(String::from));

    let raw = engine
        .import_raw(&tenant, None, policy_pdf(), "u1")
        .await
        .unwrap();
    let v1 = engine
        .process_to_markdown(&tenant, &raw.id, &base.join("\n"), "u1", None)
        .await
        .unwrap();
    let v2 = engine
        .transition_to_draft(&tenant, &v1.id, Some(next.join("\n")), "u1", None)
        .await
        .unwrap();
    assert_eq!(v1.line_count(), 10);
    assert_eq!(v2.line_count(), 12);

    let diff = engine.compare_versions(&tenant, &v1.id, &v2.id).await.unwrap();
    assert_eq!(diff.added_lines, 3);
    assert_eq!(diff.removed_lines, 1);
    assert!(diff.checksum_changed);
    assert!(diff.header.starts_with("--- v1.1.0"));
    assert!(diff.changes.contains(&"+new a".to_string()));
    assert!(diff.changes.contains(&"-line 10".to_string()));
}

#[tokio::test]
async fn archive_is_terminal() {
    let (engine, _, tenant) = setup();
    let raw = engine
        .import_raw(&tenant, None, policy_pdf(), "u1")
        .await
        .unwrap();
    engine.archive(&tenant, &raw.id, "u1").await.unwrap();

    let err = engine.archive(&tenant, &raw.id, "u1").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::InvalidTransition {
            from: LifecycleStatus::Archived,
            to: LifecycleStatus::Archived,
            ..
        }
    ));
    assert!(err.to_string().contains("ARCHIVED"));
}

#[tokio::test]
async fn missing_ids_fail_without_side_effects() {
    let (engine, store, tenant) = setup();
    let missing = VersionId::generate();

    assert!(matches!(
        engine.submit_for_review(&tenant, &missing, "u1").await,
        Err(LifecycleError::NotFound(_))
    ));
    assert!(matches!(
        engine.process_to_markdown(&tenant, &missing, "# x", "u1", None).await,
        Err(LifecycleError::NotFound(_))
    ));
    assert!(matches!(
        engine.publish_to_active(&tenant, &missing, "u1").await,
        Err(LifecycleError::NotFound(_))
    ));
    assert!(matches!(
        engine.archive(&tenant, &missing, "u1").await,
        Err(LifecycleError::NotFound(_))
    ));

    let events = store.list_audit(&tenant, QueryWindow::default()).await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn other_tenants_cannot_see_or_mutate_versions() {
    let (engine, _, tenant) = setup();
    let raw = engine
        .import_raw(&tenant, None, policy_pdf(), "u1")
        .await
        .unwrap();
    let intruder = TenantId::new("t2");

    assert!(matches!(
        engine.get_version(&intruder, &raw.id).await,
        Err(LifecycleError::NotFound(_))
    ));
    assert!(matches!(
        engine.archive(&intruder, &raw.id, "x").await,
        Err(LifecycleError::NotFound(_))
    ));
    let check = engine
        .can_transition(&intruder, &raw.id, LifecycleStatus::Archived)
        .await
        .unwrap();
    assert!(!check.allowed);

    let still_raw = engine.get_version(&tenant, &raw.id).await.unwrap();
    assert_eq!(still_raw.lifecycle_status, LifecycleStatus::Raw);
}

#[tokio::test]
async fn can_transition_is_idempotent() {
    let (engine, _, tenant) = setup();
    let raw = engine
        .import_raw(&tenant, None, policy_pdf(), "u1")
        .await
        .unwrap();

    let first = engine
        .can_transition(&tenant, &raw.id, LifecycleStatus::ActiveFinal)
        .await
        .unwrap();
    for _ in 0..3 {
        let again = engine
            .can_transition(&tenant, &raw.id, LifecycleStatus::ActiveFinal)
            .await
            .unwrap();
        assert_eq!(again, first);
    }
    assert!(!first.allowed);
    assert!(first.reason.is_some());

    let allowed = engine
        .can_transition(&tenant, &raw.id, LifecycleStatus::Processed)
        .await
        .unwrap();
    assert!(allowed.allowed);
}

#[tokio::test]
async fn timeline_and_stats_follow_version_order() {
    let (engine, _, tenant) = setup();
    let approved = approved_version(&engine, &tenant, None, "# Policy").await;
    let doc = approved.document_id;
    engine.publish_to_active(&tenant, &approved.id, "u3").await.unwrap();

    let timeline = engine.get_timeline(&tenant, &doc).await.unwrap();
    let numbers: Vec<String> = timeline.iter().map(|e| e.version_number.to_string()).collect();
    assert_eq!(numbers, ["1.0.0", "1.1.0", "1.2.0"]);
    assert!(timeline[0].summary.contains("policy.pdf"));
    assert!(timeline[2].summary.starts_with("Published by u3"));

    let stats = engine.get_version_stats(&tenant, &doc).await.unwrap();
    assert_eq!(stats.total_versions, 3);
    assert_eq!(stats.by_status.get(&LifecycleStatus::ActiveFinal), Some(&1));
    assert_eq!(stats.by_status.get(&LifecycleStatus::Raw), Some(&1));
    assert_eq!(stats.latest_version.map(|v| v.to_string()).as_deref(), Some("1.2.0"));
    assert_eq!(stats.active_version.map(|v| v.to_string()).as_deref(), Some("1.2.0"));
    assert!(stats.first_created_at <= stats.last_modified_at);

    assert!(matches!(
        engine.get_timeline(&tenant, &DocumentId::generate()).await,
        Err(LifecycleError::NotFound(_))
    ));
}

#[tokio::test]
async fn audit_trail_forms_a_chain() {
    let (engine, store, tenant) = setup();
    let approved = approved_version(&engine, &tenant, None, "# Policy").await;
    engine.publish_to_active(&tenant, &approved.id, "u3").await.unwrap();

    let mut events = store.list_audit(&tenant, QueryWindow::default()).await.unwrap();
    events.reverse();
    assert_eq!(events.len(), 6);
    assert_eq!(events.last().map(|e| e.action.as_str()), Some("version.published"));
    assert!(verify_chain(&events).unwrap());
}

#[tokio::test]
async fn upload_stores_source_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let (engine, _, tenant) = setup();
    let engine = engine.with_files(Arc::new(LocalFileStorage::new(dir.path())));

    let raw = engine
        .import_upload(&tenant, None, "plan.pdf", None, b"%PDF-1.7 body", "u1")
        .await
        .unwrap();

    assert_eq!(raw.lifecycle_status, LifecycleStatus::Raw);
    assert_eq!(raw.file_size, 13);
    assert_eq!(raw.source_file_type.as_deref(), Some("application/pdf"));
    assert!(raw
        .source_file_url
        .as_deref()
        .is_some_and(|url| url.starts_with("file://") && url.ends_with("plan.pdf")));
}

fn file_count(root: &std::path::Path) -> usize {
    std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .map(|path| if path.is_dir() { file_count(&path) } else { 1 })
        .sum()
}

#[tokio::test]
async fn foreign_document_id_reads_as_missing_and_leaves_no_upload() {
    let dir = tempfile::TempDir::new().unwrap();
    let (engine, store, owner) = setup();
    let engine = engine.with_files(Arc::new(LocalFileStorage::new(dir.path())));
    let intruder = TenantId::new("t2");

    let owned = engine.import_raw(&owner, None, policy_pdf(), "u1").await.unwrap();

    let err = engine
        .import_raw(&intruder, Some(owned.document_id), policy_pdf(), "u2")
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));

    let err = engine
        .import_upload(&intruder, Some(owned.document_id), "plan.pdf", None, b"%PDF", "u2")
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
    assert_eq!(file_count(dir.path()), 0);

    let versions = store.list_versions(&owner, &owned.document_id).await.unwrap();
    assert_eq!(versions.len(), 1);
}

#[tokio::test]
async fn concurrent_publishes_leave_one_active() {
    let (engine, store, tenant) = setup();
    let first = approved_version(&engine, &tenant, None, "# A").await;
    let doc = first.document_id;
    let mut candidates = vec![first];
    for content in ["# B", "# C", "# D"] {
        candidates.push(approved_version(&engine, &tenant, Some(doc), content).await);
    }

    let handles: Vec<_> = candidates
        .iter()
        .map(|v| {
            let engine = engine.clone();
            let tenant = tenant.clone();
            let id = v.id;
            tokio::spawn(async move { engine.publish_to_active(&tenant, &id, "u9").await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(active_count(&store, &tenant, &doc).await, 1);
    let superseded = store
        .list_versions(&tenant, &doc)
        .await
        .unwrap()
        .into_iter()
        .filter(|v| v.lifecycle_status == LifecycleStatus::Superseded)
        .count();
    assert_eq!(superseded, 3);
}

proptest! {
    #[test]
    fn next_version_numbers_strictly_increase(
        changes in proptest::collection::vec(
            prop_oneof![
                Just(ChangeType::Major),
                Just(ChangeType::Minor),
                Just(ChangeType::Patch),
                Just(ChangeType::Emergency),
            ],
            1..12,
        )
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let (engine, _, tenant) = setup();
            let raw = engine.import_raw(&tenant, None, policy_pdf(), "u1").await.unwrap();
            let doc = raw.document_id;
            let mut previous = raw.version_number.clone();
            for change in changes {
                let next = engine.get_next_version_number(&tenant, &doc, change).await.unwrap();
                prop_assert!(next > previous);
                // Materialise it so the following call sees a new latest version.
                let again = engine.import_raw(&tenant, Some(doc), policy_pdf(), "u1").await.unwrap();
                prop_assert!(again.version_number > previous);
                previous = again.version_number;
            }
            Ok(())
        })?;
    }
}
