//! Hash chaining shared by every audit backend.

use crate::model::{AuditAppend, AuditRecord};
use crate::{StorageError, StorageResult};
use chrono::SubsecRound;

/// PostgreSQL keeps microseconds; hash what will be read back.
pub(crate) fn normalize_timestamp(event: &mut AuditAppend) {
    event.timestamp = event.timestamp.trunc_subsecs(6);
}

pub(crate) fn compute_audit_hash(
    event: &AuditAppend,
    previous_hash: Option<&str>,
    sequence: u64,
) -> StorageResult<String> {
    let serializable = serde_json::json!({
        "previous_hash": previous_hash,
        "sequence": sequence,
        "tenant_id": event.tenant_id.as_str(),
        "timestamp": event.timestamp,
        "actor": event.actor,
        "action": event.action,
        "entity_type": event.entity_type,
        "entity_id": event.entity_id,
        "message": event.message,
        "payload": event.payload,
    });
    let serialized = serde_json::to_vec(&serializable)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&serialized).to_hex().to_string())
}

/// Check that `records` (oldest first) form an unbroken hash chain.
pub fn verify_chain(records: &[AuditRecord]) -> StorageResult<bool> {
    let mut previous: Option<&str> = None;
    for (idx, record) in records.iter().enumerate() {
        if record.sequence != idx as u64 + 1 || record.previous_hash.as_deref() != previous {
            return Ok(false);
        }
        let event = AuditAppend {
            tenant_id: record.tenant_id.clone(),
            timestamp: record.timestamp,
            actor: record.actor.clone(),
            action: record.action.clone(),
            entity_type: record.entity_type.clone(),
            entity_id: record.entity_id.clone(),
            message: record.message.clone(),
            payload: record.payload.clone(),
        };
        if compute_audit_hash(&event, previous, record.sequence)? != record.hash {
            return Ok(false);
        }
        previous = Some(&record.hash);
    }
    Ok(true)
}
