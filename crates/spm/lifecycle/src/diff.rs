//! Line-level comparison of two versions.

use serde::{Deserialize, Serialize};
use spm_types::{DocumentVersion, VersionId, VersionNumber};
use std::collections::HashSet;

/// Structural diff between a base version (`a`) and a target version (`b`).
///
/// Counts come from a set difference over lines, not sequence alignment:
/// a line of `b` is "added" when the same text appears nowhere in `a`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDiff {
    pub from_version_id: VersionId,
    pub to_version_id: VersionId,
    pub from_version: VersionNumber,
    pub to_version: VersionNumber,
    pub added_lines: usize,
    pub removed_lines: usize,
    pub checksum_changed: bool,
    /// Unified-diff style header.
    pub header: String,
    /// Removed lines prefixed with `-`, then added lines prefixed with `+`.
    pub changes: Vec<String>,
}

pub(crate) fn compare(a: &DocumentVersion, b: &DocumentVersion) -> VersionDiff {
    let a_lines: Vec<&str> = a.content.lines().collect();
    let b_lines: Vec<&str> = b.content.lines().collect();
    let a_set: HashSet<&str> = a_lines.iter().copied().collect();
    let b_set: HashSet<&str> = b_lines.iter().copied().collect();

    let removed: Vec<&str> = a_lines
        .iter()
        .copied()
        .filter(|line| !b_set.contains(line))
        .collect();
    let added: Vec<&str> = b_lines
        .iter()
        .copied()
        .filter(|line| !a_set.contains(line))
        .collect();

    let header = format!(
        "--- v{} ({})\n+++ v{} ({})\n@@ -1,{} +1,{} @@",
        a.version_number,
        a.lifecycle_status,
        b.version_number,
        b.lifecycle_status,
        a_lines.len(),
        b_lines.len()
    );

    let changes = removed
        .iter()
        .map(|line| format!("-{line}"))
        .chain(added.iter().map(|line| format!("+{line}")))
        .collect();

    VersionDiff {
        from_version_id: a.id,
        to_version_id: b.id,
        from_version: a.version_number.clone(),
        to_version: b.version_number.clone(),
        added_lines: added.len(),
        removed_lines: removed.len(),
        checksum_changed: a.checksum != b.checksum,
        header,
        changes,
    }
}
