//! Deterministic term scoring shared by the search adapters.

use crate::model::{SearchEntity, SearchHit};
use std::cmp::Ordering;

const SNIPPET_CHARS: usize = 160;

pub(crate) fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Title matches weigh twice as much as body matches. `None` when nothing matches.
pub(crate) fn score(terms: &[String], title: &str, body: &str) -> Option<f32> {
    if terms.is_empty() {
        return None;
    }
    let title = title.to_lowercase();
    let body = body.to_lowercase();
    let total: usize = terms
        .iter()
        .map(|term| title.matches(term.as_str()).count() * 2 + body.matches(term.as_str()).count())
        .sum();
    (total > 0).then_some(total as f32)
}

/// First line of `body` containing a term, trimmed to a display-friendly length.
pub(crate) fn snippet(terms: &[String], body: &str) -> String {
    let line = body
        .lines()
        .find(|line| {
            let lower = line.to_lowercase();
            terms.iter().any(|t| lower.contains(t.as_str()))
        })
        .or_else(|| body.lines().next())
        .unwrap_or_default()
        .trim();
    line.chars().take(SNIPPET_CHARS).collect()
}

pub(crate) fn hit(
    entity: SearchEntity,
    id: String,
    title: String,
    body: &str,
    terms: &[String],
) -> Option<SearchHit> {
    score(terms, &title, body).map(|score| SearchHit {
        entity,
        id,
        snippet: snippet(terms, body),
        title,
        score,
    })
}

pub(crate) fn rank(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.title.cmp(&b.title))
    });
    if limit > 0 {
        hits.truncate(limit);
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_matches_outrank_body_matches() {
        let terms = query_terms("Commission");
        let in_title = score(&terms, "Commission Plan", "rules").unwrap();
        let in_body = score(&terms, "Plan", "commission rules").unwrap();
        assert!(in_title > in_body);
        assert!(score(&terms, "Quota", "targets").is_none());
    }

    #[test]
    fn snippet_prefers_matching_line() {
        let terms = query_terms("clawback");
        let body = "# Plan\nintro\nClawback applies after 90 days\n";
        assert_eq!(snippet(&terms, body), "Clawback applies after 90 days");
    }
}
