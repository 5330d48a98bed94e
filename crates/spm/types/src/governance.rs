//! Policy and committee records served through the registry ports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CommitteeId, PolicyId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    Draft,
    Active,
    Retired,
}

/// Governance policy (commission rules, approval thresholds, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub tenant_id: TenantId,
    pub code: String,
    pub title: String,
    pub category: String,
    pub status: PolicyStatus,
    pub effective_date: Option<NaiveDate>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Unstructured attributes carried over from source systems.
    #[serde(default)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitteeRole {
    Chair,
    Member,
    Secretary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub user_id: String,
    pub role: CommitteeRole,
}

/// Share of votes a committee needs to carry a decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionThreshold {
    SimpleMajority,
    Supermajority { percent: u8 },
    Unanimous,
}

impl DecisionThreshold {
    /// Whether `votes_for` out of `votes_cast` carries the decision.
    pub fn is_met(&self, votes_for: u32, votes_cast: u32) -> bool {
        if votes_cast == 0 {
            return false;
        }
        match self {
            DecisionThreshold::SimpleMajority => votes_for * 2 > votes_cast,
            DecisionThreshold::Supermajority { percent } => {
                u64::from(votes_for) * 100 >= u64::from(votes_cast) * u64::from(*percent)
            }
            DecisionThreshold::Unanimous => votes_for == votes_cast,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Committee {
    pub id: CommitteeId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: String,
    pub members: Vec<CommitteeMember>,
    pub decision_threshold: DecisionThreshold,
    pub quorum: u32,
    pub created_at: DateTime<Utc>,
}

impl Committee {
    pub fn chair(&self) -> Option<&CommitteeMember> {
        self.members.iter().find(|m| m.role == CommitteeRole::Chair)
    }

    pub fn has_quorum(&self, present: u32) -> bool {
        present >= self.quorum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert!(DecisionThreshold::SimpleMajority.is_met(3, 5));
        assert!(!DecisionThreshold::SimpleMajority.is_met(2, 4));
        assert!(DecisionThreshold::Supermajority { percent: 67 }.is_met(4, 6));
        assert!(!DecisionThreshold::Supermajority { percent: 67 }.is_met(3, 6));
        assert!(DecisionThreshold::Unanimous.is_met(5, 5));
        assert!(!DecisionThreshold::Unanimous.is_met(0, 0));
    }

    #[test]
    fn threshold_serializes_as_tagged_variant() {
        let json = serde_json::to_value(DecisionThreshold::Supermajority { percent: 75 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "supermajority", "percent": 75}));
    }
}
