//! Document version lifecycle states and the legal transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypesError;

/// Stage of a document version in the approval/publication pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleStatus {
    Raw,
    Processed,
    Draft,
    UnderReview,
    Approved,
    ActiveFinal,
    Superseded,
    Archived,
}

impl LifecycleStatus {
    pub const ALL: [LifecycleStatus; 8] = [
        LifecycleStatus::Raw,
        LifecycleStatus::Processed,
        LifecycleStatus::Draft,
        LifecycleStatus::UnderReview,
        LifecycleStatus::Approved,
        LifecycleStatus::ActiveFinal,
        LifecycleStatus::Superseded,
        LifecycleStatus::Archived,
    ];

    /// Statuses reachable in one step from `self`.
    pub fn allowed_transitions(self) -> &'static [LifecycleStatus] {
        use LifecycleStatus::*;
        match self {
            Raw => &[Processed, Archived],
            Processed => &[Draft, Archived],
            Draft => &[UnderReview, Archived],
            UnderReview => &[Approved, Draft, Archived],
            Approved => &[ActiveFinal, Draft, Archived],
            ActiveFinal => &[Superseded, Archived],
            Superseded => &[Archived],
            Archived => &[],
        }
    }

    pub fn can_transition_to(self, to: LifecycleStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Evaluate a proposed transition without side effects.
    pub fn check_transition(self, to: LifecycleStatus) -> TransitionCheck {
        if self.can_transition_to(to) {
            return TransitionCheck::allowed();
        }
        let reason = if self.is_terminal() {
            format!("{self} is terminal; no further transitions are allowed")
        } else {
            let legal = self
                .allowed_transitions()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("cannot transition from {self} to {to}; allowed: {legal}")
        };
        TransitionCheck::denied(reason)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::Raw => "RAW",
            LifecycleStatus::Processed => "PROCESSED",
            LifecycleStatus::Draft => "DRAFT",
            LifecycleStatus::UnderReview => "UNDER_REVIEW",
            LifecycleStatus::Approved => "APPROVED",
            LifecycleStatus::ActiveFinal => "ACTIVE_FINAL",
            LifecycleStatus::Superseded => "SUPERSEDED",
            LifecycleStatus::Archived => "ARCHIVED",
        }
    }

    /// Title-case name used in version labels.
    pub fn display_name(self) -> &'static str {
        match self {
            LifecycleStatus::Raw => "Raw",
            LifecycleStatus::Processed => "Processed",
            LifecycleStatus::Draft => "Draft",
            LifecycleStatus::UnderReview => "Under Review",
            LifecycleStatus::Approved => "Approved",
            LifecycleStatus::ActiveFinal => "Active",
            LifecycleStatus::Superseded => "Superseded",
            LifecycleStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LifecycleStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypesError::UnknownStatus(s.to_string()))
    }
}

/// Result of a transition legality check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCheck {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionCheck {
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Kind of change a new version represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Major,
    Minor,
    Patch,
    /// Out-of-band fix; numbered like a patch.
    Emergency,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Major => "MAJOR",
            ChangeType::Minor => "MINOR",
            ChangeType::Patch => "PATCH",
            ChangeType::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MAJOR" => Ok(ChangeType::Major),
            "MINOR" => Ok(ChangeType::Minor),
            "PATCH" => Ok(ChangeType::Patch),
            "EMERGENCY" => Ok(ChangeType::Emergency),
            _ => Err(TypesError::UnknownChangeType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_matches_pipeline() {
        use LifecycleStatus::*;
        assert!(Raw.can_transition_to(Processed));
        assert!(UnderReview.can_transition_to(Draft));
        assert!(Approved.can_transition_to(ActiveFinal));
        assert!(ActiveFinal.can_transition_to(Superseded));
        assert!(!Raw.can_transition_to(Draft));
        assert!(!Draft.can_transition_to(Approved));
        assert!(!Superseded.can_transition_to(ActiveFinal));
    }

    #[test]
    fn every_non_terminal_status_can_archive() {
        for status in LifecycleStatus::ALL {
            if status == LifecycleStatus::Archived {
                assert!(status.is_terminal());
                assert!(!status.can_transition_to(LifecycleStatus::Archived));
            } else {
                assert!(status.can_transition_to(LifecycleStatus::Archived), "{status}");
            }
        }
    }

    #[test]
    fn check_transition_explains_denials() {
        let check = LifecycleStatus::Draft.check_transition(LifecycleStatus::ActiveFinal);
        assert!(!check.allowed);
        let reason = check.reason.unwrap();
        assert!(reason.contains("DRAFT"));
        assert!(reason.contains("UNDER_REVIEW"));

        let terminal = LifecycleStatus::Archived.check_transition(LifecycleStatus::Draft);
        assert!(terminal.reason.unwrap().contains("terminal"));
    }

    #[test]
    fn status_parses_and_serializes_in_screaming_case() {
        assert_eq!(
            "under_review".parse::<LifecycleStatus>().unwrap(),
            LifecycleStatus::UnderReview
        );
        assert_eq!(
            serde_json::to_string(&LifecycleStatus::ActiveFinal).unwrap(),
            "\"ACTIVE_FINAL\""
        );
        assert!("PUBLISHED".parse::<LifecycleStatus>().is_err());
    }

    #[test]
    fn change_type_parses_case_insensitively() {
        assert_eq!("minor".parse::<ChangeType>().unwrap(), ChangeType::Minor);
        assert!("huge".parse::<ChangeType>().is_err());
    }
}
