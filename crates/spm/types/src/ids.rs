//! Strongly-typed identifiers for governance entities
//!
//! Record ids are UUID-based newtypes; tenants are opaque strings supplied by
//! the deployment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Isolation boundary separating one organization's data from another's
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Owning document of a version chain
    DocumentId
);
uuid_id!(
    /// One immutable document version
    VersionId
);
uuid_id!(
    /// Governance policy record
    PolicyId
);
uuid_id!(
    /// Governance committee record
    CommitteeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_id_generation() {
        let id1 = VersionId::generate();
        let id2 = VersionId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_display_round_trips_through_from_str() {
        let id = DocumentId::generate();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_ids_serialize_as_bare_values() {
        let tenant = TenantId::new("t1");
        assert_eq!(serde_json::to_string(&tenant).unwrap(), "\"t1\"");

        let uuid = Uuid::new_v4();
        let id = VersionId::from_uuid(uuid);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{uuid}\""));
    }
}
