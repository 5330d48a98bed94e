//! Binding configuration: which backend serves each entity port.

use crate::error::{BindingError, BindingResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global default mode for every entity.
pub const MODE_VAR: &str = "SPM_BINDING_MODE";
/// Connection string for the live backend.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Backend kind behind a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingMode {
    /// In-memory fixtures
    #[default]
    Synthetic,
    /// Remote API mapping
    Mapped,
    /// Database-backed
    Live,
}

impl BindingMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BindingMode::Synthetic => "synthetic",
            BindingMode::Mapped => "mapped",
            BindingMode::Live => "live",
        }
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BindingMode {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synthetic" => Ok(BindingMode::Synthetic),
            "mapped" => Ok(BindingMode::Mapped),
            "live" => Ok(BindingMode::Live),
            other => Err(BindingError::Config(format!(
                "unknown binding mode `{other}` (expected synthetic, mapped or live)"
            ))),
        }
    }
}

/// Entity port resolved by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Document,
    Policy,
    Committee,
    Audit,
    Search,
}

impl Entity {
    pub const ALL: [Entity; 5] = [
        Entity::Document,
        Entity::Policy,
        Entity::Committee,
        Entity::Audit,
        Entity::Search,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Entity::Document => "document",
            Entity::Policy => "policy",
            Entity::Committee => "committee",
            Entity::Audit => "audit",
            Entity::Search => "search",
        }
    }

    /// Per-entity override variable, e.g. `SPM_BINDING_DOCUMENT`.
    pub fn env_var(self) -> String {
        format!("SPM_BINDING_{}", self.as_str().to_ascii_uppercase())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode selected for each entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProviderModes {
    pub document: BindingMode,
    pub policy: BindingMode,
    pub committee: BindingMode,
    pub audit: BindingMode,
    pub search: BindingMode,
}

impl ProviderModes {
    pub fn uniform(mode: BindingMode) -> Self {
        Self {
            document: mode,
            policy: mode,
            committee: mode,
            audit: mode,
            search: mode,
        }
    }

    pub fn get(&self, entity: Entity) -> BindingMode {
        match entity {
            Entity::Document => self.document,
            Entity::Policy => self.policy,
            Entity::Committee => self.committee,
            Entity::Audit => self.audit,
            Entity::Search => self.search,
        }
    }

    pub fn set(&mut self, entity: Entity, mode: BindingMode) {
        let slot = match entity {
            Entity::Document => &mut self.document,
            Entity::Policy => &mut self.policy,
            Entity::Committee => &mut self.committee,
            Entity::Audit => &mut self.audit,
            Entity::Search => &mut self.search,
        };
        *slot = mode;
    }
}

/// Connection pool settings for the live backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout_secs: 5,
        }
    }
}

/// Process-wide binding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BindingConfig {
    pub providers: ProviderModes,
    pub database_url: Option<String>,
    #[serde(default)]
    pub pool: PoolSettings,
}

impl BindingConfig {
    /// Every entity served from fixtures; never touches a database.
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// Resolve from the process environment.
    pub fn from_env() -> BindingResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve through `lookup`, one entity at a time:
    /// `SPM_BINDING_<ENTITY>`, then `SPM_BINDING_MODE`, then `live` when
    /// `DATABASE_URL` is set and `synthetic` otherwise. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> BindingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = read(DATABASE_URL_VAR);
        let default_mode = match read(MODE_VAR) {
            Some(raw) => parse_mode(MODE_VAR, &raw)?,
            None if database_url.is_some() => BindingMode::Live,
            None => BindingMode::Synthetic,
        };

        let mut providers = ProviderModes::uniform(default_mode);
        for entity in Entity::ALL {
            let var = entity.env_var();
            if let Some(raw) = read(&var) {
                providers.set(entity, parse_mode(&var, &raw)?);
            }
        }

        Ok(Self {
            providers,
            database_url,
            pool: PoolSettings::default(),
        })
    }

    pub fn with_pool(mut self, pool: PoolSettings) -> Self {
        self.pool = pool;
        self
    }

    pub fn mode(&self, entity: Entity) -> BindingMode {
        self.providers.get(entity)
    }

    pub fn any_live(&self) -> bool {
        Entity::ALL
            .iter()
            .any(|e| self.mode(*e) == BindingMode::Live)
    }
}

fn parse_mode(var: &str, raw: &str) -> BindingResult<BindingMode> {
    raw.parse().map_err(|_| {
        BindingError::Config(format!(
            "{var}={raw:?} is not a binding mode (expected synthetic, mapped or live)"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_synthetic_without_database() {
        let config = BindingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.providers, ProviderModes::uniform(BindingMode::Synthetic));
        assert!(!config.any_live());
    }

    #[test]
    fn per_entity_override_wins() {
        let config = BindingConfig::from_lookup(lookup(&[
            ("SPM_BINDING_MODE", "synthetic"),
            ("SPM_BINDING_AUDIT", "LIVE"),
            ("DATABASE_URL", "postgres://db/spm"),
        ]))
        .unwrap();
        assert_eq!(config.mode(Entity::Audit), BindingMode::Live);
        assert_eq!(config.mode(Entity::Document), BindingMode::Synthetic);
        assert!(config.any_live());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = BindingConfig::from_lookup(lookup(&[
            ("SPM_BINDING_MODE", "  "),
            ("DATABASE_URL", ""),
        ]))
        .unwrap();
        assert_eq!(config.mode(Entity::Search), BindingMode::Synthetic);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = BindingConfig::from_lookup(lookup(&[("SPM_BINDING_POLICY", "remote")]))
            .unwrap_err();
        assert!(err.to_string().contains("SPM_BINDING_POLICY"));

        assert!(matches!(
            BindingConfig::from_lookup(lookup(&[("SPM_BINDING_MODE", "db")])),
            Err(BindingError::Config(_))
        ));
    }

    #[test]
    fn modes_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&BindingMode::Live).unwrap(),
            "\"live\""
        );
        assert_eq!(Entity::Committee.env_var(), "SPM_BINDING_COMMITTEE");
    }
}
