//! Read-only introspection of the active bindings.

use crate::config::{BindingConfig, BindingMode, Entity};
use serde::Serialize;
use std::collections::BTreeMap;
use url::Url;

/// Snapshot of the registry configuration. Advisory only; nothing here is
/// enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingDiagnostics {
    pub modes: BTreeMap<Entity, BindingMode>,
    pub any_live: bool,
    pub database_configured: bool,
    /// The database URL carries a `schema=` tenant isolation parameter.
    pub tenant_schema_marker: bool,
    pub warnings: Vec<String>,
}

pub(crate) fn diagnose(config: &BindingConfig) -> BindingDiagnostics {
    let modes: BTreeMap<Entity, BindingMode> = Entity::ALL
        .into_iter()
        .map(|entity| (entity, config.mode(entity)))
        .collect();
    let any_live = config.any_live();
    let database_configured = config.database_url.is_some();
    let tenant_schema_marker = config
        .database_url
        .as_deref()
        .is_some_and(has_schema_marker);

    let mut warnings = Vec::new();
    for (entity, mode) in &modes {
        if *mode == BindingMode::Mapped {
            warnings.push(format!("{entity}: mapped binding has no implementation"));
        }
    }
    if any_live && !database_configured {
        warnings.push("live binding selected but DATABASE_URL is not set".to_string());
    }
    if any_live && database_configured && !tenant_schema_marker {
        warnings.push("DATABASE_URL has no schema= tenant isolation marker".to_string());
    }

    BindingDiagnostics {
        modes,
        any_live,
        database_configured,
        tenant_schema_marker,
        warnings,
    }
}

fn has_schema_marker(database_url: &str) -> bool {
    Url::parse(database_url)
        .map(|url| {
            url.query_pairs()
                .any(|(key, value)| key == "schema" && !value.is_empty())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderModes;

    #[test]
    fn reports_schema_marker() {
        let config = BindingConfig {
            providers: ProviderModes::uniform(BindingMode::Live),
            database_url: Some("postgres://u@db/spm?schema=acme".to_string()),
            ..BindingConfig::default()
        };
        let report = diagnose(&config);
        assert!(report.any_live);
        assert!(report.tenant_schema_marker);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn warns_on_unisolated_or_missing_database() {
        let unisolated = BindingConfig {
            providers: ProviderModes::uniform(BindingMode::Live),
            database_url: Some("postgres://u@db/spm".to_string()),
            ..BindingConfig::default()
        };
        assert_eq!(diagnose(&unisolated).warnings.len(), 1);

        let missing = BindingConfig {
            providers: ProviderModes::uniform(BindingMode::Live),
            ..BindingConfig::default()
        };
        let report = diagnose(&missing);
        assert!(!report.database_configured);
        assert!(report.warnings[0].contains("DATABASE_URL"));
    }
}
