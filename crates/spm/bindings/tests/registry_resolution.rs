//! Registry behaviour driven by environment-style configuration.

use spm_bindings::{BindingConfig, BindingError, BindingMode, Entity, ProviderRegistry};
use std::collections::HashMap;

fn config_from(vars: &[(&str, &str)]) -> Result<BindingConfig, BindingError> {
    let env: HashMap<&str, &str> = vars.iter().copied().collect();
    BindingConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
}

#[test]
fn global_synthetic_mode_applies_to_every_entity() {
    let registry = ProviderRegistry::new(config_from(&[("SPM_BINDING_MODE", "synthetic")]).unwrap());

    let report = registry.diagnostics().unwrap();
    for entity in Entity::ALL {
        assert_eq!(report.modes[&entity], BindingMode::Synthetic, "{entity}");
    }
    assert!(!report.any_live);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["modes"]["document"], "synthetic");
}

#[test]
fn database_url_defaults_to_live() {
    let config = config_from(&[("DATABASE_URL", "postgres://u@db/spm?schema=t1")]).unwrap();
    let registry = ProviderRegistry::new(config);

    let report = registry.diagnostics().unwrap();
    for entity in Entity::ALL {
        assert_eq!(report.modes[&entity], BindingMode::Live, "{entity}");
    }
    assert!(report.any_live);
    assert!(report.database_configured);
    assert!(report.tenant_schema_marker);
}

#[tokio::test]
async fn synthetic_configuration_never_needs_a_database() {
    let config = config_from(&[
        ("SPM_BINDING_MODE", "synthetic"),
        ("DATABASE_URL", "postgres://unreachable.invalid/spm"),
    ])
    .unwrap();
    let registry = ProviderRegistry::new(config);

    assert!(registry.documents().await.is_ok());
    assert!(registry.policies().await.is_ok());
    assert!(registry.committees().await.is_ok());
    assert!(registry.audit().await.is_ok());
    assert!(registry.search().await.is_ok());
}

#[tokio::test]
async fn mapped_entities_fail_with_their_name() {
    let config = config_from(&[("SPM_BINDING_DOCUMENT", "mapped")]).unwrap();
    let registry = ProviderRegistry::new(config);

    let err = match registry.documents().await {
        Err(err) => err,
        Ok(_) => panic!("mapped documents should not resolve"),
    };
    assert!(matches!(err, BindingError::MappedNotImplemented(Entity::Document)));
    assert!(err.to_string().contains("document"));
}
