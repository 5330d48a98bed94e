//! Provider registry.
//!
//! Resolves each entity port to the backend its [`BindingMode`] names.
//! Providers are built on first request and memoized per entity. Synthetic
//! ports share one seeded in-memory store; live ports share one PostgreSQL
//! pool, opened only when a live provider is first requested.

use crate::config::{BindingConfig, BindingMode, Entity};
use crate::diagnostics::{diagnose, BindingDiagnostics};
use crate::error::{BindingError, BindingResult};
use spm_storage::postgres::PostgresGovernanceStore;
use spm_storage::{
    seed_synthetic, AuditStore, CommitteeStore, DocumentVersionStore, InMemoryGovernanceStore,
    PolicyStore, SearchStore,
};
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Per-entity provider resolution over one [`BindingConfig`].
pub struct ProviderRegistry {
    state: RwLock<Arc<RegistryState>>,
}

struct RegistryState {
    config: BindingConfig,
    synthetic: OnceCell<Arc<InMemoryGovernanceStore>>,
    live: OnceCell<Arc<PostgresGovernanceStore>>,
    documents: OnceCell<Arc<dyn DocumentVersionStore>>,
    policies: OnceCell<Arc<dyn PolicyStore>>,
    committees: OnceCell<Arc<dyn CommitteeStore>>,
    audit: OnceCell<Arc<dyn AuditStore>>,
    search: OnceCell<Arc<dyn SearchStore>>,
}

impl ProviderRegistry {
    pub fn new(config: BindingConfig) -> Self {
        Self {
            state: RwLock::new(Arc::new(RegistryState::new(config))),
        }
    }

    /// Registry configured from the process environment.
    pub fn from_env() -> BindingResult<Self> {
        Ok(Self::new(BindingConfig::from_env()?))
    }

    pub fn config(&self) -> BindingResult<BindingConfig> {
        Ok(self.current()?.config.clone())
    }

    pub async fn documents(&self) -> BindingResult<Arc<dyn DocumentVersionStore>> {
        let state = self.current()?;
        state
            .provider(
                Entity::Document,
                &state.documents,
                |s| s as Arc<dyn DocumentVersionStore>,
                |l| l as Arc<dyn DocumentVersionStore>,
            )
            .await
    }

    pub async fn policies(&self) -> BindingResult<Arc<dyn PolicyStore>> {
        let state = self.current()?;
        state
            .provider(
                Entity::Policy,
                &state.policies,
                |s| s as Arc<dyn PolicyStore>,
                |l| l as Arc<dyn PolicyStore>,
            )
            .await
    }

    pub async fn committees(&self) -> BindingResult<Arc<dyn CommitteeStore>> {
        let state = self.current()?;
        state
            .provider(
                Entity::Committee,
                &state.committees,
                |s| s as Arc<dyn CommitteeStore>,
                |l| l as Arc<dyn CommitteeStore>,
            )
            .await
    }

    pub async fn audit(&self) -> BindingResult<Arc<dyn AuditStore>> {
        let state = self.current()?;
        state
            .provider(
                Entity::Audit,
                &state.audit,
                |s| s as Arc<dyn AuditStore>,
                |l| l as Arc<dyn AuditStore>,
            )
            .await
    }

    pub async fn search(&self) -> BindingResult<Arc<dyn SearchStore>> {
        let state = self.current()?;
        state
            .provider(
                Entity::Search,
                &state.search,
                |s| s as Arc<dyn SearchStore>,
                |l| l as Arc<dyn SearchStore>,
            )
            .await
    }

    pub fn diagnostics(&self) -> BindingResult<BindingDiagnostics> {
        Ok(diagnose(&self.current()?.config))
    }

    /// Drop every memoized provider, keeping the configuration.
    ///
    /// Callers still holding a provider keep using it; it is not shared with
    /// providers built afterwards.
    pub fn reset(&self) -> BindingResult<()> {
        let config = self.current()?.config.clone();
        self.rebuild(config)
    }

    /// Swap in a new configuration and drop every memoized provider.
    pub fn rebuild(&self, config: BindingConfig) -> BindingResult<()> {
        let mut guard = self
            .state
            .write()
            .map_err(|_| BindingError::Unavailable("registry lock poisoned".to_string()))?;
        *guard = Arc::new(RegistryState::new(config));
        debug!("provider registry rebuilt");
        Ok(())
    }

    fn current(&self) -> BindingResult<Arc<RegistryState>> {
        self.state
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| BindingError::Unavailable("registry lock poisoned".to_string()))
    }
}

impl RegistryState {
    fn new(config: BindingConfig) -> Self {
        Self {
            config,
            synthetic: OnceCell::new(),
            live: OnceCell::new(),
            documents: OnceCell::new(),
            policies: OnceCell::new(),
            committees: OnceCell::new(),
            audit: OnceCell::new(),
            search: OnceCell::new(),
        }
    }

    async fn provider<T: ?Sized>(
        &self,
        entity: Entity,
        cell: &OnceCell<Arc<T>>,
        from_synthetic: fn(Arc<InMemoryGovernanceStore>) -> Arc<T>,
        from_live: fn(Arc<PostgresGovernanceStore>) -> Arc<T>,
    ) -> BindingResult<Arc<T>> {
        cell.get_or_try_init(|| async move {
            let mode = self.config.mode(entity);
            let provider = match mode {
                BindingMode::Synthetic => from_synthetic(self.synthetic_store().await?),
                BindingMode::Mapped => return Err(BindingError::MappedNotImplemented(entity)),
                BindingMode::Live => from_live(self.live_store().await?),
            };
            info!(%entity, %mode, "constructed provider");
            Ok::<_, BindingError>(provider)
        })
        .await
        .cloned()
    }

    async fn synthetic_store(&self) -> BindingResult<Arc<InMemoryGovernanceStore>> {
        self.synthetic
            .get_or_try_init(|| async move {
                let store = InMemoryGovernanceStore::new();
                seed_synthetic(&store).await?;
                Ok::<_, BindingError>(Arc::new(store))
            })
            .await
            .cloned()
    }

    async fn live_store(&self) -> BindingResult<Arc<PostgresGovernanceStore>> {
        self.live
            .get_or_try_init(|| async move {
                let url = self.config.database_url.as_deref().ok_or_else(|| {
                    BindingError::Config("live binding requires DATABASE_URL".to_string())
                })?;
                let pool = self.config.pool;
                let store = PostgresGovernanceStore::connect_with_options(
                    url,
                    pool.max_connections,
                    pool.connect_timeout_secs,
                )
                .await?;
                Ok::<_, BindingError>(Arc::new(store))
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderModes;
    use spm_storage::{QueryWindow, SYNTHETIC_TENANT};
    use spm_types::TenantId;

    #[tokio::test]
    async fn synthetic_providers_share_one_store() {
        let registry = ProviderRegistry::new(BindingConfig::synthetic());
        let tenant = TenantId::new(SYNTHETIC_TENANT);

        let policies = registry.policies().await.unwrap();
        let search = registry.search().await.unwrap();

        let listed = policies
            .list_policies(&tenant, QueryWindow::default())
            .await
            .unwrap();
        let hits = search.search(&tenant, "clawback", 0).await.unwrap();
        assert_eq!(listed.len(), 3);
        assert!(!hits.is_empty());
    }

    #[tokio::test]
    async fn providers_are_memoized_until_reset() {
        let registry = ProviderRegistry::new(BindingConfig::synthetic());

        let first = registry.documents().await.unwrap();
        let second = registry.documents().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        registry.reset().unwrap();
        let third = registry.documents().await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn mapped_mode_fails_fast() {
        let mut providers = ProviderModes::uniform(BindingMode::Synthetic);
        providers.committee = BindingMode::Mapped;
        let registry = ProviderRegistry::new(BindingConfig {
            providers,
            ..BindingConfig::default()
        });

        assert!(matches!(
            registry.committees().await,
            Err(BindingError::MappedNotImplemented(Entity::Committee))
        ));
        assert!(registry.policies().await.is_ok());
    }

    #[tokio::test]
    async fn live_without_database_url_is_a_config_error() {
        let registry = ProviderRegistry::new(BindingConfig {
            providers: ProviderModes::uniform(BindingMode::Live),
            ..BindingConfig::default()
        });

        assert!(matches!(
            registry.audit().await,
            Err(BindingError::Config(_))
        ));
    }

    #[tokio::test]
    async fn rebuild_swaps_configuration() {
        let registry = ProviderRegistry::new(BindingConfig::synthetic());
        let mut providers = ProviderModes::uniform(BindingMode::Synthetic);
        providers.search = BindingMode::Mapped;

        registry
            .rebuild(BindingConfig {
                providers,
                ..BindingConfig::default()
            })
            .unwrap();

        assert_eq!(
            registry.config().unwrap().mode(Entity::Search),
            BindingMode::Mapped
        );
        assert!(registry.search().await.is_err());
    }
}
