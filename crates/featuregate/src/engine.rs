//! The gate engine: consent, session and policy wired together.

use featuregate_consent::{
    ConsentStore, InMemoryKeyValueStore, JsonFileKeyValueStore, KeyValueStore,
};
use featuregate_policy::{ComposedGate, FallbackDescriptor, FeatureGate, GateComposer};
use featuregate_session::{AuthHelpers, IdentityProvider, SessionState};
use featuregate_types::GateDecision;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::config::{EngineConfig, StorageConfig};
use crate::error::EngineResult;

/// Owns the consent store, the session mirror and the gate composer.
///
/// Built once at startup and shared by reference. Must be started inside a
/// tokio runtime.
pub struct GateEngine {
    config: EngineConfig,
    consent: Arc<ConsentStore>,
    session: Arc<SessionState>,
    auth: AuthHelpers,
    composer: GateComposer,
    stopped: AtomicBool,
}

impl GateEngine {
    /// Start with the storage backend named in the configuration.
    pub async fn start(
        config: EngineConfig,
        provider: Arc<dyn IdentityProvider>,
    ) -> EngineResult<Self> {
        let storage: Arc<dyn KeyValueStore> = match &config.storage {
            StorageConfig::Memory => Arc::new(InMemoryKeyValueStore::new()),
            StorageConfig::File { path } => Arc::new(JsonFileKeyValueStore::new(path)),
        };
        Self::start_with_storage(config, storage, provider).await
    }

    /// Start with an explicit storage backend.
    ///
    /// The catalogue is validated before anything is spawned. The persisted
    /// consent is loaded and the initial session fetched before this returns.
    pub async fn start_with_storage(
        config: EngineConfig,
        storage: Arc<dyn KeyValueStore>,
        provider: Arc<dyn IdentityProvider>,
    ) -> EngineResult<Self> {
        let catalogue = Arc::new(config.catalogue()?);

        let consent = Arc::new(ConsentStore::open(storage, config.consent.clone()).await);
        let session = Arc::new(SessionState::start(provider).await);
        let auth = AuthHelpers::new(Arc::clone(&session), config.auth.clone());

        let composer = GateComposer::new(
            Arc::clone(&catalogue),
            consent.channel().clone(),
            session.channel().clone(),
        )
        .with_copy(config.presenter.clone());

        info!(
            features = catalogue.len(),
            authenticated = session.is_authenticated(),
            marketing = consent.current().marketing(),
            "Gate engine started"
        );

        Ok(Self {
            config,
            consent,
            session,
            auth,
            composer,
            stopped: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn consent(&self) -> &Arc<ConsentStore> {
        &self.consent
    }

    pub fn session(&self) -> &Arc<SessionState> {
        &self.session
    }

    pub fn auth(&self) -> &AuthHelpers {
        &self.auth
    }

    pub fn composer(&self) -> &GateComposer {
        &self.composer
    }

    /// Wrap content in a feature's gate.
    pub fn compose<C>(&self, feature_id: &str, content: C) -> EngineResult<ComposedGate<C>> {
        Ok(self.composer.compose(feature_id, content)?)
    }

    /// Mount a live gate for a feature.
    pub fn mount<C>(&self, feature_id: &str, content: C) -> EngineResult<FeatureGate<C>> {
        Ok(self.composer.mount(feature_id, content)?)
    }

    /// Current decision for a feature.
    pub fn decide(&self, feature_id: &str) -> EngineResult<GateDecision> {
        Ok(self.composer.decide(feature_id)?)
    }

    /// Fallback to show for a feature right now, if it is blocked.
    pub fn fallback(&self, feature_id: &str) -> EngineResult<Option<FallbackDescriptor>> {
        let decision = self.composer.decide(feature_id)?;
        let policy = self.composer.catalogue().resolve(feature_id)?;
        Ok(self.composer.presenter().present(decision, policy))
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::SeqCst)
    }

    /// Flush consent writes and stop background tasks. Idempotent.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.consent.shutdown().await;
        self.session.shutdown().await;
        info!("Gate engine stopped");
    }
}

impl std::fmt::Debug for GateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateEngine")
            .field("features", &self.composer.catalogue().len())
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use featuregate_session::MockIdentityProvider;
    use featuregate_types::FeaturePolicy;

    async fn start_default() -> GateEngine {
        GateEngine::start(EngineConfig::default(), Arc::new(MockIdentityProvider::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_with_defaults() {
        let engine = start_default().await;

        assert!(engine.is_running());
        assert_eq!(engine.decide("Home").unwrap(), GateDecision::Allowed);
        assert_eq!(engine.decide("UserProfile").unwrap(), GateDecision::AuthRequired);
        assert!(engine.consent().is_banner_visible());

        engine.shutdown().await;
        engine.shutdown().await;
        assert!(!engine.is_running());
    }

    #[tokio::test]
    async fn test_invalid_catalogue_fails_start() {
        let config = EngineConfig::default().with_features([FeaturePolicy::open("")]);
        let result = GateEngine::start(config, Arc::new(MockIdentityProvider::new())).await;

        assert!(matches!(result, Err(EngineError::Catalogue(_))));
    }

    #[tokio::test]
    async fn test_unknown_feature_is_an_error() {
        let engine = start_default().await;

        assert!(matches!(engine.decide("Billing"), Err(EngineError::Policy(_))));
        assert!(engine.mount("Billing", ()).is_err());
    }

    #[tokio::test]
    async fn test_fallback_for_blocked_feature() {
        let engine = start_default().await;

        let fallback = engine.fallback("UserProfile").unwrap().unwrap();
        assert_eq!(fallback.headline, "Authentication Required");
        assert_eq!(fallback.title, "Profile");
        assert!(engine.fallback("Home").unwrap().is_none());
    }
}
