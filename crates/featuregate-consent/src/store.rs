//! The consent store.
//!
//! Owns the user's consent decision. The in-memory value is authoritative the
//! moment [`ConsentStore::update`] returns; persistence happens on a
//! background writer in call order.

use featuregate_types::{ConsentCategory, ConsentDecision, StateChannel, Subscription};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::ConsentError;
use crate::storage::KeyValueStore;
use crate::writer::{PersistenceWriter, WriterStats};

/// Storage key of the consent decision.
pub const DEFAULT_CONSENT_KEY: &str = "userConsent";

/// Storage key of the custom banner's permanent dismissal flag.
pub const DEFAULT_BANNER_DISMISSED_KEY: &str = "consentBannerDismissed";

/// Consent store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentStoreConfig {
    /// Key the decision is persisted under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Key the custom banner dismissal is persisted under
    #[serde(default = "default_banner_dismissed_key")]
    pub banner_dismissed_key: String,
}

impl Default for ConsentStoreConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            banner_dismissed_key: default_banner_dismissed_key(),
        }
    }
}

fn default_storage_key() -> String {
    DEFAULT_CONSENT_KEY.to_string()
}

fn default_banner_dismissed_key() -> String {
    DEFAULT_BANNER_DISMISSED_KEY.to_string()
}

/// On-disk representation of a decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PersistedConsent {
    essential: bool,
    marketing: bool,
}

impl From<ConsentDecision> for PersistedConsent {
    fn from(decision: ConsentDecision) -> Self {
        Self {
            essential: decision.essential(),
            marketing: decision.marketing(),
        }
    }
}

/// Owner of the consent decision and the consent banner state.
pub struct ConsentStore {
    storage: Arc<dyn KeyValueStore>,
    config: ConsentStoreConfig,
    decision: StateChannel<ConsentDecision>,
    banner_visible: StateChannel<bool>,
    custom_banner_visible: AtomicBool,
    writer: PersistenceWriter,
}

impl ConsentStore {
    /// Create a store holding the default decision.
    ///
    /// Must be called within a tokio runtime: the persistence writer is
    /// spawned here. Call [`load`](Self::load) to pick up a saved decision.
    pub fn new(storage: Arc<dyn KeyValueStore>, config: ConsentStoreConfig) -> Self {
        let writer = PersistenceWriter::spawn(Arc::clone(&storage));
        Self {
            storage,
            config,
            decision: StateChannel::new(ConsentDecision::default()),
            banner_visible: StateChannel::new(true),
            custom_banner_visible: AtomicBool::new(false),
            writer,
        }
    }

    /// Create a store and load the persisted decision.
    pub async fn open(storage: Arc<dyn KeyValueStore>, config: ConsentStoreConfig) -> Self {
        let store = Self::new(storage, config);
        store.load().await;
        store
    }

    pub fn config(&self) -> &ConsentStoreConfig {
        &self.config
    }

    /// Read the persisted decision.
    ///
    /// A present, well-formed decision becomes the current value and hides
    /// the banner. A missing, unreadable or corrupt one yields the default
    /// decision and leaves the current value and banner untouched.
    pub async fn load(&self) -> ConsentDecision {
        self.writer.flush().await;

        match self.read_persisted().await {
            Ok(Some(decision)) => {
                self.decision.publish(decision);
                self.banner_visible.publish(false);
                info!(marketing = decision.marketing(), "Loaded consent decision");
                decision
            }
            Ok(None) => {
                debug!(key = %self.config.storage_key, "No persisted consent decision");
                ConsentDecision::default()
            }
            Err(error) => {
                warn!(error = %error, "Falling back to default consent decision");
                ConsentDecision::default()
            }
        }
    }

    async fn read_persisted(&self) -> Result<Option<ConsentDecision>, ConsentError> {
        let key = &self.config.storage_key;
        let raw = self
            .storage
            .get(key)
            .await
            .map_err(|source| ConsentError::PersistenceReadFailure {
                key: key.clone(),
                source,
            })?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let persisted: PersistedConsent =
            serde_json::from_str(&raw).map_err(|e| ConsentError::Corrupt {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        if !persisted.essential {
            warn!(key = %key, "Persisted consent withdrew essential consent; restoring it");
        }

        Ok(Some(ConsentDecision::from_flags(
            persisted.essential,
            persisted.marketing,
        )))
    }

    /// Replace the decision.
    ///
    /// Queues the write, then publishes the new decision and hides the
    /// banner, so a subscriber that flushes on notification finds the
    /// decision already queued. Returns the decision as stored.
    pub fn update(&self, decision: ConsentDecision) -> ConsentDecision {
        match serde_json::to_string(&PersistedConsent::from(decision)) {
            Ok(json) => {
                if let Err(error) = self.writer.enqueue(&self.config.storage_key, json) {
                    warn!(error = %error, "Consent decision not persisted");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode consent decision"),
        }

        self.decision.publish(decision);
        self.banner_visible.publish(false);
        info!(marketing = decision.marketing(), "Consent decision updated");

        decision
    }

    /// Replace the decision from raw flags. Essential consent cannot be
    /// withdrawn; a `false` essential flag is coerced to `true`.
    pub fn update_flags(&self, essential: bool, marketing: bool) -> ConsentDecision {
        if !essential {
            warn!("Attempt to withdraw essential consent ignored");
        }
        self.update(ConsentDecision::from_flags(essential, marketing))
    }

    /// Grant every category.
    pub fn accept_all(&self) -> ConsentDecision {
        let decision = self.update(ConsentDecision::all());
        self.hide_custom_banner();
        decision
    }

    /// Grant only essential processing.
    pub fn accept_essential_only(&self) -> ConsentDecision {
        let decision = self.update(ConsentDecision::essential_only());
        self.hide_custom_banner();
        decision
    }

    /// Settings toggle: keep the current decision, replace the marketing choice.
    pub fn set_marketing(&self, marketing: bool) -> ConsentDecision {
        let current = self.current();
        self.update_flags(current.essential(), marketing)
    }

    /// Current decision.
    pub fn current(&self) -> ConsentDecision {
        self.decision.latest()
    }

    /// Whether the category is granted by the current decision.
    pub fn has_consent(&self, category: ConsentCategory) -> bool {
        self.current().grants(category)
    }

    /// Whether a feature with the given marketing requirement is usable.
    pub fn is_feature_available(&self, requires_marketing: bool) -> bool {
        !requires_marketing || self.has_consent(ConsentCategory::Marketing)
    }

    /// Subscribe to decision changes. The current decision is delivered first.
    pub fn subscribe(&self) -> Subscription<ConsentDecision> {
        self.decision.subscribe()
    }

    /// Channel carrying the decision, for gate wiring.
    pub fn channel(&self) -> &StateChannel<ConsentDecision> {
        &self.decision
    }

    pub fn is_banner_visible(&self) -> bool {
        self.banner_visible.latest()
    }

    pub fn show_banner(&self) {
        self.banner_visible.publish(true);
    }

    pub fn hide_banner(&self) {
        self.banner_visible.publish(false);
    }

    pub fn subscribe_banner(&self) -> Subscription<bool> {
        self.banner_visible.subscribe()
    }

    /// Show the compact banner unless the user dismissed it for good.
    pub async fn should_show_custom_banner(&self) -> bool {
        let visible = !self.is_custom_banner_dismissed().await;
        self.custom_banner_visible.store(visible, Ordering::SeqCst);
        visible
    }

    pub fn hide_custom_banner(&self) {
        self.custom_banner_visible.store(false, Ordering::SeqCst);
    }

    pub fn is_custom_banner_visible(&self) -> bool {
        self.custom_banner_visible.load(Ordering::SeqCst)
    }

    /// Whether the compact banner was permanently dismissed.
    ///
    /// Unreadable or malformed flags count as not dismissed.
    pub async fn is_custom_banner_dismissed(&self) -> bool {
        let key = &self.config.banner_dismissed_key;
        match self.storage.get(key).await {
            Ok(Some(raw)) => serde_json::from_str::<bool>(&raw).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Ignoring malformed banner dismissal flag");
                false
            }),
            Ok(None) => false,
            Err(source) => {
                let error = ConsentError::PersistenceReadFailure {
                    key: key.clone(),
                    source,
                };
                warn!(error = %error, "Banner dismissal flag unreadable");
                false
            }
        }
    }

    /// Dismiss the compact banner for good. Returns whether the flag was saved.
    pub async fn dismiss_custom_banner_permanently(&self) -> bool {
        self.hide_custom_banner();
        let key = &self.config.banner_dismissed_key;
        match self.storage.set(key, "true").await {
            Ok(()) => true,
            Err(source) => {
                let error = ConsentError::PersistenceWriteFailure {
                    key: key.clone(),
                    source,
                };
                warn!(error = %error, "Banner dismissal not persisted");
                false
            }
        }
    }

    /// Wait for every queued write to be attempted.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    /// Persistence counters.
    pub fn writer_stats(&self) -> &WriterStats {
        self.writer.stats()
    }

    /// Flush pending writes and stop the writer. Idempotent.
    pub async fn shutdown(&self) {
        self.writer.shutdown().await;
        info!("Consent store shut down");
    }
}

impl std::fmt::Debug for ConsentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentStore")
            .field("config", &self.config)
            .field("decision", &self.current())
            .field("banner_visible", &self.is_banner_visible())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StorageError, StorageResult};
    use crate::storage::InMemoryKeyValueStore;
    use async_trait::async_trait;
    use proptest::prelude::*;

    /// Backend that fails every operation.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Unavailable("disk offline".into()))
        }

        async fn set(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Unavailable("disk offline".into()))
        }

        async fn remove(&self, _key: &str) -> StorageResult<bool> {
            Err(StorageError::Unavailable("disk offline".into()))
        }
    }

    fn memory() -> Arc<InMemoryKeyValueStore> {
        Arc::new(InMemoryKeyValueStore::new())
    }

    #[tokio::test]
    async fn test_load_without_saved_decision_returns_default() {
        let store = ConsentStore::new(memory(), ConsentStoreConfig::default());

        let decision = store.load().await;
        assert_eq!(decision, ConsentDecision::essential_only());
        assert!(store.is_banner_visible());
    }

    #[tokio::test]
    async fn test_load_reads_saved_decision_and_hides_banner() {
        let backend = memory();
        backend
            .set(DEFAULT_CONSENT_KEY, r#"{"essential":true,"marketing":true}"#)
            .await
            .unwrap();

        let store = ConsentStore::new(backend, ConsentStoreConfig::default());
        let decision = store.load().await;

        assert!(decision.marketing());
        assert!(store.has_consent(ConsentCategory::Marketing));
        assert!(!store.is_banner_visible());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_subscriber_flushing_on_update_sees_stored_decision() {
        let backend = memory();
        let store = Arc::new(ConsentStore::new(backend.clone(), ConsentStoreConfig::default()));
        let mut updates = store.subscribe();
        updates.recv().await;

        let observer = {
            let store = Arc::clone(&store);
            let backend = Arc::clone(&backend);
            tokio::spawn(async move {
                let seen = updates.recv().await.unwrap();
                store.flush().await;
                (seen, backend.get(DEFAULT_CONSENT_KEY).await.unwrap())
            })
        };

        store.accept_all();
        let (seen, stored) = observer.await.unwrap();

        assert_eq!(seen, ConsentDecision::all());
        let stored: ConsentDecision = serde_json::from_str(&stored.unwrap()).unwrap();
        assert_eq!(stored, ConsentDecision::all());
    }

    #[tokio::test]
    async fn test_corrupt_decision_falls_back_to_default() {
        let backend = memory();
        backend.set(DEFAULT_CONSENT_KEY, "{not json").await.unwrap();

        let store = ConsentStore::new(backend, ConsentStoreConfig::default());
        let decision = store.load().await;

        assert_eq!(decision, ConsentDecision::default());
        assert!(store.is_banner_visible());
    }

    #[tokio::test]
    async fn test_persisted_essential_false_is_coerced() {
        let backend = memory();
        backend
            .set(DEFAULT_CONSENT_KEY, r#"{"essential":false,"marketing":true}"#)
            .await
            .unwrap();

        let store = ConsentStore::new(backend, ConsentStoreConfig::default());
        let decision = store.load().await;

        assert!(decision.essential());
        assert!(decision.marketing());
    }

    #[tokio::test]
    async fn test_read_failure_falls_back_to_default() {
        let store = ConsentStore::new(Arc::new(BrokenStore), ConsentStoreConfig::default());

        assert_eq!(store.load().await, ConsentDecision::default());
        assert!(store.is_banner_visible());
    }

    #[tokio::test]
    async fn test_update_is_immediate_and_persisted() {
        let backend = memory();
        let store = ConsentStore::new(backend.clone(), ConsentStoreConfig::default());

        store.update(ConsentDecision::all());
        assert!(store.has_consent(ConsentCategory::Marketing));
        assert!(!store.is_banner_visible());

        store.flush().await;
        let raw = backend.get(DEFAULT_CONSENT_KEY).await.unwrap().unwrap();
        assert_eq!(raw, r#"{"essential":true,"marketing":true}"#);
    }

    #[tokio::test]
    async fn test_update_flags_cannot_withdraw_essential() {
        let store = ConsentStore::new(memory(), ConsentStoreConfig::default());

        let stored = store.update_flags(false, false);
        assert!(stored.essential());
        assert!(store.has_consent(ConsentCategory::Essential));
    }

    #[tokio::test]
    async fn test_write_failure_keeps_in_memory_value() {
        let store = ConsentStore::new(Arc::new(BrokenStore), ConsentStoreConfig::default());

        store.accept_all();
        store.flush().await;

        assert!(store.current().marketing());
        assert_eq!(store.writer_stats().failed(), 1);
        assert_eq!(store.writer_stats().completed(), 0);
    }

    #[tokio::test]
    async fn test_last_write_wins_in_storage() {
        let backend = memory();
        let store = ConsentStore::new(backend.clone(), ConsentStoreConfig::default());

        store.accept_all();
        store.accept_essential_only();
        store.set_marketing(true);
        store.set_marketing(false);

        let reloaded = store.load().await;
        assert_eq!(reloaded, ConsentDecision::essential_only());
        assert_eq!(store.writer_stats().completed(), 4);
    }

    #[tokio::test]
    async fn test_subscribers_see_current_then_updates() {
        let store = ConsentStore::new(memory(), ConsentStoreConfig::default());
        let mut sub = store.subscribe();

        assert_eq!(sub.recv().await, Some(ConsentDecision::essential_only()));

        store.accept_all();
        assert_eq!(sub.recv().await, Some(ConsentDecision::all()));

        sub.unsubscribe();
        sub.unsubscribe();
        store.accept_essential_only();
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_feature_availability_follows_marketing() {
        let store = ConsentStore::new(memory(), ConsentStoreConfig::default());

        assert!(store.is_feature_available(false));
        assert!(!store.is_feature_available(true));

        store.set_marketing(true);
        assert!(store.is_feature_available(true));
    }

    #[tokio::test]
    async fn test_banner_can_be_reopened() {
        let store = ConsentStore::new(memory(), ConsentStoreConfig::default());
        let mut banner = store.subscribe_banner();
        assert_eq!(banner.recv().await, Some(true));

        store.accept_essential_only();
        assert_eq!(banner.recv().await, Some(false));

        store.show_banner();
        assert!(store.is_banner_visible());
        assert_eq!(banner.recv().await, Some(true));

        store.hide_banner();
        assert!(!store.is_banner_visible());
    }

    #[tokio::test]
    async fn test_custom_banner_dismissal_survives_reopen() {
        let backend = memory();
        let store = ConsentStore::new(backend.clone(), ConsentStoreConfig::default());

        assert!(store.should_show_custom_banner().await);
        assert!(store.is_custom_banner_visible());

        assert!(store.dismiss_custom_banner_permanently().await);
        assert!(!store.is_custom_banner_visible());

        let reopened = ConsentStore::open(backend, ConsentStoreConfig::default()).await;
        assert!(reopened.is_custom_banner_dismissed().await);
        assert!(!reopened.should_show_custom_banner().await);
    }

    #[tokio::test]
    async fn test_custom_banner_dismissal_failure_reports_false() {
        let store = ConsentStore::new(Arc::new(BrokenStore), ConsentStoreConfig::default());

        assert!(!store.dismiss_custom_banner_permanently().await);
        assert!(store.should_show_custom_banner().await);
    }

    #[tokio::test]
    async fn test_custom_storage_keys() {
        let backend = memory();
        let config = ConsentStoreConfig {
            storage_key: "consent.v2".into(),
            banner_dismissed_key: "banner.v2".into(),
        };
        let store = ConsentStore::new(backend.clone(), config);

        store.accept_all();
        store.flush().await;

        assert!(backend.contains("consent.v2").await.unwrap());
        assert!(!backend.contains(DEFAULT_CONSENT_KEY).await.unwrap());
    }

    #[tokio::test]
    async fn test_shutdown_drains_pending_writes() {
        let backend = memory();
        let store = ConsentStore::new(backend.clone(), ConsentStoreConfig::default());

        store.accept_all();
        store.shutdown().await;
        store.shutdown().await;

        assert!(backend.contains(DEFAULT_CONSENT_KEY).await.unwrap());
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn prop_update_then_load_round_trips(
            essential in any::<bool>(),
            marketing in any::<bool>(),
        ) {
            let rt = runtime();
            let loaded = rt.block_on(async {
                let backend = memory();
                let store = ConsentStore::new(backend.clone(), ConsentStoreConfig::default());
                store.update_flags(essential, marketing);
                store.shutdown().await;

                let fresh = ConsentStore::new(backend, ConsentStoreConfig::default());
                fresh.load().await
            });

            prop_assert!(loaded.essential());
            prop_assert_eq!(loaded.marketing(), marketing);
        }

        #[test]
        fn prop_repeated_update_is_idempotent(marketing in any::<bool>()) {
            let rt = runtime();
            let (once, twice) = rt.block_on(async {
                let single = memory();
                let a = ConsentStore::new(single.clone(), ConsentStoreConfig::default());
                a.update(ConsentDecision::with_marketing(marketing));
                a.flush().await;

                let double = memory();
                let b = ConsentStore::new(double.clone(), ConsentStoreConfig::default());
                b.update(ConsentDecision::with_marketing(marketing));
                b.update(ConsentDecision::with_marketing(marketing));
                b.flush().await;

                (
                    (a.current(), single.get(DEFAULT_CONSENT_KEY).await.unwrap()),
                    (b.current(), double.get(DEFAULT_CONSENT_KEY).await.unwrap()),
                )
            });

            prop_assert_eq!(once, twice);
        }
    }
}
