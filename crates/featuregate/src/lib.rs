//! # featuregate
//!
//! Decides whether each application feature may be shown, or which fallback
//! to show instead, from the user's consent decision and identity session.
//!
//! ## Overview
//!
//! - [`GateEngine`]: starts and owns the consent store, session mirror and gate composer
//! - [`EngineConfig`]: layered configuration (defaults, file, `FEATUREGATE_*` environment)
//! - [`telemetry::init_tracing`]: tracing subscriber setup
//!
//! ## Example
//!
//! ```no_run
//! use featuregate::{EngineConfig, GateEngine, GateDecision, MockIdentityProvider};
//! use std::sync::Arc;
//!
//! # async fn run() -> featuregate::EngineResult<()> {
//! let config = EngineConfig::load(None)?;
//! let engine = GateEngine::start(config, Arc::new(MockIdentityProvider::new())).await?;
//!
//! let mut profile = engine.mount("UserProfile", "profile screen")?;
//! assert_eq!(profile.decision(), GateDecision::AuthRequired);
//!
//! engine.auth().sign_in(featuregate::AuthProviderKind::Google).await;
//! assert_eq!(profile.changed().await, Some(GateDecision::Allowed));
//!
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;

pub use config::{EngineConfig, LoggingConfig, StorageConfig};
pub use engine::GateEngine;
pub use error::{EngineError, EngineResult};

pub use featuregate_consent::{
    ConsentStore, ConsentStoreConfig, InMemoryKeyValueStore, JsonFileKeyValueStore,
    KeyValueStore, StorageError,
};
pub use featuregate_policy::{
    ActionDispatcher, ComposedGate, FallbackAction, FallbackDescriptor, FeatureGate,
    GateComposer, Guard, GuardChain, PolicyCatalogue, PresenterCopy, PromptPresenter, Rendered,
};
pub use featuregate_session::{
    AuthConfig, AuthHelpers, IdentityProvider, MockIdentityProvider, SessionError, SessionState,
};
pub use featuregate_types::{
    AuthEvent, AuthEventKind, AuthProviderKind, ConsentCategory, ConsentDecision, FeatureId,
    FeaturePolicy, GateDecision, IdentitySession, SessionSnapshot,
};
