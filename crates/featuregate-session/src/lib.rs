//! # featuregate-session
//!
//! Mirrors the identity session owned by an external auth provider.
//!
//! [`SessionState::start`] fetches the current session once, then follows
//! the provider's change stream on a background task. Gates read the latest
//! value synchronously and subscribe for changes. [`AuthHelpers`] wraps the
//! provider for sign-in screens, honouring [`AuthConfig`].

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod helpers;
pub mod mocks;
pub mod provider;
pub mod state;

pub use config::{AuthConfig, AuthFeature, AuthFeatures, AuthProviderConfig, AuthProviders};
pub use error::{SessionError, SessionResult};
pub use helpers::{AuthHelpers, FALLBACK_DISPLAY_NAME};
pub use mocks::MockIdentityProvider;
pub use provider::IdentityProvider;
pub use state::SessionState;

pub use featuregate_types::{
    AuthEvent, AuthEventKind, AuthProviderKind, IdentitySession, SessionSnapshot,
};
