//! Convenience operations for sign-in screens.

use featuregate_types::{AuthProviderKind, IdentitySession};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::AuthConfig;
use crate::error::{SessionError, SessionResult};
use crate::provider::IdentityProvider;
use crate::state::SessionState;

/// Display name used when no email is known.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// Sign-in, sign-out and display helpers over a [`SessionState`].
#[derive(Debug, Clone)]
pub struct AuthHelpers {
    session: Arc<SessionState>,
    config: AuthConfig,
}

impl AuthHelpers {
    pub fn new(session: Arc<SessionState>, config: AuthConfig) -> Self {
        Self { session, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn user(&self) -> Option<IdentitySession> {
        self.session.current()
    }

    /// Local part of the signed-in email, or `"User"`.
    pub fn display_name(&self) -> String {
        self.session
            .current()
            .as_ref()
            .and_then(|s| s.display_name().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string())
    }

    /// Start a sign-in, reporting why it failed.
    pub async fn try_sign_in(&self, kind: AuthProviderKind) -> SessionResult<()> {
        if !self.config.is_provider_enabled(kind) {
            return Err(SessionError::ProviderDisabled(kind));
        }
        self.session.provider().sign_in(kind).await
    }

    /// Start a sign-in. Failures are logged; returns whether it succeeded.
    pub async fn sign_in(&self, kind: AuthProviderKind) -> bool {
        match self.try_sign_in(kind).await {
            Ok(()) => {
                info!(provider = %kind, "Sign-in completed");
                true
            }
            Err(e) => {
                error!(provider = %kind, error = %e, "Sign in failed");
                false
            }
        }
    }

    /// Sign out. Failures are logged; returns whether it succeeded.
    pub async fn sign_out(&self) -> bool {
        match self.session.provider().sign_out().await {
            Ok(()) => {
                info!("Sign-out completed");
                true
            }
            Err(e) => {
                error!(error = %e, "Sign out failed");
                false
            }
        }
    }
}
