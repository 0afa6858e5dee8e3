//! Identity session types mirrored from the external auth provider.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An authenticated identity as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentitySession {
    /// Provider-assigned user identifier
    pub id: String,
    /// Email address of the signed-in user
    pub email: String,
    /// Provider that authenticated the user (e.g. "google")
    pub provider: String,
}

impl IdentitySession {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            provider: provider.into(),
        }
    }

    /// Local part of the email address, used as a display name.
    pub fn display_name(&self) -> Option<&str> {
        self.email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
    }
}

/// Sign-in methods the engine can ask the provider to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProviderKind {
    Email,
    Google,
}

impl fmt::Display for AuthProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthProviderKind::Email => write!(f, "email"),
            AuthProviderKind::Google => write!(f, "google"),
        }
    }
}

/// Kind of authentication state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthEventKind {
    /// Result of the one-shot fetch at startup
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A transition reported on the provider's change stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<IdentitySession>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<IdentitySession>) -> Self {
        Self { kind, session }
    }

    pub fn signed_in(session: IdentitySession) -> Self {
        Self::new(AuthEventKind::SignedIn, Some(session))
    }

    pub fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }
}

/// Latest mirrored session together with the event that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub event: AuthEventKind,
    pub session: Option<IdentitySession>,
}

impl SessionSnapshot {
    /// Snapshot before any provider value has been observed.
    pub fn signed_out() -> Self {
        Self {
            event: AuthEventKind::InitialSession,
            session: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::signed_out()
    }
}

impl From<AuthEvent> for SessionSnapshot {
    fn from(event: AuthEvent) -> Self {
        Self {
            event: event.kind,
            session: event.session,
        }
    }
}
