//! Boundary to the external identity provider.

use async_trait::async_trait;
use featuregate_types::{AuthEvent, AuthProviderKind, IdentitySession};
use tokio::sync::mpsc;

use crate::error::SessionResult;

/// An external authentication service.
///
/// The engine never speaks the provider's protocol. It asks for the current
/// session once, then follows the change stream.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// One-shot fetch of the session in effect right now.
    async fn current_session(&self) -> SessionResult<Option<IdentitySession>>;

    /// Open a change stream. Events arrive in the order the provider emits them.
    async fn subscribe(&self) -> SessionResult<mpsc::Receiver<AuthEvent>>;

    /// Start a sign-in with the given method.
    async fn sign_in(&self, kind: AuthProviderKind) -> SessionResult<()>;

    /// End the current session.
    async fn sign_out(&self) -> SessionResult<()>;
}
