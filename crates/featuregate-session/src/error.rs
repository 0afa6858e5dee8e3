//! Error types for the session mirror and auth helpers.

use featuregate_types::AuthProviderKind;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The identity provider rejected or failed a request
    #[error("identity provider error: {0}")]
    Provider(String),

    /// Sign-in was requested for a provider switched off in configuration
    #[error("sign-in provider {0} is disabled")]
    ProviderDisabled(AuthProviderKind),

    /// The provider's change stream could not be opened or has ended
    #[error("session change stream closed")]
    StreamClosed,
}
