//! In-process identity provider for tests and demos.

use async_trait::async_trait;
use featuregate_types::{AuthEvent, AuthProviderKind, IdentitySession};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;

use crate::error::{SessionError, SessionResult};
use crate::provider::IdentityProvider;

const STREAM_CAPACITY: usize = 64;

/// Mock identity provider.
///
/// Sign-in succeeds immediately with a fixed user and is broadcast on every
/// open change stream. Failures can be switched on per operation.
#[derive(Default)]
pub struct MockIdentityProvider {
    session: Mutex<Option<IdentitySession>>,
    subscribers: Mutex<Vec<mpsc::Sender<AuthEvent>>>,
    queued_on_subscribe: Vec<AuthEvent>,
    fail_fetch: bool,
    fail_sign_in: bool,
    fail_sign_out: bool,
    sign_in_calls: AtomicUsize,
}

impl MockIdentityProvider {
    /// Create a provider with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with an existing session.
    pub fn with_session(session: IdentitySession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
            ..Self::default()
        }
    }

    /// Make `current_session` fail.
    pub fn failing_fetch(mut self) -> Self {
        self.fail_fetch = true;
        self
    }

    pub fn failing_sign_in(mut self) -> Self {
        self.fail_sign_in = true;
        self
    }

    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    /// Deliver `event` on every stream as soon as it is opened.
    pub fn emit_on_subscribe(mut self, event: AuthEvent) -> Self {
        self.queued_on_subscribe.push(event);
        self
    }

    /// The user returned by a successful sign-in.
    pub fn mock_user(kind: AuthProviderKind) -> IdentitySession {
        IdentitySession::new("mock-user", "user@example.com", kind.to_string())
    }

    /// Number of sign-in attempts received.
    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// Number of open change streams.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Record `event` as the provider's state and broadcast it.
    pub async fn emit(&self, event: AuthEvent) {
        *self.session.lock() = event.session.clone();

        let senders: Vec<_> = {
            let mut subscribers = self.subscribers.lock();
            subscribers.retain(|tx| !tx.is_closed());
            subscribers.clone()
        };

        for tx in senders {
            let _ = tx.send(event.clone()).await;
        }
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn current_session(&self) -> SessionResult<Option<IdentitySession>> {
        if self.fail_fetch {
            return Err(SessionError::Provider("mock session fetch failure".into()));
        }
        Ok(self.session.lock().clone())
    }

    async fn subscribe(&self) -> SessionResult<mpsc::Receiver<AuthEvent>> {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        for event in &self.queued_on_subscribe {
            let _ = tx.try_send(event.clone());
        }
        self.subscribers.lock().push(tx);
        Ok(rx)
    }

    async fn sign_in(&self, kind: AuthProviderKind) -> SessionResult<()> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_in {
            return Err(SessionError::Provider("mock sign-in failure".into()));
        }
        self.emit(AuthEvent::signed_in(Self::mock_user(kind))).await;
        Ok(())
    }

    async fn sign_out(&self) -> SessionResult<()> {
        if self.fail_sign_out {
            return Err(SessionError::Provider("mock sign-out failure".into()));
        }
        self.emit(AuthEvent::signed_out()).await;
        Ok(())
    }
}
