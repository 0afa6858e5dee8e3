//! Mirror of the provider's identity session.

use featuregate_types::{
    AuthEvent, AuthEventKind, IdentitySession, SessionSnapshot, StateChannel, Subscription,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::provider::IdentityProvider;

/// Latest known identity session, kept current by a background mirror task.
pub struct SessionState {
    provider: Arc<dyn IdentityProvider>,
    snapshot: StateChannel<SessionSnapshot>,
    mirror: Mutex<Option<JoinHandle<()>>>,
}

impl SessionState {
    /// Fetch the current session and start following the provider.
    ///
    /// The change stream is opened before the fetch and its buffered events
    /// are applied after the initial value, so a transition racing the fetch
    /// is never lost. Provider failures leave the session signed out.
    pub async fn start(provider: Arc<dyn IdentityProvider>) -> Self {
        let snapshot = StateChannel::new(SessionSnapshot::signed_out());

        let events = provider.subscribe().await;

        match provider.current_session().await {
            Ok(session) => {
                info!(
                    authenticated = session.is_some(),
                    "Initial identity session fetched"
                );
                snapshot.publish(SessionSnapshot {
                    event: AuthEventKind::InitialSession,
                    session,
                });
            }
            Err(e) => {
                warn!(error = %e, "Initial session fetch failed; treating user as signed out");
            }
        }

        let mirror = match events {
            Ok(rx) => Some(tokio::spawn(mirror_events(rx, snapshot.clone()))),
            Err(e) => {
                warn!(error = %e, "Session change stream unavailable");
                None
            }
        };

        Self {
            provider,
            snapshot,
            mirror: Mutex::new(mirror),
        }
    }

    /// Current session, if signed in.
    pub fn current(&self) -> Option<IdentitySession> {
        self.snapshot.latest().session
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot.latest().is_authenticated()
    }

    /// Current session with the event that produced it.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.latest()
    }

    /// Subscribe to session changes. The value in effect now is delivered first.
    pub fn subscribe(&self) -> Subscription<SessionSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn channel(&self) -> &StateChannel<SessionSnapshot> {
        &self.snapshot
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Whether the mirror task is still following the provider.
    pub fn is_mirroring(&self) -> bool {
        self.mirror
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop following the provider. The last mirrored value is kept. Idempotent.
    pub async fn shutdown(&self) {
        let handle = self.mirror.lock().take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
            info!("Session mirror stopped");
        }
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        if let Some(handle) = self.mirror.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("snapshot", &self.snapshot.latest())
            .finish()
    }
}

async fn mirror_events(
    mut rx: mpsc::Receiver<AuthEvent>,
    snapshot: StateChannel<SessionSnapshot>,
) {
    while let Some(event) = rx.recv().await {
        match event.kind {
            AuthEventKind::SignedIn | AuthEventKind::SignedOut => {
                info!(
                    event = ?event.kind,
                    authenticated = event.session.is_some(),
                    "Session changed"
                );
            }
            _ => {
                debug!(
                    event = ?event.kind,
                    authenticated = event.session.is_some(),
                    "Session event"
                );
            }
        }
        snapshot.publish(SessionSnapshot::from(event));
    }
    debug!("Session change stream ended");
}
