//! Gate composition.
//!
//! [`GateComposer::compose`] wraps content in a [`ComposedGate`] that renders
//! either the content or a fallback. [`GateComposer::mount`] additionally
//! binds the gate to the live consent and session channels.

use featuregate_types::{
    ConsentDecision, FeaturePolicy, GateDecision, IdentitySession, SessionSnapshot,
    StateChannel, Subscription,
};
use std::sync::Arc;
use tracing::debug;

use crate::catalogue::PolicyCatalogue;
use crate::error::Result;
use crate::guard::{Guard, GuardChain};
use crate::presenter::{FallbackDescriptor, PresenterCopy, PromptPresenter};

/// Result of rendering a gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<C> {
    /// Access allowed; the content, unchanged
    Content(C),
    /// Access blocked; what to show instead
    Fallback(FallbackDescriptor),
}

impl<C> Rendered<C> {
    pub fn decision(&self) -> GateDecision {
        match self {
            Rendered::Content(_) => GateDecision::Allowed,
            Rendered::Fallback(fallback) => fallback.decision,
        }
    }

    pub fn is_content(&self) -> bool {
        matches!(self, Rendered::Content(_))
    }

    pub fn content(self) -> Option<C> {
        match self {
            Rendered::Content(content) => Some(content),
            Rendered::Fallback(_) => None,
        }
    }

    pub fn fallback(&self) -> Option<&FallbackDescriptor> {
        match self {
            Rendered::Content(_) => None,
            Rendered::Fallback(fallback) => Some(fallback),
        }
    }
}

/// Builds gates from the policy catalogue.
#[derive(Debug, Clone)]
pub struct GateComposer {
    catalogue: Arc<PolicyCatalogue>,
    presenter: PromptPresenter,
    consent: StateChannel<ConsentDecision>,
    session: StateChannel<SessionSnapshot>,
}

impl GateComposer {
    pub fn new(
        catalogue: Arc<PolicyCatalogue>,
        consent: StateChannel<ConsentDecision>,
        session: StateChannel<SessionSnapshot>,
    ) -> Self {
        Self {
            catalogue,
            presenter: PromptPresenter::default(),
            consent,
            session,
        }
    }

    pub fn with_copy(mut self, copy: PresenterCopy) -> Self {
        self.presenter = PromptPresenter::new(copy);
        self
    }

    pub fn catalogue(&self) -> &PolicyCatalogue {
        &self.catalogue
    }

    pub fn presenter(&self) -> &PromptPresenter {
        &self.presenter
    }

    /// Wrap `content` in the gate for `feature_id`.
    ///
    /// Fails fast if the feature is not in the catalogue.
    pub fn compose<C>(&self, feature_id: &str, content: C) -> Result<ComposedGate<C>> {
        let policy = self.catalogue.resolve(feature_id)?.clone();
        Ok(ComposedGate {
            chain: GuardChain::for_policy(&policy),
            policy,
            presenter: self.presenter.clone(),
            content,
        })
    }

    /// Evaluate a feature against the latest consent and session.
    pub fn decide(&self, feature_id: &str) -> Result<GateDecision> {
        let policy = self.catalogue.resolve(feature_id)?;
        let consent = self.consent.latest();
        let snapshot = self.session.latest();
        let decision =
            GuardChain::for_policy(policy).evaluate(&consent, snapshot.session.as_ref());
        debug!(feature = %policy.feature_id, decision = %decision, "Gate evaluated");
        Ok(decision)
    }

    /// Compose a gate and bind it to the live consent and session.
    pub fn mount<C>(&self, feature_id: &str, content: C) -> Result<FeatureGate<C>> {
        let gate = self.compose(feature_id, content)?;
        Ok(FeatureGate::mount(
            gate,
            self.consent.clone(),
            self.session.clone(),
        ))
    }
}

/// Content guarded by a feature's guard chain.
#[derive(Debug, Clone)]
pub struct ComposedGate<C> {
    policy: FeaturePolicy,
    chain: GuardChain,
    presenter: PromptPresenter,
    content: C,
}

impl<C> ComposedGate<C> {
    /// Attach an extra guard. Order of attachment does not matter.
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.chain.add(guard);
        self
    }

    pub fn policy(&self) -> &FeaturePolicy {
        &self.policy
    }

    pub fn guards(&self) -> &GuardChain {
        &self.chain
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn decide(
        &self,
        consent: &ConsentDecision,
        session: Option<&IdentitySession>,
    ) -> GateDecision {
        let decision = self.chain.evaluate(consent, session);
        debug!(feature = %self.policy.feature_id, decision = %decision, "Gate evaluated");
        decision
    }

    /// Render against explicit inputs. Pure and synchronous.
    pub fn render(
        &self,
        consent: &ConsentDecision,
        session: Option<&IdentitySession>,
    ) -> Rendered<&C> {
        let decision = self.decide(consent, session);
        match self.presenter.present(decision, &self.policy) {
            None => Rendered::Content(&self.content),
            Some(fallback) => Rendered::Fallback(fallback),
        }
    }
}

/// A gate bound to live consent and session state.
///
/// Re-evaluates on every read. [`changed`](Self::changed) waits for the next
/// consent or session notification.
pub struct FeatureGate<C> {
    gate: ComposedGate<C>,
    consent: StateChannel<ConsentDecision>,
    session: StateChannel<SessionSnapshot>,
    consent_updates: Option<Subscription<ConsentDecision>>,
    session_updates: Option<Subscription<SessionSnapshot>>,
}

impl<C> FeatureGate<C> {
    fn mount(
        gate: ComposedGate<C>,
        consent: StateChannel<ConsentDecision>,
        session: StateChannel<SessionSnapshot>,
    ) -> Self {
        let mut consent_updates = consent.subscribe();
        let mut session_updates = session.subscribe();

        // Drop the replayed values; reads always use the latest anyway.
        consent_updates.latest_pending();
        session_updates.latest_pending();

        debug!(feature = %gate.policy.feature_id, "Gate mounted");
        Self {
            gate,
            consent,
            session,
            consent_updates: Some(consent_updates),
            session_updates: Some(session_updates),
        }
    }

    pub fn gate(&self) -> &ComposedGate<C> {
        &self.gate
    }

    pub fn policy(&self) -> &FeaturePolicy {
        &self.gate.policy
    }

    /// Decision against the latest consent and session.
    pub fn decision(&self) -> GateDecision {
        let snapshot = self.session.latest();
        self.gate.decide(&self.consent.latest(), snapshot.session.as_ref())
    }

    /// Render against the latest consent and session.
    pub fn render(&self) -> Rendered<&C> {
        let snapshot = self.session.latest();
        self.gate.render(&self.consent.latest(), snapshot.session.as_ref())
    }

    /// Wait for the next consent or session notification, then re-evaluate.
    ///
    /// Returns `None` once unmounted or when both sources are gone.
    pub async fn changed(&mut self) -> Option<GateDecision> {
        let (Some(consent), Some(session)) =
            (self.consent_updates.as_mut(), self.session_updates.as_mut())
        else {
            return None;
        };

        tokio::select! {
            Some(_) = consent.recv() => {}
            Some(_) = session.recv() => {}
            else => return None,
        }

        Some(self.decision())
    }

    pub fn is_mounted(&self) -> bool {
        self.consent_updates.is_some()
    }

    /// Stop following consent and session. Idempotent.
    pub fn unmount(&mut self) {
        let had_consent = self.consent_updates.take().map(|mut sub| sub.unsubscribe());
        let had_session = self.session_updates.take().map(|mut sub| sub.unsubscribe());
        if had_consent.is_some() || had_session.is_some() {
            debug!(feature = %self.gate.policy.feature_id, "Gate unmounted");
        }
    }
}

impl<C> Drop for FeatureGate<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<C> std::fmt::Debug for FeatureGate<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureGate")
            .field("feature", &self.gate.policy.feature_id)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
