//! Guards and the guard chain evaluator.
//!
//! A feature's requirements become an explicit list of [`Guard`]s. Guards
//! run in fixed precedence order regardless of how they were added, so
//! sign-in is always checked before consent.

use featuregate_types::{
    ConsentCategory, ConsentDecision, FeaturePolicy, GateDecision, IdentitySession,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One access requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guard {
    /// An identity session must exist
    SignedIn,
    /// The consent category must be granted
    Consent(ConsentCategory),
}

impl Guard {
    /// Evaluation rank. Lower runs first.
    pub fn precedence(&self) -> u8 {
        match self {
            Guard::SignedIn => 0,
            Guard::Consent(ConsentCategory::Essential) => 1,
            Guard::Consent(ConsentCategory::Marketing) => 2,
        }
    }

    /// Decision produced when this guard fails.
    pub fn blocked_decision(&self) -> GateDecision {
        match self {
            Guard::SignedIn => GateDecision::AuthRequired,
            Guard::Consent(_) => GateDecision::ConsentRequired,
        }
    }

    pub fn passes(&self, consent: &ConsentDecision, session: Option<&IdentitySession>) -> bool {
        match self {
            Guard::SignedIn => session.is_some(),
            Guard::Consent(category) => consent.grants(*category),
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::SignedIn => write!(f, "signed_in"),
            Guard::Consent(category) => write!(f, "consent:{}", category),
        }
    }
}

/// Ordered set of guards for one feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardChain {
    guards: Vec<Guard>,
}

impl GuardChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guards implied by a policy. `always_visible` drops the consent guard.
    pub fn for_policy(policy: &FeaturePolicy) -> Self {
        let mut chain = Self::new();
        if policy.requires_signed_in {
            chain.add(Guard::SignedIn);
        }
        if policy.enforces_marketing_consent() {
            chain.add(Guard::Consent(ConsentCategory::Marketing));
        }
        chain
    }

    /// Add a guard. Adding one already present is a no-op.
    pub fn add(&mut self, guard: Guard) {
        if self.guards.contains(&guard) {
            return;
        }
        let at = self
            .guards
            .partition_point(|g| g.precedence() <= guard.precedence());
        self.guards.insert(at, guard);
    }

    pub fn with(mut self, guard: Guard) -> Self {
        self.add(guard);
        self
    }

    /// Guards in evaluation order.
    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn contains(&self, guard: Guard) -> bool {
        self.guards.contains(&guard)
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// First failing guard decides; no failures means `Allowed`.
    pub fn evaluate(
        &self,
        consent: &ConsentDecision,
        session: Option<&IdentitySession>,
    ) -> GateDecision {
        self.guards
            .iter()
            .find(|guard| !guard.passes(consent, session))
            .map(Guard::blocked_decision)
            .unwrap_or(GateDecision::Allowed)
    }
}

impl FromIterator<Guard> for GuardChain {
    fn from_iter<I: IntoIterator<Item = Guard>>(iter: I) -> Self {
        let mut chain = Self::new();
        for guard in iter {
            chain.add(guard);
        }
        chain
    }
}
