//! Gate decisions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of evaluating a feature policy.
///
/// Blocked outcomes are expected results, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Render the feature unchanged
    Allowed,
    /// Show the consent fallback
    ConsentRequired,
    /// Show the sign-in fallback
    AuthRequired,
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }

    pub fn is_blocked(&self) -> bool {
        !self.is_allowed()
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Allowed => write!(f, "allowed"),
            GateDecision::ConsentRequired => write!(f, "consent_required"),
            GateDecision::AuthRequired => write!(f, "auth_required"),
        }
    }
}
