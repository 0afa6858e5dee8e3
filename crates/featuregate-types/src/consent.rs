//! Consent decision types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of data processing a user can consent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentCategory {
    /// Processing required for the app to function. Always granted.
    Essential,
    /// Marketing, analytics and personalisation.
    Marketing,
}

impl fmt::Display for ConsentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsentCategory::Essential => write!(f, "essential"),
            ConsentCategory::Marketing => write!(f, "marketing"),
        }
    }
}

/// The user's consent decision.
///
/// Essential consent cannot be withdrawn: every constructor, including
/// deserialization, forces `essential` to `true`. Decisions are replaced
/// wholesale, never patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawConsentDecision")]
pub struct ConsentDecision {
    essential: bool,
    marketing: bool,
}

#[derive(Deserialize)]
struct RawConsentDecision {
    #[serde(default = "granted")]
    #[allow(dead_code)]
    essential: bool,
    marketing: bool,
}

fn granted() -> bool {
    true
}

impl From<RawConsentDecision> for ConsentDecision {
    fn from(raw: RawConsentDecision) -> Self {
        Self::with_marketing(raw.marketing)
    }
}

impl ConsentDecision {
    /// Decision with the given marketing choice.
    pub const fn with_marketing(marketing: bool) -> Self {
        Self {
            essential: true,
            marketing,
        }
    }

    /// Build a decision from raw flags. A `false` essential flag is ignored.
    pub const fn from_flags(_essential: bool, marketing: bool) -> Self {
        Self::with_marketing(marketing)
    }

    /// Only essential processing.
    pub const fn essential_only() -> Self {
        Self::with_marketing(false)
    }

    /// Every category granted.
    pub const fn all() -> Self {
        Self::with_marketing(true)
    }

    pub fn essential(&self) -> bool {
        self.essential
    }

    pub fn marketing(&self) -> bool {
        self.marketing
    }

    /// Whether the given category is granted.
    pub fn grants(&self, category: ConsentCategory) -> bool {
        match category {
            ConsentCategory::Essential => self.essential,
            ConsentCategory::Marketing => self.marketing,
        }
    }
}

impl Default for ConsentDecision {
    fn default() -> Self {
        Self::essential_only()
    }
}
