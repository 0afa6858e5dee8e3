//! Feature identifiers and their gating policies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FeatureId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Gating requirements for one feature.
///
/// `always_visible` disables the consent check only. Sign-in is enforced
/// whenever `requires_signed_in` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturePolicy {
    /// Feature identifier
    pub feature_id: FeatureId,

    /// Human-readable feature name shown in fallback prompts
    #[serde(default)]
    pub title: Option<String>,

    /// Skip the consent check for this feature
    #[serde(default)]
    pub always_visible: bool,

    /// Marketing consent required to access the feature
    #[serde(default)]
    pub requires_marketing_consent: bool,

    /// Signed-in session required to access the feature
    #[serde(default)]
    pub requires_signed_in: bool,

    /// Replacement body text for the consent fallback
    #[serde(default)]
    pub consent_message: Option<String>,
}

impl FeaturePolicy {
    /// Policy with no requirements.
    pub fn open(feature_id: impl Into<FeatureId>) -> Self {
        Self {
            feature_id: feature_id.into(),
            title: None,
            always_visible: false,
            requires_marketing_consent: false,
            requires_signed_in: false,
            consent_message: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn always_visible(mut self) -> Self {
        self.always_visible = true;
        self
    }

    pub fn requires_marketing_consent(mut self) -> Self {
        self.requires_marketing_consent = true;
        self
    }

    pub fn requires_signed_in(mut self) -> Self {
        self.requires_signed_in = true;
        self
    }

    pub fn with_consent_message(mut self, message: impl Into<String>) -> Self {
        self.consent_message = Some(message.into());
        self
    }

    /// Name shown to users, falling back to the identifier.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(self.feature_id.as_str())
    }

    /// Whether the consent check applies at all.
    pub fn enforces_marketing_consent(&self) -> bool {
        self.requires_marketing_consent && !self.always_visible
    }
}
