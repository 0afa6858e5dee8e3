//! Fallback prompts for blocked features.
//!
//! The presenter only describes what to show. The caller decides when to run
//! the primary action and hands it to an [`ActionDispatcher`].

use async_trait::async_trait;
use featuregate_types::{FeatureId, FeaturePolicy, GateDecision};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// What the fallback's button does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackAction {
    /// Start the sign-in flow
    SignIn,
    /// Open the consent settings screen
    OpenConsentSettings,
}

/// Everything needed to draw a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackDescriptor {
    pub feature_id: FeatureId,
    pub decision: GateDecision,
    /// Feature name shown under the headline
    pub title: String,
    pub headline: String,
    pub body: String,
    pub primary_action: FallbackAction,
    pub action_label: String,
    /// Label for the action while it is in flight, when it has one
    pub pending_label: Option<String>,
}

impl FallbackDescriptor {
    /// Hand the primary action to a dispatcher.
    pub async fn dispatch(&self, dispatcher: &dyn ActionDispatcher) {
        dispatcher
            .dispatch(&self.feature_id, self.primary_action)
            .await;
    }
}

/// Fallback copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterCopy {
    pub auth_headline: String,
    pub auth_body: String,
    pub auth_action_label: String,
    /// Button label while a sign-in is in flight
    pub auth_pending_label: String,
    pub consent_headline: String,
    pub consent_body: String,
    pub consent_action_label: String,
}

impl Default for PresenterCopy {
    fn default() -> Self {
        Self {
            auth_headline: "Authentication Required".to_string(),
            auth_body: "You need to sign in to access this feature. Please log in to continue."
                .to_string(),
            auth_action_label: "Sign In".to_string(),
            auth_pending_label: "Signing In...".to_string(),
            consent_headline: "Feature Restricted".to_string(),
            consent_body: "To access this feature, you must accept marketing cookies. \
                           Please update your settings in your profile."
                .to_string(),
            consent_action_label: "Go to Settings".to_string(),
        }
    }
}

/// Maps blocked decisions to fallback descriptors.
#[derive(Debug, Clone, Default)]
pub struct PromptPresenter {
    copy: Arc<PresenterCopy>,
}

impl PromptPresenter {
    pub fn new(copy: PresenterCopy) -> Self {
        Self {
            copy: Arc::new(copy),
        }
    }

    pub fn copy(&self) -> &PresenterCopy {
        &self.copy
    }

    /// Describe the fallback for `decision`, or `None` when access is allowed.
    pub fn present(
        &self,
        decision: GateDecision,
        policy: &FeaturePolicy,
    ) -> Option<FallbackDescriptor> {
        let copy = &self.copy;
        let (headline, body, primary_action, action_label, pending_label) = match decision {
            GateDecision::Allowed => return None,
            GateDecision::AuthRequired => (
                &copy.auth_headline,
                copy.auth_body.clone(),
                FallbackAction::SignIn,
                &copy.auth_action_label,
                Some(copy.auth_pending_label.clone()),
            ),
            GateDecision::ConsentRequired => (
                &copy.consent_headline,
                policy
                    .consent_message
                    .clone()
                    .unwrap_or_else(|| copy.consent_body.clone()),
                FallbackAction::OpenConsentSettings,
                &copy.consent_action_label,
                None,
            ),
        };

        Some(FallbackDescriptor {
            feature_id: policy.feature_id.clone(),
            decision,
            title: policy.display_title().to_string(),
            headline: headline.clone(),
            body,
            primary_action,
            action_label: action_label.clone(),
            pending_label,
        })
    }
}

/// Receives the action a user picked on a fallback.
///
/// Implemented by the navigation and auth collaborators.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    async fn dispatch(&self, feature_id: &FeatureId, action: FallbackAction);
}
