//! Sign-in provider and account feature switches.

use featuregate_types::AuthProviderKind;
use serde::{Deserialize, Serialize};

/// Settings for one sign-in method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviderConfig {
    #[serde(default)]
    pub enabled: bool,
}

impl AuthProviderConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

/// Sign-in methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviders {
    #[serde(default = "AuthProviderConfig::disabled")]
    pub email: AuthProviderConfig,

    #[serde(default = "default_google")]
    pub google: AuthProviderConfig,
}

impl Default for AuthProviders {
    fn default() -> Self {
        Self {
            email: AuthProviderConfig::disabled(),
            google: default_google(),
        }
    }
}

fn default_google() -> AuthProviderConfig {
    AuthProviderConfig::enabled()
}

/// Account management features that can be switched off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFeature {
    Registration,
    PasswordReset,
    DeleteAccount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthFeatures {
    #[serde(default = "enabled")]
    pub registration: bool,

    #[serde(default = "enabled")]
    pub password_reset: bool,

    #[serde(default = "enabled")]
    pub delete_account: bool,
}

impl Default for AuthFeatures {
    fn default() -> Self {
        Self {
            registration: true,
            password_reset: true,
            delete_account: true,
        }
    }
}

fn enabled() -> bool {
    true
}

/// Authentication configuration.
///
/// Defaults: Google sign-in on, email sign-in off, every account feature on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub providers: AuthProviders,

    #[serde(default)]
    pub features: AuthFeatures,
}

impl AuthConfig {
    pub fn provider(&self, kind: AuthProviderKind) -> &AuthProviderConfig {
        match kind {
            AuthProviderKind::Email => &self.providers.email,
            AuthProviderKind::Google => &self.providers.google,
        }
    }

    pub fn is_provider_enabled(&self, kind: AuthProviderKind) -> bool {
        self.provider(kind).enabled
    }

    pub fn is_feature_enabled(&self, feature: AuthFeature) -> bool {
        match feature {
            AuthFeature::Registration => self.features.registration,
            AuthFeature::PasswordReset => self.features.password_reset,
            AuthFeature::DeleteAccount => self.features.delete_account,
        }
    }

    /// Enabled sign-in methods, email first.
    pub fn enabled_providers(&self) -> Vec<AuthProviderKind> {
        [AuthProviderKind::Email, AuthProviderKind::Google]
            .into_iter()
            .filter(|kind| self.is_provider_enabled(*kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();

        assert!(!config.is_provider_enabled(AuthProviderKind::Email));
        assert!(config.is_provider_enabled(AuthProviderKind::Google));
        assert_eq!(config.enabled_providers(), vec![AuthProviderKind::Google]);
        assert!(config.is_feature_enabled(AuthFeature::Registration));
        assert!(config.is_feature_enabled(AuthFeature::PasswordReset));
        assert!(config.is_feature_enabled(AuthFeature::DeleteAccount));
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config: AuthConfig = serde_json::from_str(
            r#"{"providers":{"email":{"enabled":true}},"features":{"delete_account":false}}"#,
        )
        .unwrap();

        assert!(config.is_provider_enabled(AuthProviderKind::Email));
        assert!(config.is_provider_enabled(AuthProviderKind::Google));
        assert!(!config.is_feature_enabled(AuthFeature::DeleteAccount));
        assert!(config.is_feature_enabled(AuthFeature::Registration));
    }

    #[test]
    fn test_provider_credentials_are_ignored() {
        let config: AuthConfig = serde_json::from_str(
            r#"{"providers":{"google":{"enabled":false,"client_id":"abc","scopes":["email"]}}}"#,
        )
        .unwrap();

        assert_eq!(config.providers.google, AuthProviderConfig::disabled());
        assert!(config.enabled_providers().is_empty());
    }
}
