//! Engine configuration

use featuregate_consent::ConsentStoreConfig;
use featuregate_policy::{CatalogueError, PolicyCatalogue, PresenterCopy};
use featuregate_session::AuthConfig;
use featuregate_types::FeaturePolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix, e.g. `FEATUREGATE_LOGGING__LEVEL=debug`.
pub const ENV_PREFIX: &str = "FEATUREGATE";

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Where consent is persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Consent storage keys
    #[serde(default)]
    pub consent: ConsentStoreConfig,

    /// Sign-in providers and account features
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Fallback prompt copy
    #[serde(default)]
    pub presenter: PresenterCopy,

    /// Feature policy table
    #[serde(default = "default_features", skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<FeaturePolicy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            consent: ConsentStoreConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
            presenter: PresenterCopy::default(),
            features: default_features(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// Single JSON document on disk
    File {
        /// Path of the JSON file
        path: PathBuf,
    },
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `EnvFilter` directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// The app's stock catalogue: a public home screen and a profile screen
/// that needs a signed-in user.
fn default_features() -> Vec<FeaturePolicy> {
    vec![
        FeaturePolicy::open("Home").with_title("Home").always_visible(),
        FeaturePolicy::open("UserProfile")
            .with_title("Profile")
            .always_visible()
            .requires_signed_in(),
    ]
}

impl EngineConfig {
    /// Load configuration: defaults, then the optional file, then environment.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Stock feature table comes from serde when no source provides one.
        let defaults = EngineConfig {
            features: Vec::new(),
            ..EngineConfig::default()
        };
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Validate the feature table and build the catalogue.
    pub fn catalogue(&self) -> Result<PolicyCatalogue, CatalogueError> {
        PolicyCatalogue::from_entries(self.features.iter().cloned())
    }

    /// Configuration persisting consent to `path`.
    pub fn with_file_storage(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage = StorageConfig::File { path: path.into() };
        self
    }

    /// Replace the feature table.
    pub fn with_features(mut self, features: impl IntoIterator<Item = FeaturePolicy>) -> Self {
        self.features = features.into_iter().collect();
        self
    }
}
