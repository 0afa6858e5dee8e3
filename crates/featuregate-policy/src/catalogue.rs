//! The static table of feature policies.

use featuregate_types::FeaturePolicy;
use std::collections::HashMap;

use crate::error::{CatalogueError, PolicyError, Result};

/// Validated, immutable table of feature policies.
///
/// Built once at startup. Lookups by unknown id fail with
/// [`PolicyError::UnknownFeature`].
#[derive(Debug, Clone, Default)]
pub struct PolicyCatalogue {
    policies: Vec<FeaturePolicy>,
    index: HashMap<String, usize>,
}

impl PolicyCatalogue {
    pub fn builder() -> PolicyCatalogueBuilder {
        PolicyCatalogueBuilder::default()
    }

    /// Build a catalogue from policies, keeping their order.
    pub fn from_entries(
        entries: impl IntoIterator<Item = FeaturePolicy>,
    ) -> std::result::Result<Self, CatalogueError> {
        let mut policies = Vec::new();
        let mut index = HashMap::new();

        for policy in entries {
            if policy.feature_id.is_empty() {
                return Err(CatalogueError::EmptyFeatureId);
            }
            let key = policy.feature_id.as_str().to_string();
            if index.contains_key(&key) {
                return Err(CatalogueError::DuplicateFeature(policy.feature_id));
            }
            index.insert(key, policies.len());
            policies.push(policy);
        }

        Ok(Self { policies, index })
    }

    /// Look up the policy for a feature.
    pub fn resolve(&self, feature_id: &str) -> Result<&FeaturePolicy> {
        self.index
            .get(feature_id)
            .map(|&i| &self.policies[i])
            .ok_or_else(|| PolicyError::UnknownFeature(feature_id.to_string()))
    }

    pub fn contains(&self, feature_id: &str) -> bool {
        self.index.contains_key(feature_id)
    }

    /// Policies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FeaturePolicy> {
        self.policies.iter()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl<'a> IntoIterator for &'a PolicyCatalogue {
    type Item = &'a FeaturePolicy;
    type IntoIter = std::slice::Iter<'a, FeaturePolicy>;

    fn into_iter(self) -> Self::IntoIter {
        self.policies.iter()
    }
}

/// Builder for [`PolicyCatalogue`].
#[derive(Debug, Default)]
pub struct PolicyCatalogueBuilder {
    entries: Vec<FeaturePolicy>,
}

impl PolicyCatalogueBuilder {
    pub fn register(mut self, policy: FeaturePolicy) -> Self {
        self.entries.push(policy);
        self
    }

    /// Validate and freeze the table.
    pub fn build(self) -> std::result::Result<PolicyCatalogue, CatalogueError> {
        PolicyCatalogue::from_entries(self.entries)
    }
}
