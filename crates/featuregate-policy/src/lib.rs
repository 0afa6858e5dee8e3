//! # featuregate-policy
//!
//! Decides, per feature, whether content renders or a fallback shows.
//!
//! ## Overview
//!
//! - [`PolicyCatalogue`]: validated table of feature policies
//! - [`GuardChain`]: a feature's requirements as ordered [`Guard`]s
//! - [`GateComposer`]: wraps content in a [`ComposedGate`] or mounts a live [`FeatureGate`]
//! - [`PromptPresenter`]: copy and action for blocked features
//!
//! ## Evaluation order
//!
//! 1. Sign-in, if required. No session means `AuthRequired`.
//! 2. Marketing consent, if required and the feature is not always visible.
//! 3. Otherwise `Allowed`.

#![deny(unsafe_code)]

pub mod catalogue;
pub mod composer;
pub mod error;
pub mod guard;
pub mod presenter;

pub use catalogue::{PolicyCatalogue, PolicyCatalogueBuilder};
pub use composer::{ComposedGate, FeatureGate, GateComposer, Rendered};
pub use error::{CatalogueError, PolicyError, Result};
pub use guard::{Guard, GuardChain};
pub use presenter::{
    ActionDispatcher, FallbackAction, FallbackDescriptor, PresenterCopy, PromptPresenter,
};

pub use featuregate_types::{FeatureId, FeaturePolicy, GateDecision};
