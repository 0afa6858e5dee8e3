//! # Featuregate Types
//!
//! Shared vocabulary for the feature gating engine.
//!
//! ## Overview
//!
//! - [`ConsentDecision`]: the user's recorded consent; essential consent is always granted
//! - [`IdentitySession`]: the authenticated identity mirrored from the auth provider
//! - [`FeaturePolicy`]: static gating requirements for one feature
//! - [`GateDecision`]: outcome of evaluating a policy against consent and session
//! - [`StateChannel`]: latest-value channel that replays the current value to new subscribers
//!
//! The consent and session services publish through [`StateChannel`], and
//! every active gate subscribes to both.

#![deny(unsafe_code)]

pub mod channel;
pub mod consent;
pub mod decision;
pub mod feature;
pub mod identity;

pub use channel::{StateChannel, Subscription, SubscriptionId};
pub use consent::{ConsentCategory, ConsentDecision};
pub use decision::GateDecision;
pub use feature::{FeatureId, FeaturePolicy};
pub use identity::{AuthEvent, AuthEventKind, AuthProviderKind, IdentitySession, SessionSnapshot};
