//! End-to-end gating through the engine.

use featuregate::{
    AuthEvent, AuthProviderKind, ConsentDecision, EngineConfig, FallbackAction, FeaturePolicy,
    GateDecision, GateEngine, IdentitySession, MockIdentityProvider, Rendered,
};
use std::sync::Arc;

fn config() -> EngineConfig {
    EngineConfig::default().with_features([
        FeaturePolicy::open("Home").always_visible(),
        FeaturePolicy::open("UserProfile")
            .always_visible()
            .requires_signed_in(),
        FeaturePolicy::open("Rewards")
            .with_title("Rewards")
            .requires_signed_in()
            .requires_marketing_consent(),
        FeaturePolicy::open("Newsletter")
            .requires_marketing_consent()
            .with_consent_message("The newsletter needs marketing cookies."),
        FeaturePolicy::open("Announcements")
            .always_visible()
            .requires_marketing_consent(),
    ])
}

async fn engine(provider: Arc<MockIdentityProvider>) -> GateEngine {
    GateEngine::start(config(), provider).await.unwrap()
}

#[tokio::test]
async fn rewards_unlocks_after_sign_in_and_consent() {
    let provider = Arc::new(MockIdentityProvider::new());
    let engine = engine(provider).await;
    let mut gate = engine.mount("Rewards", "rewards screen").unwrap();

    assert_eq!(gate.decision(), GateDecision::AuthRequired);
    let fallback = gate.render().fallback().cloned().unwrap();
    assert_eq!(fallback.primary_action, FallbackAction::SignIn);

    assert!(engine.auth().sign_in(AuthProviderKind::Google).await);
    assert_eq!(gate.changed().await, Some(GateDecision::ConsentRequired));

    engine.consent().accept_all();
    assert_eq!(gate.changed().await, Some(GateDecision::Allowed));
    assert_eq!(gate.render(), Rendered::Content(&"rewards screen"));

    engine.shutdown().await;
}

#[tokio::test]
async fn sign_out_blocks_mounted_gate_immediately() {
    let user = IdentitySession::new("u-42", "lin@example.com", "google");
    let provider = Arc::new(MockIdentityProvider::with_session(user));
    let engine = engine(provider.clone()).await;
    let mut gate = engine.mount("UserProfile", ()).unwrap();

    assert_eq!(gate.decision(), GateDecision::Allowed);
    assert_eq!(engine.auth().display_name(), "lin");

    assert!(engine.auth().sign_out().await);
    assert_eq!(gate.changed().await, Some(GateDecision::AuthRequired));
    assert_eq!(engine.auth().display_name(), "User");

    provider
        .emit(AuthEvent::signed_in(IdentitySession::new(
            "u-42",
            "lin@example.com",
            "google",
        )))
        .await;
    assert_eq!(gate.changed().await, Some(GateDecision::Allowed));

    engine.shutdown().await;
}

#[tokio::test]
async fn always_visible_features_ignore_consent() {
    let engine = engine(Arc::new(MockIdentityProvider::new())).await;

    for consent in [ConsentDecision::essential_only(), ConsentDecision::all()] {
        engine.consent().update(consent);
        assert_eq!(engine.decide("Home").unwrap(), GateDecision::Allowed);
        assert_eq!(engine.decide("Announcements").unwrap(), GateDecision::Allowed);
    }

    engine.shutdown().await;
}

#[tokio::test]
async fn consent_fallback_uses_feature_message() {
    let engine = engine(Arc::new(MockIdentityProvider::new())).await;

    let fallback = engine.fallback("Newsletter").unwrap().unwrap();
    assert_eq!(fallback.decision, GateDecision::ConsentRequired);
    assert_eq!(fallback.headline, "Feature Restricted");
    assert_eq!(fallback.body, "The newsletter needs marketing cookies.");
    assert_eq!(fallback.primary_action, FallbackAction::OpenConsentSettings);

    engine.consent().set_marketing(true);
    assert!(engine.fallback("Newsletter").unwrap().is_none());

    engine.shutdown().await;
}

#[tokio::test]
async fn disabled_sign_in_provider_is_refused() {
    let provider = Arc::new(MockIdentityProvider::new());
    let engine = engine(provider.clone()).await;

    assert!(!engine.auth().sign_in(AuthProviderKind::Email).await);
    assert_eq!(provider.sign_in_calls(), 0);
    assert!(!engine.session().is_authenticated());

    engine.shutdown().await;
}

#[tokio::test]
async fn composed_gate_renders_explicit_inputs() {
    let engine = engine(Arc::new(MockIdentityProvider::new())).await;
    let gate = engine.compose("Rewards", 7_u32).unwrap();
    let user = IdentitySession::new("u-1", "ada@example.com", "google");

    assert_eq!(
        gate.render(&ConsentDecision::all(), None).decision(),
        GateDecision::AuthRequired
    );
    assert_eq!(
        gate.render(&ConsentDecision::essential_only(), Some(&user)).decision(),
        GateDecision::ConsentRequired
    );
    assert_eq!(
        gate.render(&ConsentDecision::all(), Some(&user)),
        Rendered::Content(&7)
    );

    engine.shutdown().await;
}
