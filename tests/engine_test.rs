//! End-to-end scenarios for the selection and access-control engine,
//! exercised through the public API only.

use std::sync::Arc;

use modelgate::prelude::*;

/// Route engine logs to the test harness when RUST_LOG is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn two_model_catalog() -> Catalog {
    let mini = ModelDescriptor {
        id: "openai#gpt-4o-mini".into(),
        provider: "openai".into(),
        model: "gpt-4o-mini".into(),
        input_cost: 0.15,
        output_cost: 0.60,
        cached_input_cost: None,
        pricing_tier: PricingTier::Low,
        supports_tools: true,
        supports_structured_output: true,
        supports_streaming: true,
        supports_vision: true,
        speed: Speed::Fast,
        intelligence: 8,
        context_length: 128_000,
        active: true,
    };
    let full = ModelDescriptor {
        id: "openai#gpt-4o".into(),
        provider: "openai".into(),
        model: "gpt-4o".into(),
        input_cost: 2.5,
        output_cost: 10.0,
        cached_input_cost: None,
        pricing_tier: PricingTier::Medium,
        supports_tools: true,
        supports_structured_output: true,
        supports_streaming: true,
        supports_vision: true,
        speed: Speed::Medium,
        intelligence: 9,
        context_length: 128_000,
        active: true,
    };
    Catalog::new(vec![mini, full]).unwrap()
}

fn allow_both() -> Vec<String> {
    vec!["openai#gpt-4o-mini".to_string(), "openai#gpt-4o".to_string()]
}

#[test]
fn tools_requirement_holds_for_every_winner() {
    init_tracing();
    let registry = Arc::new(Registry::new(Catalog::builtin()));
    let selector = PolicySelector::new(registry);
    for budget in [0.1, 0.5, 1.0, 5.0, 50.0] {
        let options = SelectionOptions::new()
            .with_required_feature(Capability::Tools)
            .with_budget(budget);
        if let Some(result) = selector.select("default", &options).unwrap().selected() {
            assert!(result.model.supports_tools, "budget {budget}");
            assert!(result.model.average_cost() <= budget, "budget {budget}");
        }
    }
}

#[test]
fn range_query_agrees_with_filtered_list() {
    let registry = Registry::new(Catalog::builtin());
    for budget in [0.2, 0.7, 3.0, 12.0] {
        let mut from_walk: Vec<String> = registry
            .find_in_budget(budget)
            .iter()
            .map(|m| m.id.clone())
            .collect();
        from_walk.sort();
        let mut from_list: Vec<String> = registry
            .list(&ModelQuery::new().max_avg_cost(budget))
            .iter()
            .map(|m| m.id.clone())
            .collect();
        from_list.sort();
        assert_eq!(from_walk, from_list, "budget {budget}");
    }
}

#[test]
fn tier_selection_on_the_two_model_catalog() {
    let registry = Arc::new(Registry::new(two_model_catalog()));
    let credentials = CredentialStore::new().with_key("openai", "sk-test");
    let session =
        AccessSession::byok("scenario-caller", &allow_both(), &credentials, registry).unwrap();

    let cheap = session.tier(ModelTier::Cheap).unwrap();
    assert_eq!(cheap.model_id(), "openai#gpt-4o-mini");

    let smart = session.tier(ModelTier::Smart).unwrap();
    assert_eq!(smart.model_id(), "openai#gpt-4o");
}

#[test]
fn tier_selection_is_deterministic() {
    let registry = Registry::new(two_model_catalog());
    let allowed = allow_both();
    let first = select_for_tier(&registry, ModelTier::Cheap, &allowed)
        .unwrap()
        .id
        .clone();
    let second = select_for_tier(&registry, ModelTier::Cheap, &allowed)
        .unwrap()
        .id
        .clone();
    assert_eq!(first, second);
}

#[test]
fn impossible_budget_yields_no_selection_with_a_trail() {
    let registry = Arc::new(Registry::new(two_model_catalog()));
    let selector = PolicySelector::new(registry);
    let options = SelectionOptions::new().with_budget(0.1);
    match selector.select("default", &options).unwrap() {
        SelectionOutcome::NoCandidates { rejections } => {
            assert_eq!(rejections.len(), 2);
            assert!(rejections.iter().all(|r| r.reason.contains("over budget")));
        }
        SelectionOutcome::Selected(result) => panic!("unexpected winner {}", result.model.id),
    }
}

#[test]
fn byok_with_no_credentials_fails_construction() {
    let registry = Arc::new(Registry::new(two_model_catalog()));
    let err = AccessSession::byok(
        "scenario-caller",
        &allow_both(),
        &CredentialStore::new(),
        registry,
    )
    .unwrap_err();
    assert!(matches!(err, GateError::MissingCredentials));
}

#[test]
fn fallback_finds_the_globally_cheapest_model() {
    let registry = Arc::new(Registry::new(Catalog::builtin()));
    let selector = PolicySelector::new(registry.clone());
    let options = SelectionOptions::new().fallback_strategy(FallbackStrategy::Cheapest);
    let outcome = selector
        .select_with_fallback("openai#nonexistent", &options)
        .unwrap();
    let winner = outcome.selected().unwrap();
    let cheapest = registry.get_cheapest(&ModelQuery::new()).unwrap();
    assert_eq!(winner.model.id, cheapest.id);
}

#[test]
fn allow_list_containment_through_every_resolution_path() {
    init_tracing();
    let registry = Arc::new(Registry::new(Catalog::builtin()));
    let allowed = vec![
        "openai#gpt-4o-mini".to_string(),
        "anthropic#claude-sonnet-4".to_string(),
    ];
    let credentials = CredentialStore::new()
        .with_key("openai", "sk-openai")
        .with_key("anthropic", "sk-anthropic");
    let session =
        AccessSession::byok("scenario-caller", &allowed, &credentials, registry).unwrap();

    for input in ["cheap", "fast", "smart", "balanced"] {
        let resolved = session.resolve(input, ResolveOptions::default()).unwrap();
        assert!(allowed.contains(&resolved.model_id().to_string()), "{input}");
    }
    for input in ["gpt-4o-mini", "claude-sonnet-4"] {
        let handle = session.model(input).unwrap();
        assert!(allowed.contains(&handle.model_id().to_string()), "{input}");
    }
    assert!(session.model("google#gemini-2.5-flash").is_err());
}

#[test]
fn resolve_id_output_is_idempotent() {
    let registry = Arc::new(Registry::new(Catalog::builtin()));
    let credentials = CredentialStore::new().with_key("openai", "sk-test");
    let session = AccessSession::byok(
        "scenario-caller",
        &["openai#gpt-4o".to_string()],
        &credentials,
        registry,
    )
    .unwrap();

    let options = ResolveOptions {
        kind: None,
        output: ResolveOutput::Id,
    };
    let once = session.resolve("gpt-4o", options).unwrap();
    let twice = session.resolve(once.model_id(), options).unwrap();
    assert_eq!(once.model_id(), twice.model_id());
}

#[test]
fn refresh_publishes_a_complete_replacement() {
    let shared = SharedRegistry::new(Catalog::builtin());
    let selector_before = PolicySelector::new(shared.load());

    shared.refresh(two_model_catalog());
    let selector_after = PolicySelector::new(shared.load());

    // The old snapshot still selects from the full catalog; the new one only
    // sees the replacement.
    let options = SelectionOptions::new().optimize_for(OptimizeFor::Cost);
    let before = selector_before.select("default", &options).unwrap();
    assert_eq!(
        before.selected().unwrap().model.id,
        "groq#llama-3.1-8b-instant"
    );
    let after = selector_after.select("default", &options).unwrap();
    assert_eq!(after.selected().unwrap().model.id, "openai#gpt-4o-mini");
}
