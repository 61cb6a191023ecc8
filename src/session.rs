//! Access-scoping sessions
//!
//! A session binds one caller to a frozen allow-list and a set of
//! ready-to-use provider clients, and resolves names or tiers into
//! invocation handles without ever exposing a model outside the allow-list.
//!
//! Sessions are per-caller and disposable: construction builds provider
//! clients (a cheap local operation, no network), and nothing is shared
//! mutably between sessions or with the registry.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::defaults;
use crate::error::GateError;
use crate::provider::{client_for, InvocationHandle, ProviderClient};
use crate::registry::Registry;
use crate::selector::tier::{select_for_tier, ModelTier};
use crate::types::{ModelDescriptor, ID_SEPARATOR};

/// Credential operating mode for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Bring-your-own-credentials: the caller supplies provider keys.
    Byok,
    /// Shared: process-level fallback credentials.
    Shared,
}

/// Opaque per-provider API keys.
///
/// Keys are held as `SecretString` and are never logged or persisted by
/// this engine.
#[derive(Debug, Default)]
pub struct CredentialStore {
    keys: HashMap<String, SecretString>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key for a provider (builder form).
    pub fn with_key<P: Into<String>, K: Into<String>>(mut self, provider: P, key: K) -> Self {
        let provider: String = provider.into();
        self.keys
            .insert(provider.to_ascii_lowercase(), SecretString::from(key.into()));
        self
    }

    /// Load process-fallback credentials from conventional environment
    /// variables. Unset or empty variables are simply skipped.
    pub fn from_env() -> Self {
        let sources = [
            ("openai", defaults::providers::openai::API_KEY_ENV),
            ("anthropic", defaults::providers::anthropic::API_KEY_ENV),
            ("google", defaults::providers::google::API_KEY_ENV),
            ("groq", defaults::providers::groq::API_KEY_ENV),
        ];
        let mut store = Self::new();
        for (provider, variable) in sources {
            if let Ok(value) = std::env::var(variable) {
                if !value.is_empty() {
                    store
                        .keys
                        .insert(provider.to_string(), SecretString::from(value));
                }
            }
        }
        store
    }

    pub fn get(&self, provider: &str) -> Option<&SecretString> {
        self.keys.get(provider)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &SecretString)> {
        self.keys.iter()
    }
}

/// Fully-resolved output of [`AccessSession::resolve`].
#[derive(Debug, Clone)]
pub enum Resolved {
    Handle(InvocationHandle),
    Id(String),
}

impl Resolved {
    /// Canonical catalog id, whichever output form was produced.
    pub fn model_id(&self) -> &str {
        match self {
            Resolved::Handle(handle) => handle.model_id(),
            Resolved::Id(id) => id,
        }
    }

    pub fn into_handle(self) -> Option<InvocationHandle> {
        match self {
            Resolved::Handle(handle) => Some(handle),
            Resolved::Id(_) => None,
        }
    }
}

/// Strict kind assertion for [`AccessSession::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveKind {
    Tier,
    Model,
}

/// Output form for [`AccessSession::resolve`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveOutput {
    /// A live, provider-bound invocation handle.
    #[default]
    Handle,
    /// The canonical catalog id only, for logging and telemetry paths that
    /// must not construct a live handle.
    Id,
}

/// Options for [`AccessSession::resolve`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// When set, the input must be of this kind; a mismatch is an error.
    pub kind: Option<ResolveKind>,
    pub output: ResolveOutput,
}

/// Per-caller access scope over a registry snapshot.
#[derive(Debug)]
pub struct AccessSession {
    caller: String,
    mode: AccessMode,
    /// Frozen at construction: lower-cased, de-duplicated, order preserved.
    allowed: Vec<String>,
    clients: HashMap<String, Arc<dyn ProviderClient>>,
    registry: Arc<Registry>,
}

impl AccessSession {
    /// Construct a session for a caller.
    ///
    /// BYOK mode fails fast when no credentials were supplied at all. An
    /// empty allow-list is legal and yields "no candidates" on every
    /// subsequent selection rather than a constructor failure.
    pub fn new(
        caller: impl Into<String>,
        mode: AccessMode,
        allowed_models: &[String],
        credentials: &CredentialStore,
        registry: Arc<Registry>,
    ) -> Result<Self, GateError> {
        if mode == AccessMode::Byok && credentials.is_empty() {
            return Err(GateError::MissingCredentials);
        }

        let mut clients: HashMap<String, Arc<dyn ProviderClient>> = HashMap::new();
        for (provider, key) in credentials.iter() {
            match client_for(provider, key) {
                Ok(client) => {
                    clients.insert(provider.clone(), client);
                }
                Err(error) => {
                    warn!(provider = %provider, %error, "skipping unusable provider credential");
                }
            }
        }

        let mut seen = HashSet::new();
        let allowed: Vec<String> = allowed_models
            .iter()
            .map(|id| id.trim().to_ascii_lowercase())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();

        let caller = caller.into();
        debug!(
            caller = %caller,
            mode = ?mode,
            allowed = allowed.len(),
            providers = clients.len(),
            "access session constructed"
        );

        Ok(Self {
            caller,
            mode,
            allowed,
            clients,
            registry,
        })
    }

    /// Construct a BYOK session from caller-supplied credentials.
    pub fn byok(
        caller: impl Into<String>,
        allowed_models: &[String],
        credentials: &CredentialStore,
        registry: Arc<Registry>,
    ) -> Result<Self, GateError> {
        Self::new(caller, AccessMode::Byok, allowed_models, credentials, registry)
    }

    /// Construct a shared-mode session from process-fallback credentials.
    pub fn shared(
        caller: impl Into<String>,
        allowed_models: &[String],
        registry: Arc<Registry>,
    ) -> Result<Self, GateError> {
        Self::new(
            caller,
            AccessMode::Shared,
            allowed_models,
            &CredentialStore::from_env(),
            registry,
        )
    }

    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// The frozen allow-list.
    pub fn allowed_models(&self) -> &[String] {
        &self.allowed
    }

    /// Resolve a model name into an invocation handle, enforcing the
    /// allow-list and credential availability.
    pub fn model(&self, name: &str) -> Result<InvocationHandle, GateError> {
        let descriptor = self.resolve_allowed(name)?;
        let client = self
            .clients
            .get(&descriptor.provider)
            .ok_or_else(|| GateError::provider_not_configured(&descriptor.provider))?;
        Ok(client.bind(descriptor))
    }

    /// Select a model for a tier, scoped to this session's allow-list, and
    /// bind it. Tier selection can never escape the allow-list.
    pub fn tier(&self, tier: ModelTier) -> Result<InvocationHandle, GateError> {
        let id = select_for_tier(&self.registry, tier, &self.allowed)?.id.clone();
        self.model(&id)
    }

    /// Resolve an input that is either a tier keyword or a model name.
    ///
    /// Detection is automatic unless `options.kind` asserts one; an
    /// assertion mismatch is a descriptive error. The output is either a
    /// live handle or the canonical catalog id.
    pub fn resolve(&self, input: &str, options: ResolveOptions) -> Result<Resolved, GateError> {
        let detected = ModelTier::parse(input);
        match options.kind {
            Some(ResolveKind::Tier) => {
                let tier = detected.ok_or_else(|| GateError::StrictKindMismatch {
                    expected: "tier keyword",
                    input: input.to_string(),
                })?;
                self.resolve_tier(tier, options.output)
            }
            Some(ResolveKind::Model) => {
                if detected.is_some() {
                    return Err(GateError::StrictKindMismatch {
                        expected: "model name",
                        input: input.to_string(),
                    });
                }
                self.resolve_model(input, options.output)
            }
            None => match detected {
                Some(tier) => self.resolve_tier(tier, options.output),
                None => self.resolve_model(input, options.output),
            },
        }
    }

    fn resolve_tier(&self, tier: ModelTier, output: ResolveOutput) -> Result<Resolved, GateError> {
        match output {
            ResolveOutput::Handle => self.tier(tier).map(Resolved::Handle),
            ResolveOutput::Id => {
                let model = select_for_tier(&self.registry, tier, &self.allowed)?;
                Ok(Resolved::Id(model.id.clone()))
            }
        }
    }

    fn resolve_model(&self, name: &str, output: ResolveOutput) -> Result<Resolved, GateError> {
        match output {
            ResolveOutput::Handle => self.model(name).map(Resolved::Handle),
            ResolveOutput::Id => {
                let descriptor = self.resolve_allowed(name)?;
                Ok(Resolved::Id(descriptor.id.clone()))
            }
        }
    }

    /// Steps 1 through 3 of name resolution: catalog lookup (exact id, then
    /// bare name), then allow-list membership with a suffix-match fallback
    /// so bare names can address allow-listed ids.
    fn resolve_allowed(&self, name: &str) -> Result<&ModelDescriptor, GateError> {
        let needle = name.trim().to_ascii_lowercase();
        let resolved = self
            .registry
            .resolve_name(&needle)
            .ok_or_else(|| GateError::model_not_found(name.trim()))?;

        if self.allowed.iter().any(|allowed| *allowed == resolved.id) {
            return Ok(resolved);
        }

        let suffix = format!("{ID_SEPARATOR}{needle}");
        if let Some(allowed) = self.allowed.iter().find(|a| a.ends_with(&suffix)) {
            return self
                .registry
                .get(allowed)
                .ok_or_else(|| GateError::model_not_found(allowed.clone()));
        }

        Err(GateError::not_allowed(&self.caller, &resolved.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::new(Catalog::builtin()))
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn credentials() -> CredentialStore {
        CredentialStore::new()
            .with_key("openai", "sk-openai-test")
            .with_key("anthropic", "sk-anthropic-test")
    }

    #[test]
    fn byok_without_credentials_fails_fast() {
        let err = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o"]),
            &CredentialStore::new(),
            registry(),
        )
        .unwrap_err();
        assert!(matches!(err, GateError::MissingCredentials));
    }

    #[test]
    fn empty_allow_list_is_legal_at_construction() {
        let session =
            AccessSession::byok("caller-1", &[], &credentials(), registry()).unwrap();
        let err = session.model("openai#gpt-4o").unwrap_err();
        assert!(matches!(err, GateError::NotInAllowedModels { .. }));
        let err = session.tier(ModelTier::Cheap).unwrap_err();
        assert!(matches!(err, GateError::NoModelsConfigured(_)));
    }

    #[test]
    fn model_resolves_exact_id() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o", "openai#gpt-4o-mini"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let handle = session.model("openai#gpt-4o").unwrap();
        assert_eq!(handle.model_id(), "openai#gpt-4o");
    }

    #[test]
    fn model_resolves_bare_name_through_the_allow_list() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o-mini"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let handle = session.model("gpt-4o-mini").unwrap();
        assert_eq!(handle.model_id(), "openai#gpt-4o-mini");
    }

    #[test]
    fn allow_list_containment_always_holds() {
        let allowed = ids(&["openai#gpt-4o-mini", "anthropic#claude-sonnet-4"]);
        let session =
            AccessSession::byok("caller-1", &allowed, &credentials(), registry()).unwrap();
        for name in ["gpt-4o-mini", "claude-sonnet-4", "openai#gpt-4o-mini"] {
            let handle = session.model(name).unwrap();
            assert!(allowed.contains(&handle.model_id().to_string()));
        }
    }

    #[test]
    fn model_outside_allow_list_is_rejected() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o-mini"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let err = session.model("openai#gpt-4o").unwrap_err();
        assert!(matches!(err, GateError::NotInAllowedModels { .. }));
    }

    #[test]
    fn unknown_model_is_not_found() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o-mini"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let err = session.model("openai#made-up").unwrap_err();
        assert!(matches!(err, GateError::ModelNotFound(_)));
    }

    #[test]
    fn missing_provider_credential_surfaces_per_model() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["google#gemini-2.5-flash"]),
            &credentials(), // openai and anthropic only
            registry(),
        )
        .unwrap();
        let err = session.model("google#gemini-2.5-flash").unwrap_err();
        assert!(matches!(err, GateError::ProviderNotConfigured(_)));
    }

    #[test]
    fn shared_mode_with_empty_store_constructs_but_cannot_bind() {
        let session = AccessSession::new(
            "caller-1",
            AccessMode::Shared,
            &ids(&["openai#gpt-4o"]),
            &CredentialStore::new(),
            registry(),
        )
        .unwrap();
        assert!(matches!(
            session.model("openai#gpt-4o").unwrap_err(),
            GateError::ProviderNotConfigured(_)
        ));
    }

    #[test]
    fn tier_selection_stays_inside_the_allow_list() {
        let allowed = ids(&["openai#gpt-4o-mini", "openai#gpt-4o"]);
        let session =
            AccessSession::byok("caller-1", &allowed, &credentials(), registry()).unwrap();
        let cheap = session.tier(ModelTier::Cheap).unwrap();
        assert_eq!(cheap.model_id(), "openai#gpt-4o-mini");
        let smart = session.tier(ModelTier::Smart).unwrap();
        assert_eq!(smart.model_id(), "openai#gpt-4o");
    }

    #[test]
    fn resolve_detects_tiers_and_models() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o-mini", "openai#gpt-4o"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let tier = session.resolve("cheap", ResolveOptions::default()).unwrap();
        assert_eq!(tier.model_id(), "openai#gpt-4o-mini");
        let model = session
            .resolve("openai#gpt-4o", ResolveOptions::default())
            .unwrap();
        assert_eq!(model.model_id(), "openai#gpt-4o");
    }

    #[test]
    fn strict_kind_assertions_are_enforced() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["openai#gpt-4o-mini"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let err = session
            .resolve(
                "openai#gpt-4o-mini",
                ResolveOptions {
                    kind: Some(ResolveKind::Tier),
                    output: ResolveOutput::Handle,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GateError::StrictKindMismatch { .. }));

        let err = session
            .resolve(
                "cheap",
                ResolveOptions {
                    kind: Some(ResolveKind::Model),
                    output: ResolveOutput::Handle,
                },
            )
            .unwrap_err();
        assert!(matches!(err, GateError::StrictKindMismatch { .. }));
    }

    #[test]
    fn id_output_round_trips_to_the_same_canonical_id() {
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["anthropic#claude-sonnet-4"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let options = ResolveOptions {
            kind: None,
            output: ResolveOutput::Id,
        };
        let first = session.resolve("claude-sonnet-4", options).unwrap();
        let second = session.resolve(first.model_id(), options).unwrap();
        assert_eq!(first.model_id(), second.model_id());
        assert_eq!(second.model_id(), "anthropic#claude-sonnet-4");
    }

    #[test]
    fn id_output_does_not_require_a_provider_client() {
        // No google credential, but the telemetry path only needs the id.
        let session = AccessSession::byok(
            "caller-1",
            &ids(&["google#gemini-2.5-flash"]),
            &credentials(),
            registry(),
        )
        .unwrap();
        let resolved = session
            .resolve(
                "gemini-2.5-flash",
                ResolveOptions {
                    kind: Some(ResolveKind::Model),
                    output: ResolveOutput::Id,
                },
            )
            .unwrap();
        assert_eq!(resolved.model_id(), "google#gemini-2.5-flash");
    }

    #[test]
    fn allow_list_is_frozen_and_normalized() {
        let raw = vec![
            "OpenAI#GPT-4o".to_string(),
            "openai#gpt-4o".to_string(),
            "  anthropic#claude-sonnet-4  ".to_string(),
        ];
        let session =
            AccessSession::byok("caller-1", &raw, &credentials(), registry()).unwrap();
        assert_eq!(
            session.allowed_models(),
            &["openai#gpt-4o".to_string(), "anthropic#claude-sonnet-4".to_string()]
        );
    }
}
