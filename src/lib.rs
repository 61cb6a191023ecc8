//! # Modelgate - Model Selection and Access Control
//!
//! Modelgate routes a logical request ("give me a cheap model", "give me the
//! best model under these constraints") to one of many interchangeable
//! language-model providers, while enforcing per-caller access control.
//!
//! ## Components
//!
//! - **Catalog**: immutable descriptor list, the source of truth for
//!   pricing, capability, and performance metadata.
//! - **Registry**: indexed view over the catalog with exact-match and range
//!   queries.
//! - **Policy selector**: hard-constraint pipeline plus ranked selection
//!   with an auditable explanation.
//! - **Tier selector**: heuristic shortcut for the four coarse intents.
//! - **Access session**: per-caller allow-list scoping and credential-bound
//!   invocation handles.
//!
//! The engine never calls a model itself; it hands back a provider-bound,
//! id-tagged handle for the consumer to drive.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use modelgate::prelude::*;
//!
//! fn main() -> Result<(), modelgate::GateError> {
//!     let registry = Arc::new(Registry::new(Catalog::builtin()));
//!
//!     // Constraint-based selection with an explanation.
//!     let selector = PolicySelector::new(registry.clone());
//!     let options = SelectionOptions::new()
//!         .with_required_feature(Capability::Tools)
//!         .with_budget(2.0);
//!     if let Some(result) = selector.select("default", &options)?.selected() {
//!         println!("{}: {}", result.model.id, result.reason.primary);
//!     }
//!
//!     // Per-caller access scoping.
//!     let credentials = CredentialStore::new().with_key("openai", "sk-test");
//!     let session = AccessSession::byok(
//!         "workflow-42",
//!         &["openai#gpt-4o-mini".to_string()],
//!         &credentials,
//!         registry,
//!     )?;
//!     let handle = session.tier(ModelTier::Cheap)?;
//!     assert_eq!(handle.model_id(), "openai#gpt-4o-mini");
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod catalog;
pub mod defaults;
pub mod error;
pub mod provider;
pub mod registry;
pub mod selector;
pub mod session;
pub mod types;

pub use catalog::Catalog;
pub use error::GateError;
pub use provider::{InvocationHandle, ProviderClient};
pub use registry::{Registry, RegistryStats, SharedRegistry};
pub use selector::{select_for_tier, ModelTier, PolicySelector, DEFAULT_INTENT};
pub use session::{
    AccessMode, AccessSession, CredentialStore, Resolved, ResolveKind, ResolveOptions,
    ResolveOutput,
};
pub use types::{
    Capability, FallbackStrategy, ModelDescriptor, ModelQuery, OptimizeFor, PricingTier,
    SelectionOptions, SelectionOutcome, SelectionReason, SelectionResult, Speed,
};

/// Commonly used types for glob import.
pub mod prelude {
    pub use crate::catalog::Catalog;
    pub use crate::error::GateError;
    pub use crate::provider::{InvocationHandle, ProviderClient};
    pub use crate::registry::{Registry, SharedRegistry};
    pub use crate::selector::{select_for_tier, ModelTier, PolicySelector};
    pub use crate::session::{
        AccessMode, AccessSession, CredentialStore, Resolved, ResolveKind, ResolveOptions,
        ResolveOutput,
    };
    pub use crate::types::{
        Capability, FallbackStrategy, ModelDescriptor, ModelQuery, OptimizeFor, PricingTier,
        SelectionOptions, SelectionOutcome, Speed,
    };
}
