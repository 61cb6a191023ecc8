//! Model catalog
//!
//! The catalog is the immutable source of truth for pricing, capability,
//! and performance metadata. It carries no logic beyond load-time invariant
//! checks; all lookup structure lives in the registry. A refresh replaces
//! the catalog wholesale, it is never mutated in place.

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::error::GateError;
use crate::types::{Capability, ModelDescriptor, PricingTier, Speed, ID_SEPARATOR};

/// Immutable, shareable list of model descriptors.
///
/// Cloning a catalog is cheap (the descriptor list is reference-counted);
/// callers always receive a read-only view, never a defensive copy.
#[derive(Debug, Clone)]
pub struct Catalog {
    models: Arc<Vec<ModelDescriptor>>,
}

impl Catalog {
    /// Build a catalog from a descriptor list, enforcing the id invariants:
    /// ids are unique, lower-case, and formed as `provider#model`.
    pub fn new(descriptors: Vec<ModelDescriptor>) -> Result<Self, GateError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            if descriptor.provider != descriptor.provider.to_ascii_lowercase() {
                return Err(GateError::invalid_configuration(format!(
                    "provider name must be lower-case: '{}'",
                    descriptor.provider
                )));
            }
            let expected = format!(
                "{}{}{}",
                descriptor.provider,
                ID_SEPARATOR,
                descriptor.model.to_ascii_lowercase()
            );
            if descriptor.id != expected {
                return Err(GateError::invalid_configuration(format!(
                    "descriptor id '{}' does not match '{expected}'",
                    descriptor.id
                )));
            }
            if !(1..=10).contains(&descriptor.intelligence) {
                return Err(GateError::invalid_configuration(format!(
                    "intelligence for '{}' must be within 1..=10",
                    descriptor.id
                )));
            }
            if !seen.insert(descriptor.id.as_str()) {
                return Err(GateError::invalid_configuration(format!(
                    "duplicate descriptor id '{}'",
                    descriptor.id
                )));
            }
        }
        Ok(Self {
            models: Arc::new(descriptors),
        })
    }

    /// The built-in descriptor table.
    pub fn builtin() -> Self {
        Self {
            models: Arc::clone(&BUILTIN_MODELS),
        }
    }

    /// Load a catalog from a JSON array of descriptors, applying the same
    /// invariant checks as [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<Self, GateError> {
        let descriptors: Vec<ModelDescriptor> = serde_json::from_str(json)
            .map_err(|e| GateError::invalid_configuration(format!("invalid catalog JSON: {e}")))?;
        Self::new(descriptors)
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModelDescriptor> {
        self.models.iter()
    }
}

fn entry(
    provider: &str,
    model: &str,
    input_cost: f64,
    output_cost: f64,
    cached_input_cost: Option<f64>,
    pricing_tier: PricingTier,
    speed: Speed,
    intelligence: u8,
    context_length: u32,
    capabilities: &[Capability],
) -> ModelDescriptor {
    ModelDescriptor {
        id: format!("{provider}{ID_SEPARATOR}{model}"),
        provider: provider.to_string(),
        model: model.to_string(),
        input_cost,
        output_cost,
        cached_input_cost,
        pricing_tier,
        supports_tools: capabilities.contains(&Capability::Tools),
        supports_structured_output: capabilities.contains(&Capability::StructuredOutput),
        supports_streaming: capabilities.contains(&Capability::Streaming),
        supports_vision: capabilities.contains(&Capability::Vision),
        speed,
        intelligence,
        context_length,
        active: true,
    }
}

lazy_static! {
    /// All built-in models with pricing and metadata. Prices are USD per
    /// million tokens and drift with provider announcements; update as needed.
    static ref BUILTIN_MODELS: Arc<Vec<ModelDescriptor>> = {
        use Capability::{StructuredOutput, Streaming, Tools, Vision};
        let full = [Tools, StructuredOutput, Streaming, Vision];
        let no_vision = [Tools, StructuredOutput, Streaming];

        let mut models = vec![
            // ---- OpenAI ----
            entry("openai", "gpt-4o-mini", 0.15, 0.60, Some(0.075),
                PricingTier::Low, Speed::Fast, 8, 128_000, &full),
            entry("openai", "gpt-4o", 2.50, 10.00, Some(1.25),
                PricingTier::Medium, Speed::Medium, 9, 128_000, &full),
            entry("openai", "gpt-4.1", 2.00, 8.00, Some(0.50),
                PricingTier::Medium, Speed::Medium, 9, 1_047_576, &full),
            entry("openai", "gpt-4.1-mini", 0.40, 1.60, Some(0.10),
                PricingTier::Low, Speed::Fast, 8, 1_047_576, &full),
            entry("openai", "gpt-4.1-nano", 0.10, 0.40, Some(0.025),
                PricingTier::Low, Speed::Fast, 7, 1_047_576, &full),
            entry("openai", "o3", 2.00, 8.00, Some(0.50),
                PricingTier::Medium, Speed::Slow, 10, 200_000, &no_vision),
            // ---- Anthropic ----
            entry("anthropic", "claude-opus-4", 15.00, 75.00, Some(1.50),
                PricingTier::High, Speed::Slow, 10, 200_000, &full),
            entry("anthropic", "claude-sonnet-4", 3.00, 15.00, Some(0.30),
                PricingTier::Medium, Speed::Medium, 9, 200_000, &full),
            entry("anthropic", "claude-3-5-haiku", 0.80, 4.00, Some(0.08),
                PricingTier::Low, Speed::Fast, 7, 200_000, &full),
            // ---- Google ----
            entry("google", "gemini-2.5-pro", 1.25, 10.00, None,
                PricingTier::Medium, Speed::Medium, 9, 1_048_576, &full),
            entry("google", "gemini-2.5-flash", 0.15, 0.60, None,
                PricingTier::Low, Speed::Fast, 8, 1_048_576, &full),
            entry("google", "gemini-2.0-flash-lite", 0.075, 0.30, None,
                PricingTier::Low, Speed::Fast, 6, 1_048_576, &no_vision),
            // ---- Groq ----
            entry("groq", "llama-3.3-70b-versatile", 0.59, 0.79, None,
                PricingTier::Low, Speed::Fast, 7, 128_000, &no_vision),
            entry("groq", "llama-3.1-8b-instant", 0.05, 0.08, None,
                PricingTier::Low, Speed::Fast, 5, 128_000, &[Tools, Streaming]),
        ];

        // Retired from selection but kept for id stability in stored traces.
        let mut legacy = entry("openai", "gpt-3.5-turbo", 0.50, 1.50, None,
            PricingTier::Low, Speed::Fast, 5, 16_385, &no_vision);
        legacy.active = false;
        models.push(legacy);

        Arc::new(models)
    };
}
