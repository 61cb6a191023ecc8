//! Model descriptor types
//!
//! Provider-agnostic metadata for a single provider/model pair: pricing,
//! capability flags, performance characteristics, and lifecycle state.
//! The descriptor is pure data; all lookup and filtering logic lives in
//! the registry.

use serde::{Deserialize, Serialize};

/// Separator between the provider and model portions of a catalog id.
pub const ID_SEPARATOR: char = '#';

/// Coarse latency bucket for a model, ordered fastest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Fast,
    Medium,
    Slow,
}

impl Speed {
    /// Ordinal value used for ranking (fast=3, medium=2, slow=1).
    pub fn ordinal(self) -> u8 {
        match self {
            Speed::Fast => 3,
            Speed::Medium => 2,
            Speed::Slow => 1,
        }
    }

    /// Whether a model of this speed satisfies `ceiling` as a latency limit.
    ///
    /// A `fast` ceiling admits only fast models; a `slow` ceiling admits all.
    pub fn within(self, ceiling: Speed) -> bool {
        self.ordinal() >= ceiling.ordinal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Speed::Fast => "fast",
            Speed::Medium => "medium",
            Speed::Slow => "slow",
        }
    }
}

/// Coarse pricing bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingTier {
    Low,
    Medium,
    High,
}

impl PricingTier {
    pub fn as_str(self) -> &'static str {
        match self {
            PricingTier::Low => "low",
            PricingTier::Medium => "medium",
            PricingTier::High => "high",
        }
    }
}

/// Capability flags a selection can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Tools,
    StructuredOutput,
    Streaming,
    Vision,
}

impl Capability {
    /// All capability flags, in the order the registry indexes them.
    pub const ALL: [Capability; 4] = [
        Capability::Tools,
        Capability::StructuredOutput,
        Capability::Streaming,
        Capability::Vision,
    ];

    /// Short display name used in selection factors and rejection reasons.
    pub fn name(self) -> &'static str {
        match self {
            Capability::Tools => "tools",
            Capability::StructuredOutput => "structured_output",
            Capability::Streaming => "streaming",
            Capability::Vision => "vision",
        }
    }
}

fn default_active() -> bool {
    true
}

/// One catalog entry describing a single provider/model pair.
///
/// Ids are globally unique, formed as `provider#model`, and lower-case
/// stable; the catalog enforces both invariants at load time. A descriptor
/// is immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Globally unique id, `provider#model`.
    pub id: String,
    /// Provider name (the left portion of the id).
    pub provider: String,
    /// Raw provider-side model name (the right portion of the id).
    pub model: String,
    /// Cost in USD per million input tokens.
    pub input_cost: f64,
    /// Cost in USD per million output tokens.
    pub output_cost: f64,
    /// Cost in USD per million cached input tokens, when the provider
    /// discounts cache hits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_input_cost: Option<f64>,
    /// Coarse pricing bucket.
    pub pricing_tier: PricingTier,
    pub supports_tools: bool,
    pub supports_structured_output: bool,
    pub supports_streaming: bool,
    pub supports_vision: bool,
    /// Coarse latency bucket.
    pub speed: Speed,
    /// Ordinal capability score, 1 through 10.
    pub intelligence: u8,
    /// Context window size in tokens.
    pub context_length: u32,
    /// Whether the model participates in selection. Inactive descriptors
    /// stay in the catalog but are excluded from every selection path.
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ModelDescriptor {
    /// Average of input and output cost, the metric used by budget filters
    /// and cost-based ranking.
    pub fn average_cost(&self) -> f64 {
        (self.input_cost + self.output_cost) / 2.0
    }

    /// Whether the descriptor advertises the given capability.
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Tools => self.supports_tools,
            Capability::StructuredOutput => self.supports_structured_output,
            Capability::Streaming => self.supports_streaming,
            Capability::Vision => self.supports_vision,
        }
    }
}
