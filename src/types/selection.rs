//! Selection option and result types
//!
//! `SelectionOptions` is the caller-facing constraint struct for the policy
//! selector; `ModelQuery` is the registry-facing filter set the selector (and
//! fallback paths) compile it down to. Results carry a full audit trail so
//! the surrounding application can explain why a model was chosen.

use serde::{Deserialize, Serialize};

use crate::error::GateError;
use crate::types::descriptor::{Capability, ModelDescriptor, PricingTier, Speed};

/// Maximum number of rejection entries kept in a selection explanation.
pub const REJECTION_LIMIT: usize = 5;

/// Maximum number of runner-up candidates surfaced as alternatives.
pub const ALTERNATIVE_LIMIT: usize = 3;

/// Ranking strategy for the surviving candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizeFor {
    Cost,
    Speed,
    Quality,
    #[default]
    Balanced,
}

impl OptimizeFor {
    pub fn as_str(self) -> &'static str {
        match self {
            OptimizeFor::Cost => "cost",
            OptimizeFor::Speed => "speed",
            OptimizeFor::Quality => "quality",
            OptimizeFor::Balanced => "balanced",
        }
    }
}

/// Strategy applied when the primary selection pipeline yields no candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackStrategy {
    #[default]
    Cheapest,
    Fastest,
    Semantic,
}

impl FallbackStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackStrategy::Cheapest => "cheapest",
            FallbackStrategy::Fastest => "fastest",
            FallbackStrategy::Semantic => "semantic",
        }
    }
}

/// Caller-supplied constraints for the policy selector.
///
/// Every field is optional; an empty options value selects over all active
/// models ranked by the balanced strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Capability flags every candidate must advertise.
    pub required_features: Vec<Capability>,
    /// Maximum acceptable average cost (USD per million tokens).
    pub budget: Option<f64>,
    /// Speed ceiling: `fast` admits only fast models, `slow` admits all.
    pub max_latency: Option<Speed>,
    pub min_context_length: Option<u32>,
    pub min_intelligence: Option<u8>,
    /// If non-empty, only these catalog ids may win.
    pub allowlist: Vec<String>,
    /// These catalog ids never win. Deny takes priority over allow.
    pub denylist: Vec<String>,
    /// Soft preference: candidates from these providers are moved to the
    /// front, in the order given. Never removes candidates.
    pub preferred_providers: Vec<String>,
    pub optimize_for: OptimizeFor,
    pub fallback_strategy: FallbackStrategy,
}

impl SelectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a capability flag on every candidate.
    pub fn with_required_feature(mut self, capability: Capability) -> Self {
        self.required_features.push(capability);
        self
    }

    /// Set the maximum acceptable average cost.
    pub fn with_budget(mut self, budget: f64) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Set the speed ceiling.
    pub fn with_max_latency(mut self, ceiling: Speed) -> Self {
        self.max_latency = Some(ceiling);
        self
    }

    pub fn with_min_context_length(mut self, tokens: u32) -> Self {
        self.min_context_length = Some(tokens);
        self
    }

    pub fn with_min_intelligence(mut self, score: u8) -> Self {
        self.min_intelligence = Some(score);
        self
    }

    pub fn allow<S: Into<String>>(mut self, id: S) -> Self {
        self.allowlist.push(id.into());
        self
    }

    pub fn deny<S: Into<String>>(mut self, id: S) -> Self {
        self.denylist.push(id.into());
        self
    }

    pub fn prefer_provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.preferred_providers.push(provider.into());
        self
    }

    pub fn optimize_for(mut self, strategy: OptimizeFor) -> Self {
        self.optimize_for = strategy;
        self
    }

    pub fn fallback_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.fallback_strategy = strategy;
        self
    }

    /// Validate value ranges. Impossible values are caller errors, not
    /// "no match" outcomes.
    pub fn validate(&self) -> Result<(), GateError> {
        if let Some(budget) = self.budget {
            if !budget.is_finite() || budget <= 0.0 {
                return Err(GateError::invalid_configuration(format!(
                    "budget must be a positive amount, got {budget}"
                )));
            }
        }
        if let Some(score) = self.min_intelligence {
            if !(1..=10).contains(&score) {
                return Err(GateError::invalid_configuration(format!(
                    "min_intelligence must be within 1..=10, got {score}"
                )));
            }
        }
        Ok(())
    }

    /// Compile the hard constraints down to a registry query. Ranking and
    /// provider preference are selector concerns and do not appear here.
    pub fn to_query(&self) -> ModelQuery {
        ModelQuery {
            required_features: self.required_features.clone(),
            max_avg_cost: self.budget,
            max_latency: self.max_latency,
            min_context_length: self.min_context_length,
            min_intelligence: self.min_intelligence,
            allowlist: self.allowlist.clone(),
            denylist: self.denylist.clone(),
            ..ModelQuery::default()
        }
    }
}

/// Registry-facing filter set.
///
/// Bucket filters (provider, speed, pricing tier, capabilities) are served
/// from indices; the scalar bounds are applied to the reduced candidate set.
#[derive(Debug, Clone, Default)]
pub struct ModelQuery {
    pub provider: Option<String>,
    pub required_features: Vec<Capability>,
    pub speed: Option<Speed>,
    pub pricing_tier: Option<PricingTier>,
    pub max_avg_cost: Option<f64>,
    pub max_latency: Option<Speed>,
    pub min_context_length: Option<u32>,
    pub max_context_length: Option<u32>,
    pub min_intelligence: Option<u8>,
    /// Include descriptors whose lifecycle flag excludes them from
    /// selection. Off by default.
    pub include_inactive: bool,
    pub allowlist: Vec<String>,
    pub denylist: Vec<String>,
}

impl ModelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider<S: Into<String>>(mut self, provider: S) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_feature(mut self, capability: Capability) -> Self {
        self.required_features.push(capability);
        self
    }

    pub fn speed(mut self, speed: Speed) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn pricing_tier(mut self, tier: PricingTier) -> Self {
        self.pricing_tier = Some(tier);
        self
    }

    pub fn max_avg_cost(mut self, ceiling: f64) -> Self {
        self.max_avg_cost = Some(ceiling);
        self
    }

    pub fn min_context_length(mut self, tokens: u32) -> Self {
        self.min_context_length = Some(tokens);
        self
    }

    pub fn min_intelligence(mut self, score: u8) -> Self {
        self.min_intelligence = Some(score);
        self
    }

    /// Whether a descriptor passes the scalar (non-index) filters.
    pub fn matches_scalars(&self, descriptor: &ModelDescriptor) -> bool {
        if let Some(ceiling) = self.max_avg_cost {
            if descriptor.average_cost() > ceiling {
                return false;
            }
        }
        if let Some(ceiling) = self.max_latency {
            if !descriptor.speed.within(ceiling) {
                return false;
            }
        }
        if let Some(min) = self.min_context_length {
            if descriptor.context_length < min {
                return false;
            }
        }
        if let Some(max) = self.max_context_length {
            if descriptor.context_length > max {
                return false;
            }
        }
        if let Some(min) = self.min_intelligence {
            if descriptor.intelligence < min {
                return false;
            }
        }
        if !self.denylist.is_empty()
            && self.denylist.iter().any(|id| id.eq_ignore_ascii_case(&descriptor.id))
        {
            return false;
        }
        if !self.allowlist.is_empty()
            && !self.allowlist.iter().any(|id| id.eq_ignore_ascii_case(&descriptor.id))
        {
            return false;
        }
        true
    }
}

/// One excluded candidate and the constraint that excluded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub id: String,
    pub reason: String,
}

/// Human-readable justification attached to a selection. This is an audit
/// trail, never a decision input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionReason {
    /// One-line justification for the winner.
    pub primary: String,
    /// Contributing facts (applied constraints, ranking strategy).
    pub factors: Vec<String>,
    /// Ids of the next-ranked candidates, up to [`ALTERNATIVE_LIMIT`].
    pub alternatives: Vec<String>,
    /// Excluded candidates, capped at [`REJECTION_LIMIT`].
    pub rejections: Vec<Rejection>,
}

/// A winning descriptor plus its justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub model: ModelDescriptor,
    pub reason: SelectionReason,
}

/// Outcome of a policy selection.
///
/// Constraint exhaustion is a domain outcome, not an error: callers branch on
/// `NoCandidates` the same way they branch on any business result. The
/// rejection trail is preserved so an empty outcome can still be explained.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectionOutcome {
    Selected(SelectionResult),
    NoCandidates { rejections: Vec<Rejection> },
}

impl SelectionOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, SelectionOutcome::Selected(_))
    }

    pub fn selected(&self) -> Option<&SelectionResult> {
        match self {
            SelectionOutcome::Selected(result) => Some(result),
            SelectionOutcome::NoCandidates { .. } => None,
        }
    }

    pub fn into_selected(self) -> Option<SelectionResult> {
        match self {
            SelectionOutcome::Selected(result) => Some(result),
            SelectionOutcome::NoCandidates { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_constraints() {
        let options = SelectionOptions::new()
            .with_required_feature(Capability::Tools)
            .with_budget(1.5)
            .with_max_latency(Speed::Medium)
            .prefer_provider("anthropic")
            .optimize_for(OptimizeFor::Cost);
        assert_eq!(options.required_features, vec![Capability::Tools]);
        assert_eq!(options.budget, Some(1.5));
        assert_eq!(options.optimize_for, OptimizeFor::Cost);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validate_rejects_nonpositive_budget() {
        let options = SelectionOptions::new().with_budget(0.0);
        assert!(options.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_intelligence() {
        let options = SelectionOptions::new().with_min_intelligence(11);
        assert!(options.validate().is_err());
    }

    #[test]
    fn options_deserialize_with_all_defaults() {
        let options: SelectionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.optimize_for, OptimizeFor::Balanced);
        assert_eq!(options.fallback_strategy, FallbackStrategy::Cheapest);
        assert!(options.budget.is_none());
    }
}
