//! Policy-based model selection
//!
//! The general-purpose selection pipeline: an ordered series of hard
//! filters, a ranking pass, and a soft provider-preference re-sort. Each
//! stage narrows the candidate set and records why candidates fell out, so
//! every selection carries an auditable explanation.
//!
//! Constraint exhaustion is a domain outcome
//! ([`SelectionOutcome::NoCandidates`]), not an error. Only malformed
//! options fail loudly.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::GateError;
use crate::registry::Registry;
use crate::selector::tier::BALANCED_COST_EPSILON;
use crate::types::{
    FallbackStrategy, ModelDescriptor, OptimizeFor, Rejection, SelectionOptions, SelectionOutcome,
    SelectionReason, SelectionResult, ALTERNATIVE_LIMIT, REJECTION_LIMIT,
};

/// Intent keyword that seeds the pipeline from all active models instead of
/// a single named model.
pub const DEFAULT_INTENT: &str = "default";

fn is_default_intent(intent: &str) -> bool {
    let trimmed = intent.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case(DEFAULT_INTENT)
        || trimmed.eq_ignore_ascii_case("auto")
}

/// Composite score for the balanced ranking strategy.
fn balanced_rank(model: &ModelDescriptor) -> f64 {
    f64::from(model.intelligence) * f64::from(model.speed.ordinal())
        / model.average_cost().max(BALANCED_COST_EPSILON)
}

fn no_candidates(mut rejections: Vec<Rejection>) -> SelectionOutcome {
    rejections.truncate(REJECTION_LIMIT);
    SelectionOutcome::NoCandidates { rejections }
}

/// General-purpose model selector over a registry snapshot.
pub struct PolicySelector {
    registry: Arc<Registry>,
}

impl PolicySelector {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Run the selection pipeline for an intent.
    ///
    /// `intent` is either the default keyword (seed from all active models)
    /// or an explicit catalog id (singleton seed). Returns the winner with
    /// its justification, or a typed no-candidates outcome carrying the
    /// rejection trail.
    pub fn select(
        &self,
        intent: &str,
        options: &SelectionOptions,
    ) -> Result<SelectionOutcome, GateError> {
        options.validate()?;

        let mut rejections: Vec<Rejection> = Vec::new();
        let mut factors: Vec<String> = Vec::new();

        let mut candidates: Vec<&ModelDescriptor> = if is_default_intent(intent) {
            self.registry.active().collect()
        } else {
            factors.push(format!("explicit model request '{intent}'"));
            match self.registry.get(intent) {
                Some(model) if model.active => vec![model],
                Some(model) => {
                    rejections.push(Rejection {
                        id: model.id.clone(),
                        reason: "model is disabled".to_string(),
                    });
                    Vec::new()
                }
                None => {
                    rejections.push(Rejection {
                        id: intent.trim().to_ascii_lowercase(),
                        reason: "not found in catalog".to_string(),
                    });
                    Vec::new()
                }
            }
        };
        debug!(intent, seeded = candidates.len(), "selection pipeline seeded");
        if candidates.is_empty() {
            return Ok(no_candidates(rejections));
        }

        if !options.required_features.is_empty() {
            let required = options.required_features.clone();
            factors.push(format!(
                "required features: {}",
                required
                    .iter()
                    .map(|c| c.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            candidates = filter_stage(candidates, &mut rejections, "features", |m| {
                required
                    .iter()
                    .find(|c| !m.supports(**c))
                    .map(|c| format!("missing required feature {}", c.name()))
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }

        if let Some(budget) = options.budget {
            factors.push(format!("budget: average cost at most {budget}"));
            candidates = filter_stage(candidates, &mut rejections, "budget", |m| {
                (m.average_cost() > budget).then(|| {
                    format!(
                        "over budget: average cost {:.3} exceeds {budget}",
                        m.average_cost()
                    )
                })
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }

        if let Some(ceiling) = options.max_latency {
            factors.push(format!("latency ceiling: {}", ceiling.as_str()));
            candidates = filter_stage(candidates, &mut rejections, "latency", |m| {
                (!m.speed.within(ceiling))
                    .then(|| format!("slower than the {} ceiling", ceiling.as_str()))
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }

        if let Some(min_context) = options.min_context_length {
            factors.push(format!("context window of at least {min_context} tokens"));
            candidates = filter_stage(candidates, &mut rejections, "context", |m| {
                (m.context_length < min_context)
                    .then(|| format!("context window {} below {min_context}", m.context_length))
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }

        if let Some(min_intelligence) = options.min_intelligence {
            factors.push(format!("intelligence of at least {min_intelligence}"));
            candidates = filter_stage(candidates, &mut rejections, "intelligence", |m| {
                (m.intelligence < min_intelligence)
                    .then(|| format!("intelligence {} below {min_intelligence}", m.intelligence))
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }

        // Deny takes priority; the allow-list sees the already-denied set.
        if !options.denylist.is_empty() {
            let denylist = options.denylist.clone();
            candidates = filter_stage(candidates, &mut rejections, "denylist", |m| {
                denylist
                    .iter()
                    .any(|id| id.eq_ignore_ascii_case(&m.id))
                    .then(|| "deny-listed".to_string())
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }
        if !options.allowlist.is_empty() {
            let allowlist = options.allowlist.clone();
            candidates = filter_stage(candidates, &mut rejections, "allowlist", |m| {
                (!allowlist.iter().any(|id| id.eq_ignore_ascii_case(&m.id)))
                    .then(|| "not on allow-list".to_string())
            });
            if candidates.is_empty() {
                return Ok(no_candidates(rejections));
            }
        }

        match options.optimize_for {
            OptimizeFor::Cost => {
                candidates.sort_by(|a, b| a.average_cost().total_cmp(&b.average_cost()));
            }
            OptimizeFor::Speed => {
                candidates.sort_by_key(|m| std::cmp::Reverse(m.speed.ordinal()));
            }
            OptimizeFor::Quality => {
                candidates.sort_by_key(|m| std::cmp::Reverse(m.intelligence));
            }
            OptimizeFor::Balanced => {
                candidates.sort_by(|a, b| balanced_rank(b).total_cmp(&balanced_rank(a)));
            }
        }
        factors.push(format!("ranked by {} strategy", options.optimize_for.as_str()));

        // Soft preference: reorder only, never remove. The sort is stable,
        // so the ranking above is preserved within each provider group.
        if !options.preferred_providers.is_empty() {
            candidates.sort_by_key(|m| {
                options
                    .preferred_providers
                    .iter()
                    .position(|p| p.eq_ignore_ascii_case(&m.provider))
                    .unwrap_or(usize::MAX)
            });
            factors.push(format!(
                "preferred providers: {}",
                options.preferred_providers.join(", ")
            ));
        }

        let winner = candidates[0].clone();
        let alternatives: Vec<String> = candidates[1..]
            .iter()
            .take(ALTERNATIVE_LIMIT)
            .map(|m| m.id.clone())
            .collect();
        rejections.truncate(REJECTION_LIMIT);

        let primary = format!(
            "selected {} by the {} strategy from {} candidate(s)",
            winner.id,
            options.optimize_for.as_str(),
            candidates.len()
        );
        debug!(winner = %winner.id, "selection pipeline finished");

        Ok(SelectionOutcome::Selected(SelectionResult {
            model: winner,
            reason: SelectionReason {
                primary,
                factors,
                alternatives,
                rejections,
            },
        }))
    }

    /// Run the primary selection, then rescue an empty outcome with the
    /// configured fallback strategy.
    pub fn select_with_fallback(
        &self,
        intent: &str,
        options: &SelectionOptions,
    ) -> Result<SelectionOutcome, GateError> {
        let primary = self.select(intent, options)?;
        if primary.is_selected() {
            return Ok(primary);
        }
        warn!(
            intent,
            strategy = options.fallback_strategy.as_str(),
            "primary selection found no candidates, applying fallback"
        );

        let query = options.to_query();
        let rescued = match options.fallback_strategy {
            FallbackStrategy::Cheapest => self
                .registry
                .get_cheapest(&query)
                .map(|m| fallback_result(m, "cheapest model satisfying the hard constraints")),
            FallbackStrategy::Fastest => self
                .registry
                .get_fastest(&query)
                .map(|m| fallback_result(m, "fastest model satisfying the hard constraints")),
            FallbackStrategy::Semantic => return self.semantic_fallback(intent, options),
        };

        // A dry fallback keeps the primary outcome and its rejection trail.
        Ok(rescued.map(SelectionOutcome::Selected).unwrap_or(primary))
    }

    /// Find the closest active neighbor of a named model: same speed bucket,
    /// within one intelligence point, preferring the same provider and then
    /// the cheapest. Unknown anchors and dry neighborhoods fall through to a
    /// default-intent selection.
    fn semantic_fallback(
        &self,
        intent: &str,
        options: &SelectionOptions,
    ) -> Result<SelectionOutcome, GateError> {
        let Some(anchor) = self.registry.get(intent) else {
            debug!(intent, "semantic anchor not in catalog, selecting default intent");
            return self.select(DEFAULT_INTENT, options);
        };

        let neighbors: Vec<&ModelDescriptor> = self
            .registry
            .active()
            .filter(|m| {
                m.id != anchor.id
                    && m.speed == anchor.speed
                    && (i16::from(m.intelligence) - i16::from(anchor.intelligence)).abs() <= 1
            })
            .collect();
        if neighbors.is_empty() {
            debug!(anchor = %anchor.id, "no semantic neighbors, selecting default intent");
            return self.select(DEFAULT_INTENT, options);
        }

        let winner = neighbors.iter().copied().reduce(|best, m| {
            let best_foreign = best.provider != anchor.provider;
            let m_foreign = m.provider != anchor.provider;
            let closer = (!m_foreign && best_foreign)
                || (m_foreign == best_foreign && m.average_cost() < best.average_cost());
            if closer { m } else { best }
        });
        match winner {
            Some(model) => {
                let mut result = fallback_result(
                    model,
                    "closest semantic neighbor (same speed bucket, within one intelligence point)",
                );
                result
                    .reason
                    .factors
                    .push(format!("anchored on '{}'", anchor.id));
                Ok(SelectionOutcome::Selected(result))
            }
            None => self.select(DEFAULT_INTENT, options),
        }
    }
}

fn fallback_result(model: &ModelDescriptor, why: &str) -> SelectionResult {
    SelectionResult {
        model: model.clone(),
        reason: SelectionReason {
            primary: format!("fallback: {} is the {why}", model.id),
            factors: vec!["primary selection yielded no candidates".to_string()],
            alternatives: Vec::new(),
            rejections: Vec::new(),
        },
    }
}

fn filter_stage<'a>(
    candidates: Vec<&'a ModelDescriptor>,
    rejections: &mut Vec<Rejection>,
    stage: &str,
    mut reject_reason: impl FnMut(&ModelDescriptor) -> Option<String>,
) -> Vec<&'a ModelDescriptor> {
    let mut kept = Vec::with_capacity(candidates.len());
    for model in candidates {
        match reject_reason(model) {
            Some(reason) => rejections.push(Rejection {
                id: model.id.clone(),
                reason,
            }),
            None => kept.push(model),
        }
    }
    debug!(stage, remaining = kept.len(), "selection stage applied");
    kept
}
