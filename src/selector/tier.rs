//! Tier-based model selection
//!
//! A lightweight shortcut for the four coarse intents (cheap, fast, smart,
//! balanced), scoped to a caller's allow-list. Used when full policy
//! evaluation is unnecessary.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GateError;
use crate::registry::Registry;
use crate::types::{ModelDescriptor, Speed};

/// Cost floor for the balanced score, so free and near-free models do not
/// divide by zero.
pub const BALANCED_COST_EPSILON: f64 = 1e-4;

/// The four coarse selection intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Cheap,
    Fast,
    Smart,
    Balanced,
}

impl ModelTier {
    /// Parse a tier keyword. Returns `None` for anything that is not one of
    /// the four keywords, so callers can treat the input as a model name.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "cheap" => Some(ModelTier::Cheap),
            "fast" => Some(ModelTier::Fast),
            "smart" => Some(ModelTier::Smart),
            "balanced" => Some(ModelTier::Balanced),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelTier::Cheap => "cheap",
            ModelTier::Fast => "fast",
            ModelTier::Smart => "smart",
            ModelTier::Balanced => "balanced",
        }
    }
}

/// Select one model for a tier from an allow-list.
///
/// Allow-list entries that do not resolve in the catalog are dropped with a
/// warning rather than aborting the selection; inactive descriptors are
/// dropped the same way. An allow-list that resolves to zero usable models
/// is a caller error (`NoModelsConfigured`), never silently defaulted.
///
/// All four heuristics reduce with a first-occurrence tie-break, matching
/// the registry's own discipline.
pub fn select_for_tier<'a>(
    registry: &'a Registry,
    tier: ModelTier,
    allowed_ids: &[String],
) -> Result<&'a ModelDescriptor, GateError> {
    if allowed_ids.is_empty() {
        return Err(GateError::NoModelsConfigured(
            "allow-list is empty".to_string(),
        ));
    }

    let resolved: Vec<&ModelDescriptor> = allowed_ids
        .iter()
        .filter_map(|id| match registry.get(id) {
            Some(model) if model.active => Some(model),
            Some(model) => {
                warn!(id = %model.id, "allow-list entry is inactive, dropping");
                None
            }
            None => {
                warn!(id = %id, "allow-list entry not found in catalog, dropping");
                None
            }
        })
        .collect();

    if resolved.is_empty() {
        return Err(GateError::NoModelsConfigured(format!(
            "none of the {} allowed ids resolve to a usable model",
            allowed_ids.len()
        )));
    }

    let winner = match tier {
        ModelTier::Cheap => cheapest(&resolved),
        ModelTier::Fast => {
            let fast: Vec<&ModelDescriptor> = resolved
                .iter()
                .copied()
                .filter(|m| m.speed == Speed::Fast)
                .collect();
            // Fast is a preference, not a hard requirement.
            if fast.is_empty() {
                cheapest(&resolved)
            } else {
                cheapest(&fast)
            }
        }
        ModelTier::Smart => resolved
            .iter()
            .copied()
            .reduce(|best, m| if m.intelligence > best.intelligence { m } else { best }),
        ModelTier::Balanced => resolved
            .iter()
            .copied()
            .reduce(|best, m| {
                if balanced_score(m) > balanced_score(best) {
                    m
                } else {
                    best
                }
            }),
    };

    winner.ok_or_else(|| GateError::NoModelsConfigured("no usable models".to_string()))
}

fn cheapest<'a>(models: &[&'a ModelDescriptor]) -> Option<&'a ModelDescriptor> {
    models
        .iter()
        .copied()
        .reduce(|best, m| if m.average_cost() < best.average_cost() { m } else { best })
}

fn balanced_score(model: &ModelDescriptor) -> f64 {
    f64::from(model.intelligence) / model.average_cost().max(BALANCED_COST_EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn registry() -> Registry {
        Registry::new(Catalog::builtin())
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cheap_minimizes_average_cost() {
        let reg = registry();
        let allowed = ids(&["openai#gpt-4o-mini", "openai#gpt-4o"]);
        let winner = select_for_tier(&reg, ModelTier::Cheap, &allowed).unwrap();
        assert_eq!(winner.id, "openai#gpt-4o-mini");
    }

    #[test]
    fn smart_maximizes_intelligence() {
        let reg = registry();
        let allowed = ids(&["openai#gpt-4o-mini", "openai#gpt-4o"]);
        let winner = select_for_tier(&reg, ModelTier::Smart, &allowed).unwrap();
        assert_eq!(winner.id, "openai#gpt-4o");
    }

    #[test]
    fn fast_prefers_fast_bucket() {
        let reg = registry();
        let allowed = ids(&["anthropic#claude-sonnet-4", "anthropic#claude-3-5-haiku"]);
        let winner = select_for_tier(&reg, ModelTier::Fast, &allowed).unwrap();
        assert_eq!(winner.id, "anthropic#claude-3-5-haiku");
    }

    #[test]
    fn fast_falls_back_to_cheapest_when_none_fast() {
        let reg = registry();
        let allowed = ids(&["anthropic#claude-sonnet-4", "anthropic#claude-opus-4"]);
        let winner = select_for_tier(&reg, ModelTier::Fast, &allowed).unwrap();
        assert_eq!(winner.id, "anthropic#claude-sonnet-4");
    }

    #[test]
    fn balanced_weighs_intelligence_against_cost() {
        let reg = registry();
        let allowed = ids(&["anthropic#claude-opus-4", "openai#gpt-4o-mini"]);
        let winner = select_for_tier(&reg, ModelTier::Balanced, &allowed).unwrap();
        assert_eq!(winner.id, "openai#gpt-4o-mini");
    }

    #[test]
    fn unresolved_ids_are_dropped_not_fatal() {
        let reg = registry();
        let allowed = ids(&["openai#typo-model", "openai#gpt-4o-mini"]);
        let winner = select_for_tier(&reg, ModelTier::Cheap, &allowed).unwrap();
        assert_eq!(winner.id, "openai#gpt-4o-mini");
    }

    #[test]
    fn empty_allow_list_is_an_error() {
        let reg = registry();
        let err = select_for_tier(&reg, ModelTier::Cheap, &[]).unwrap_err();
        assert!(matches!(err, GateError::NoModelsConfigured(_)));
    }

    #[test]
    fn fully_unresolved_allow_list_is_an_error() {
        let reg = registry();
        let allowed = ids(&["nope#one", "nope#two"]);
        let err = select_for_tier(&reg, ModelTier::Smart, &allowed).unwrap_err();
        assert!(matches!(err, GateError::NoModelsConfigured(_)));
    }

    #[test]
    fn selection_is_deterministic() {
        let reg = registry();
        let allowed = ids(&["openai#gpt-4o-mini", "google#gemini-2.5-flash"]);
        let first = select_for_tier(&reg, ModelTier::Cheap, &allowed).unwrap().id.clone();
        let second = select_for_tier(&reg, ModelTier::Cheap, &allowed).unwrap().id.clone();
        assert_eq!(first, second);
    }

    #[test]
    fn tier_keywords_parse_case_insensitively() {
        assert_eq!(ModelTier::parse("CHEAP"), Some(ModelTier::Cheap));
        assert_eq!(ModelTier::parse(" balanced "), Some(ModelTier::Balanced));
        assert_eq!(ModelTier::parse("gpt-4o"), None);
    }
}
