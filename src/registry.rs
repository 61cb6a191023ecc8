//! Model Registry
//!
//! Indexed, queryable view over a catalog. All indices are built once at
//! construction (amortized O(n)); a refresh builds a complete replacement
//! and swaps it in, so readers never observe a half-rebuilt index set.
//! Lookup failures are values (`None` / empty lists), never errors.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::info;

use crate::catalog::Catalog;
use crate::types::{Capability, ModelDescriptor, ModelQuery, PricingTier, Speed};

/// Indexed registry over an immutable catalog.
#[derive(Debug)]
pub struct Registry {
    catalog: Catalog,
    by_id: HashMap<String, usize>,
    by_provider: HashMap<String, HashSet<usize>>,
    by_capability: HashMap<Capability, HashSet<usize>>,
    by_speed: HashMap<Speed, HashSet<usize>>,
    by_pricing_tier: HashMap<PricingTier, HashSet<usize>>,
    /// Ascending average cost.
    by_cost: Vec<usize>,
    /// Ascending context length.
    by_context: Vec<usize>,
    /// Descending intelligence.
    by_intelligence: Vec<usize>,
}

impl Registry {
    /// Build all indices over the given catalog.
    pub fn new(catalog: Catalog) -> Self {
        let mut by_id = HashMap::with_capacity(catalog.len());
        let mut by_provider: HashMap<String, HashSet<usize>> = HashMap::new();
        let mut by_capability: HashMap<Capability, HashSet<usize>> = HashMap::new();
        let mut by_speed: HashMap<Speed, HashSet<usize>> = HashMap::new();
        let mut by_pricing_tier: HashMap<PricingTier, HashSet<usize>> = HashMap::new();

        for (index, model) in catalog.iter().enumerate() {
            by_id.insert(model.id.clone(), index);
            by_provider
                .entry(model.provider.clone())
                .or_default()
                .insert(index);
            for capability in Capability::ALL {
                if model.supports(capability) {
                    by_capability.entry(capability).or_default().insert(index);
                }
            }
            by_speed.entry(model.speed).or_default().insert(index);
            by_pricing_tier
                .entry(model.pricing_tier)
                .or_default()
                .insert(index);
        }

        let models = catalog.models();
        let mut by_cost: Vec<usize> = (0..models.len()).collect();
        by_cost.sort_by(|&a, &b| models[a].average_cost().total_cmp(&models[b].average_cost()));
        let mut by_context: Vec<usize> = (0..models.len()).collect();
        by_context.sort_by_key(|&i| models[i].context_length);
        let mut by_intelligence: Vec<usize> = (0..models.len()).collect();
        by_intelligence.sort_by_key(|&i| std::cmp::Reverse(models[i].intelligence));

        info!(models = catalog.len(), "model registry built");

        Self {
            catalog,
            by_id,
            by_provider,
            by_capability,
            by_speed,
            by_pricing_tier,
            by_cost,
            by_context,
            by_intelligence,
        }
    }

    /// Replace every index with a rebuild over `catalog`. The new state is
    /// fully constructed before the old one is dropped.
    pub fn refresh(&mut self, catalog: Catalog) {
        *self = Registry::new(catalog);
    }

    /// Look up a descriptor by id, case-insensitively. Unknown ids are a
    /// `None`, never an error.
    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        let key = id.trim().to_ascii_lowercase();
        self.by_id.get(&key).map(|&i| &self.catalog.models()[i])
    }

    /// Resolve by exact id first, then by bare model name (provider-agnostic
    /// match against the model portion, first match in catalog order).
    pub fn resolve_name(&self, name: &str) -> Option<&ModelDescriptor> {
        if let Some(model) = self.get(name) {
            return Some(model);
        }
        let needle = name.trim().to_ascii_lowercase();
        self.catalog
            .iter()
            .find(|m| m.model.to_ascii_lowercase() == needle)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        self.catalog.models()
    }

    /// All descriptors participating in selection, in catalog order.
    pub fn active(&self) -> impl Iterator<Item = &ModelDescriptor> {
        self.catalog.iter().filter(|m| m.active)
    }

    /// Filter the catalog by a query.
    ///
    /// Bucket filters (provider, capabilities, speed, pricing tier) are
    /// served by intersecting index sets starting from the most selective
    /// one; scalar bounds are applied to the reduced candidate set. A bucket
    /// filter with no index entry short-circuits to an empty result without
    /// scanning the catalog. Results keep catalog order.
    pub fn list(&self, query: &ModelQuery) -> Vec<&ModelDescriptor> {
        let mut sets: Vec<&HashSet<usize>> = Vec::new();

        if let Some(provider) = &query.provider {
            match self.by_provider.get(&provider.to_ascii_lowercase()) {
                Some(set) => sets.push(set),
                None => return Vec::new(),
            }
        }
        for capability in &query.required_features {
            match self.by_capability.get(capability) {
                Some(set) => sets.push(set),
                None => return Vec::new(),
            }
        }
        if let Some(speed) = query.speed {
            match self.by_speed.get(&speed) {
                Some(set) => sets.push(set),
                None => return Vec::new(),
            }
        }
        if let Some(tier) = query.pricing_tier {
            match self.by_pricing_tier.get(&tier) {
                Some(set) => sets.push(set),
                None => return Vec::new(),
            }
        }

        let candidates: Vec<usize> = if let Some(smallest) =
            sets.iter().enumerate().min_by_key(|(_, s)| s.len()).map(|(i, _)| i)
        {
            let seed = sets[smallest];
            let mut reduced: Vec<usize> = seed
                .iter()
                .copied()
                .filter(|index| {
                    sets.iter()
                        .enumerate()
                        .all(|(i, set)| i == smallest || set.contains(index))
                })
                .collect();
            reduced.sort_unstable();
            reduced
        } else {
            (0..self.catalog.len()).collect()
        };

        candidates
            .into_iter()
            .map(|i| &self.catalog.models()[i])
            .filter(|m| (query.include_inactive || m.active) && query.matches_scalars(m))
            .collect()
    }

    /// Active descriptors with average cost at or under `max_avg_cost`,
    /// cheapest first. Walks the cost-sorted view and stops at the first
    /// descriptor over the ceiling.
    pub fn find_in_budget(&self, max_avg_cost: f64) -> Vec<&ModelDescriptor> {
        self.by_cost
            .iter()
            .map(|&i| &self.catalog.models()[i])
            .take_while(|m| m.average_cost() <= max_avg_cost)
            .filter(|m| m.active)
            .collect()
    }

    /// Active descriptors with at least `min_tokens` of context, smallest
    /// qualifying window first. The context-sorted view makes this a suffix.
    pub fn find_by_min_context(&self, min_tokens: u32) -> Vec<&ModelDescriptor> {
        let models = self.catalog.models();
        let split = self
            .by_context
            .partition_point(|&i| models[i].context_length < min_tokens);
        self.by_context[split..]
            .iter()
            .map(|&i| &models[i])
            .filter(|m| m.active)
            .collect()
    }

    /// Active descriptors scoring at least `min_score`, most intelligent
    /// first. Walks the intelligence-sorted view and stops at the first
    /// descriptor below the floor.
    pub fn find_by_min_intelligence(&self, min_score: u8) -> Vec<&ModelDescriptor> {
        self.by_intelligence
            .iter()
            .map(|&i| &self.catalog.models()[i])
            .take_while(|m| m.intelligence >= min_score)
            .filter(|m| m.active)
            .collect()
    }

    /// Cheapest match for a query. Ties resolve to the earliest catalog
    /// entry; the tie-break is deterministic by design.
    pub fn get_cheapest(&self, query: &ModelQuery) -> Option<&ModelDescriptor> {
        self.list(query)
            .into_iter()
            .reduce(|best, m| if m.average_cost() < best.average_cost() { m } else { best })
    }

    /// Fastest match for a query, same tie-break discipline.
    pub fn get_fastest(&self, query: &ModelQuery) -> Option<&ModelDescriptor> {
        self.list(query)
            .into_iter()
            .reduce(|best, m| if m.speed.ordinal() > best.speed.ordinal() { m } else { best })
    }

    /// Most intelligent match for a query, same tie-break discipline.
    pub fn get_most_intelligent(&self, query: &ModelQuery) -> Option<&ModelDescriptor> {
        self.list(query)
            .into_iter()
            .reduce(|best, m| if m.intelligence > best.intelligence { m } else { best })
    }

    /// Aggregate counts and catalog-wide averages over active models.
    pub fn stats(&self) -> RegistryStats {
        let mut by_provider: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_speed: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_pricing_tier: BTreeMap<String, usize> = BTreeMap::new();
        let mut cost_sum = 0.0;
        let mut context_sum = 0u64;
        let mut active = 0usize;

        for model in self.active() {
            active += 1;
            *by_provider.entry(model.provider.clone()).or_default() += 1;
            *by_speed.entry(model.speed.as_str().to_string()).or_default() += 1;
            *by_pricing_tier
                .entry(model.pricing_tier.as_str().to_string())
                .or_default() += 1;
            cost_sum += model.average_cost();
            context_sum += u64::from(model.context_length);
        }

        RegistryStats {
            total_models: self.catalog.len(),
            active_models: active,
            by_provider,
            by_speed,
            by_pricing_tier,
            average_cost: if active == 0 { 0.0 } else { cost_sum / active as f64 },
            average_context_length: if active == 0 {
                0.0
            } else {
                context_sum as f64 / active as f64
            },
        }
    }
}

/// Aggregate registry counts for observability surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_models: usize,
    pub active_models: usize,
    pub by_provider: BTreeMap<String, usize>,
    pub by_speed: BTreeMap<String, usize>,
    pub by_pricing_tier: BTreeMap<String, usize>,
    pub average_cost: f64,
    pub average_context_length: f64,
}

/// Concurrently readable registry with replace-then-publish refresh.
///
/// Readers clone an `Arc` snapshot and keep using it for as long as they
/// like; `refresh` builds the replacement outside the lock and swaps the
/// reference, so no reader ever sees a partial rebuild.
#[derive(Debug)]
pub struct SharedRegistry {
    inner: RwLock<Arc<Registry>>,
}

impl SharedRegistry {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: RwLock::new(Arc::new(Registry::new(catalog))),
        }
    }

    /// Current registry snapshot.
    pub fn load(&self) -> Arc<Registry> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rebuild over a new catalog and publish the replacement atomically.
    pub fn refresh(&self, catalog: Catalog) {
        let fresh = Arc::new(Registry::new(catalog));
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = fresh;
        info!("model registry refreshed");
    }
}
