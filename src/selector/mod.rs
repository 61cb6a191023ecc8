//! Selection algorithms over the registry.

pub mod policy;
pub mod tier;

pub use policy::{PolicySelector, DEFAULT_INTENT};
pub use tier::{select_for_tier, ModelTier, BALANCED_COST_EPSILON};
