//! Core data model for the selection engine.

mod descriptor;
mod selection;

pub use descriptor::{Capability, ModelDescriptor, PricingTier, Speed, ID_SEPARATOR};
pub use selection::{
    FallbackStrategy, ModelQuery, OptimizeFor, Rejection, SelectionOptions, SelectionOutcome,
    SelectionReason, SelectionResult, ALTERNATIVE_LIMIT, REJECTION_LIMIT,
};
