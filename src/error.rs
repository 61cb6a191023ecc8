//! Error Handling Module
//!
//! This module provides the error taxonomy for the selection and
//! access-control engine. Access and identity violations are errors;
//! constraint exhaustion in the policy selector is a value
//! (see [`crate::types::SelectionOutcome`]), never an `Err`.

use thiserror::Error;

/// Errors raised by the selection and access-control engine.
#[derive(Debug, Error)]
pub enum GateError {
    /// The name or id does not resolve to any catalog entry.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The model exists in the catalog but is outside the caller's allow-list.
    #[error("Model '{model}' is not in the allowed models for caller '{caller}'")]
    NotInAllowedModels { caller: String, model: String },

    /// The model's provider has no usable client for this session.
    #[error("Provider '{0}' is not configured for this session")]
    ProviderNotConfigured(String),

    /// A tier selection received an allow-list resolving to zero usable models.
    #[error("No models configured: {0}")]
    NoModelsConfigured(String),

    /// The caller asserted an input kind that the input does not match.
    #[error("Expected a {expected} but got '{input}'")]
    StrictKindMismatch { expected: &'static str, input: String },

    /// A bring-your-own-credentials session was constructed without credentials.
    #[error("BYOK session requires at least one provider credential")]
    MissingCredentials,

    /// Malformed caller input (a programmer error, fails loudly).
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl GateError {
    /// Create a `ModelNotFound` error.
    pub fn model_not_found<S: Into<String>>(name: S) -> Self {
        Self::ModelNotFound(name.into())
    }

    /// Create a `NotInAllowedModels` error.
    pub fn not_allowed<C: Into<String>, M: Into<String>>(caller: C, model: M) -> Self {
        Self::NotInAllowedModels {
            caller: caller.into(),
            model: model.into(),
        }
    }

    /// Create a `ProviderNotConfigured` error.
    pub fn provider_not_configured<S: Into<String>>(provider: S) -> Self {
        Self::ProviderNotConfigured(provider.into())
    }

    /// Create an `InvalidConfiguration` error.
    pub fn invalid_configuration<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}
