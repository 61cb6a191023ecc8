//! Provider clients and invocation handles
//!
//! Each provider implements the small [`ProviderClient`] capability
//! interface: hold credentials and an HTTP client, and bind a descriptor
//! into an [`InvocationHandle`]. The handle is the engine's entire contract
//! with the code that actually calls the model: a correctly provider-bound,
//! id-tagged starting point. The engine itself never sends a request.
//!
//! Credentials are held as `SecretString` and installed into the HTTP
//! client's default headers once at construction; the header values are
//! marked sensitive so they never appear in logs.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::defaults;
use crate::error::GateError;
use crate::types::ModelDescriptor;

/// Capability interface implemented once per provider.
pub trait ProviderClient: Send + Sync + fmt::Debug {
    /// Lower-case provider name, matching descriptor `provider` fields.
    fn provider_id(&self) -> &str;

    /// Bind a descriptor into an invocation handle.
    fn bind(&self, descriptor: &ModelDescriptor) -> InvocationHandle;
}

/// An opaque, provider-bound handle for one model.
///
/// The handle is tagged with the canonical catalog id for downstream
/// tracking and exposes a pre-authorized request builder; driving the
/// request (and any retry policy) belongs to the consumer.
#[derive(Debug, Clone)]
pub struct InvocationHandle {
    model_id: String,
    provider_id: String,
    provider_model: String,
    endpoint: String,
    http: reqwest::Client,
}

impl InvocationHandle {
    /// Canonical catalog id (`provider#model`).
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Raw provider-side model name.
    pub fn provider_model(&self) -> &str {
        &self.provider_model
    }

    /// Endpoint the handle is bound to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Start a request against the bound endpoint. Authentication headers
    /// are already installed on the underlying client.
    pub fn request(&self) -> reqwest::RequestBuilder {
        self.http.post(&self.endpoint)
    }
}

fn build_http_client(headers: HeaderMap) -> Result<reqwest::Client, GateError> {
    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(defaults::http::REQUEST_TIMEOUT)
        .connect_timeout(defaults::http::CONNECT_TIMEOUT)
        .user_agent(defaults::http::USER_AGENT)
        .build()
        .map_err(|e| GateError::invalid_configuration(format!("failed to build HTTP client: {e}")))
}

fn sensitive_header(value: String) -> Result<HeaderValue, GateError> {
    let mut header = HeaderValue::from_str(&value).map_err(|_| {
        GateError::invalid_configuration("API key contains characters invalid in a header")
    })?;
    header.set_sensitive(true);
    Ok(header)
}

/// OpenAI chat-completions client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: &SecretString) -> Result<Self, GateError> {
        Self::with_base_url(api_key, defaults::providers::openai::BASE_URL)
    }

    pub fn with_base_url(
        api_key: &SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, GateError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            sensitive_header(format!("Bearer {}", api_key.expose_secret()))?,
        );
        Ok(Self {
            http: build_http_client(headers)?,
            base_url: base_url.into(),
        })
    }
}

impl ProviderClient for OpenAiClient {
    fn provider_id(&self) -> &str {
        "openai"
    }

    fn bind(&self, descriptor: &ModelDescriptor) -> InvocationHandle {
        InvocationHandle {
            model_id: descriptor.id.clone(),
            provider_id: self.provider_id().to_string(),
            provider_model: descriptor.model.clone(),
            endpoint: format!("{}/chat/completions", self.base_url),
            http: self.http.clone(),
        }
    }
}

/// Anthropic Messages API client.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: &SecretString) -> Result<Self, GateError> {
        Self::with_base_url(api_key, defaults::providers::anthropic::BASE_URL)
    }

    pub fn with_base_url(
        api_key: &SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, GateError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            sensitive_header(api_key.expose_secret().to_string())?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(defaults::providers::anthropic::API_VERSION),
        );
        Ok(Self {
            http: build_http_client(headers)?,
            base_url: base_url.into(),
        })
    }
}

impl ProviderClient for AnthropicClient {
    fn provider_id(&self) -> &str {
        "anthropic"
    }

    fn bind(&self, descriptor: &ModelDescriptor) -> InvocationHandle {
        InvocationHandle {
            model_id: descriptor.id.clone(),
            provider_id: self.provider_id().to_string(),
            provider_model: descriptor.model.clone(),
            endpoint: format!("{}/v1/messages", self.base_url),
            http: self.http.clone(),
        }
    }
}

/// Google Gemini client. The key travels in a header, not the URL, so it
/// cannot leak through request logs.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: &SecretString) -> Result<Self, GateError> {
        Self::with_base_url(api_key, defaults::providers::google::BASE_URL)
    }

    pub fn with_base_url(
        api_key: &SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, GateError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            sensitive_header(api_key.expose_secret().to_string())?,
        );
        Ok(Self {
            http: build_http_client(headers)?,
            base_url: base_url.into(),
        })
    }
}

impl ProviderClient for GeminiClient {
    fn provider_id(&self) -> &str {
        "google"
    }

    fn bind(&self, descriptor: &ModelDescriptor) -> InvocationHandle {
        InvocationHandle {
            model_id: descriptor.id.clone(),
            provider_id: self.provider_id().to_string(),
            provider_model: descriptor.model.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, descriptor.model
            ),
            http: self.http.clone(),
        }
    }
}

/// Groq client (OpenAI-compatible surface).
#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: &SecretString) -> Result<Self, GateError> {
        Self::with_base_url(api_key, defaults::providers::groq::BASE_URL)
    }

    pub fn with_base_url(
        api_key: &SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, GateError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            sensitive_header(format!("Bearer {}", api_key.expose_secret()))?,
        );
        Ok(Self {
            http: build_http_client(headers)?,
            base_url: base_url.into(),
        })
    }
}

impl ProviderClient for GroqClient {
    fn provider_id(&self) -> &str {
        "groq"
    }

    fn bind(&self, descriptor: &ModelDescriptor) -> InvocationHandle {
        InvocationHandle {
            model_id: descriptor.id.clone(),
            provider_id: self.provider_id().to_string(),
            provider_model: descriptor.model.clone(),
            endpoint: format!("{}/chat/completions", self.base_url),
            http: self.http.clone(),
        }
    }
}

/// Construct the client for a known provider name.
pub fn client_for(
    provider: &str,
    api_key: &SecretString,
) -> Result<Arc<dyn ProviderClient>, GateError> {
    match provider {
        "openai" => Ok(Arc::new(OpenAiClient::new(api_key)?)),
        "anthropic" => Ok(Arc::new(AnthropicClient::new(api_key)?)),
        "google" => Ok(Arc::new(GeminiClient::new(api_key)?)),
        "groq" => Ok(Arc::new(GroqClient::new(api_key)?)),
        other => Err(GateError::invalid_configuration(format!(
            "unknown provider '{other}'"
        ))),
    }
}
