//! Default Configuration Values
//!
//! Centralizes the defaults used when binding provider clients, so they are
//! easy to document and adjust in one place.

use std::time::Duration;

/// HTTP client defaults shared by every provider client.
pub mod http {
    use super::*;

    /// Default request timeout.
    ///
    /// Large models can take tens of seconds to respond; the handle consumer
    /// drives the request, so this only bounds the worst case.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default timeout for establishing a connection.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent for outbound requests.
    pub const USER_AGENT: &str = concat!("modelgate/", env!("CARGO_PKG_VERSION"));
}

/// Provider endpoints and credential sources.
pub mod providers {
    /// OpenAI defaults.
    pub mod openai {
        pub const BASE_URL: &str = "https://api.openai.com/v1";
        pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
    }

    /// Anthropic defaults.
    pub mod anthropic {
        pub const BASE_URL: &str = "https://api.anthropic.com";
        pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
        /// API version header value required by the Messages API.
        pub const API_VERSION: &str = "2023-06-01";
    }

    /// Google Gemini defaults.
    pub mod google {
        pub const BASE_URL: &str = "https://generativelanguage.googleapis.com";
        pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
    }

    /// Groq defaults.
    pub mod groq {
        pub const BASE_URL: &str = "https://api.groq.com/openai/v1";
        pub const API_KEY_ENV: &str = "GROQ_API_KEY";
    }
}
