//! Provider catalogue. Adding a provider means adding a variant here; every
//! capability difference is answered by a match on `ProviderKind`.

use std::fmt;

use serde::Serialize;

/// The LLM providers the recommender knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions, with forced function calling for the canonical schema.
    OpenAi,
    /// OpenRouter chat completions, plain content only.
    OpenRouter,
}

impl ProviderKind {
    /// Fixed attempt order. The first configured provider to succeed wins.
    pub const PRIORITY: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::OpenRouter];

    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn supports_structured_schema(self) -> bool {
        match self {
            ProviderKind::OpenAi => true,
            ProviderKind::OpenRouter => false,
        }
    }

    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1/chat/completions",
            ProviderKind::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::OpenRouter => "openai/gpt-4o-mini",
        }
    }

    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_KEY",
            ProviderKind::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn endpoint_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_API_URL",
            ProviderKind::OpenRouter => "OPENROUTER_API_URL",
        }
    }

    pub fn model_var(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI_MODEL",
            ProviderKind::OpenRouter => "OPENROUTER_MODEL",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One configured provider: where to send requests and with which credential.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    /// Sent verbatim on every request to this provider.
    pub extra_headers: Vec<(String, String)>,
}

// Keeps the API key out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("extra_headers", &self.extra_headers)
            .finish()
    }
}
