//! LLM provider adapters.
//!
//! Each provider implements [`Backend`] for its specific API.

mod anthropic;
mod openai;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
pub use openai::{OpenAiBackend, OpenAiBackendBuilder};

use crate::model::{Backend, ModelError, ModelRequest, ModelResponse};

/// A backend chosen at runtime from configuration.
pub enum ProviderBackend {
    Anthropic(AnthropicBackend),
    OpenAi(OpenAiBackend),
}

impl From<AnthropicBackend> for ProviderBackend {
    fn from(backend: AnthropicBackend) -> Self {
        Self::Anthropic(backend)
    }
}

impl From<OpenAiBackend> for ProviderBackend {
    fn from(backend: OpenAiBackend) -> Self {
        Self::OpenAi(backend)
    }
}

impl std::fmt::Display for ProviderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic(backend) => backend.fmt(f),
            Self::OpenAi(backend) => backend.fmt(f),
        }
    }
}

impl Backend for ProviderBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        match self {
            Self::Anthropic(backend) => backend.call(request).await,
            Self::OpenAi(backend) => backend.call(request).await,
        }
    }
}
