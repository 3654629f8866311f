use thiserror::Error;

/// Errors from LLM provider calls.
///
/// Every variant is fatal to the query that triggered it; nothing here is
/// retried.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// The request never got a response.
    #[error("network: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("provider api: {0}")]
    Api(String),

    /// The provider response could not be parsed.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The provider answered without any candidate message.
    #[error("provider returned no choices")]
    Empty,
}
