mod canned;
mod gate;
mod groq;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::emotion::Emotion;

pub use canned::CannedQuoteGenerator;
pub use gate::GenerationGate;
pub use groq::GroqQuoteGenerator;

/// Context handed to the generation backend.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteRequest {
    pub emotion: Emotion,
    pub age: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub text: String,
}

#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error {0}: {1}")]
    Api(u16, String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Produces a short caption for the given emotion/age context. Network
/// bound and potentially slow; callers are expected to rate-limit and
/// time-bound invocations (see [`GenerationGate`]).
pub trait QuoteGenerator: Send + Sync {
    fn generate(&self, request: QuoteRequest) -> BoxFuture<'_, Result<Quote, GenerateError>>;
}
