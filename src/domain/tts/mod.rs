pub mod client;
pub mod dto;
pub mod error;
pub mod language;
pub mod rate_limiter;

pub use client::{RetryPolicy, SynthesisClient};
pub use dto::AudioPayload;
pub use error::{snippet, FatalKind, FatalSynthesisError, SynthesisError, SynthesisFailure};
pub use language::{LanguageCode, Role};
pub use rate_limiter::RateLimiter;
