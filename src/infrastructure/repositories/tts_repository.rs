use crate::domain::tts::{AudioPayload, LanguageCode, Role, SynthesisError};
use async_trait::async_trait;

/// Repository for remote TTS synthesis.
/// Abstracts the underlying provider (Gemini today).
///
/// Implementations perform exactly one remote call per invocation and are
/// responsible for:
/// - Framing the prompt for the requested role and language
/// - Accumulating a streamed response into a single payload
/// - Classifying failures so the caller can tell fatal from transient
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Synthesize one text
    ///
    /// Returns raw PCM bytes plus the provider's media type
    ///
    /// # Errors
    /// Returns a classified [`SynthesisError`]; no retrying happens here
    async fn synthesize(
        &self,
        text: &str,
        role: Role,
        language: LanguageCode,
    ) -> Result<AudioPayload, SynthesisError>;
}
