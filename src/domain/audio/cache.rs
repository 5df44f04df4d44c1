use super::segment::AudioSegment;
use crate::domain::tts::{
    snippet, FatalSynthesisError, LanguageCode, Role, SynthesisClient, SynthesisFailure,
};
use moka::future::Cache;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    language: LanguageCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memo of decoded audio for one group.
///
/// Keyed by (text, language); the role is not part of the key, so a
/// paragraph and a sentence with the same text share one entry. Failures are
/// never stored.
pub struct AudioCache {
    entries: Cache<CacheKey, AudioSegment>,
    stats: CacheStats,
}

impl Default for AudioCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioCache {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Return the cached segment or synthesize, decode and store it.
    ///
    /// `Ok(None)` means the text could not be synthesized or decoded and
    /// should be skipped; `Err` means the whole run must stop.
    pub async fn get_or_create(
        &mut self,
        client: &mut SynthesisClient,
        text: &str,
        language: LanguageCode,
        role: Role,
    ) -> Result<Option<AudioSegment>, FatalSynthesisError> {
        let key = CacheKey {
            text: text.to_string(),
            language,
        };

        if let Some(segment) = self.entries.get(&key).await {
            self.stats.hits += 1;
            tracing::info!(
                text = %snippet(text),
                language = %language,
                "Using cached audio"
            );
            return Ok(Some(segment));
        }
        self.stats.misses += 1;

        let payload = match client.synthesize(text, role, language).await {
            Ok(payload) => payload,
            Err(SynthesisFailure::Fatal(fatal)) => return Err(fatal),
            Err(SynthesisFailure::Exhausted { .. }) => return Ok(None),
        };

        match AudioSegment::from_payload(&payload.data, &payload.mime_type) {
            Ok(segment) => {
                self.entries.insert(key, segment.clone()).await;
                Ok(Some(segment))
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    text = %snippet(text),
                    mime_type = %payload.mime_type,
                    "Could not decode synthesized audio"
                );
                Ok(None)
            }
        }
    }
}
