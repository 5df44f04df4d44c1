use super::error::{snippet, FatalSynthesisError, SynthesisError, SynthesisFailure};
use super::language::{LanguageCode, Role};
use super::rate_limiter::RateLimiter;
use super::AudioPayload;
use crate::domain::shared::Clock;
use crate::infrastructure::repositories::TtsRepository;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Base delay; the wait after failed attempt `k` is `retry_delay * k`
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Issues rate-limited synthesis calls with linear backoff between attempts.
pub struct SynthesisClient {
    tts_repo: Arc<dyn TtsRepository>,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    calls_issued: u64,
}

impl SynthesisClient {
    pub fn new(
        tts_repo: Arc<dyn TtsRepository>,
        limiter: RateLimiter,
        clock: Arc<dyn Clock>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            tts_repo,
            limiter,
            clock,
            policy,
            calls_issued: 0,
        }
    }

    /// Total remote calls issued by this client, across all texts
    pub fn calls_issued(&self) -> u64 {
        self.calls_issued
    }

    pub async fn synthesize(
        &mut self,
        text: &str,
        role: Role,
        language: LanguageCode,
    ) -> Result<AudioPayload, SynthesisFailure> {
        let max_attempts = self.policy.max_attempts.max(1);
        let text_preview = snippet(text);
        let mut last_error = SynthesisError::EmptyResponse;

        for attempt in 1..=max_attempts {
            self.limiter.reserve_slot().await;
            self.calls_issued += 1;

            tracing::info!(
                text = %text_preview,
                role = %role,
                language = %language,
                attempt,
                max_attempts,
                "Generating audio"
            );

            let outcome = match self.tts_repo.synthesize(text, role, language).await {
                Ok(payload) if payload.data.is_empty() => Err(SynthesisError::EmptyResponse),
                other => other,
            };

            match outcome {
                Ok(payload) => {
                    tracing::debug!(
                        audio_size = payload.data.len(),
                        mime_type = %payload.mime_type,
                        attempt,
                        "Audio received"
                    );
                    return Ok(payload);
                }
                Err(error) => {
                    if let Some(kind) = error.fatal_kind() {
                        tracing::error!(
                            error = %error,
                            text = %text_preview,
                            attempt,
                            "Fatal synthesis error, aborting"
                        );
                        return Err(SynthesisFailure::Fatal(FatalSynthesisError {
                            kind,
                            detail: error.to_string(),
                            text_snippet: text_preview,
                            attempt,
                        }));
                    }

                    tracing::warn!(
                        error = %error,
                        text = %text_preview,
                        attempt,
                        max_attempts,
                        "Synthesis attempt failed"
                    );
                    last_error = error;
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.retry_delay * attempt;
                tracing::info!(
                    delay_secs = delay.as_secs_f64(),
                    next_attempt = attempt + 1,
                    "Retrying after backoff"
                );
                self.clock.sleep(delay).await;
            }
        }

        tracing::warn!(
            text = %text_preview,
            attempts = max_attempts,
            last_error = %last_error,
            "Giving up on text after exhausting retries"
        );

        Err(SynthesisFailure::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}
