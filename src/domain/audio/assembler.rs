use super::cache::{AudioCache, CacheStats};
use super::segment::{AudioSegment, ResampleError};
use crate::domain::lesson::{Group, Row, RowKind};
use crate::domain::tts::{snippet, FatalSynthesisError, LanguageCode, Role, SynthesisClient};

/// Silence after a narrated paragraph
pub const PARAGRAPH_PAUSE_MS: u64 = 2_000;
/// Silence between a translation and the sentence it introduces
pub const TRANSLATION_PAUSE_MS: u64 = 700;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error(transparent)]
    Fatal(#[from] FatalSynthesisError),
    #[error(transparent)]
    Resample(#[from] ResampleError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySettings {
    pub primary_language: LanguageCode,
    pub secondary_language: LanguageCode,
    /// Pause between repetitions, as a multiple of the sentence duration
    pub pause_multiplier_repeat: f64,
    /// Pause before the next row, as a multiple of the sentence duration
    pub pause_multiplier_next: f64,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            primary_language: LanguageCode::Dutch,
            secondary_language: LanguageCode::English,
            pause_multiplier_repeat: 1.5,
            pause_multiplier_next: 2.5,
        }
    }
}

impl AssemblySettings {
    fn scaled_pause_ms(duration_ms: u64, multiplier: f64) -> u64 {
        (duration_ms as f64 * multiplier).round().max(0.0) as u64
    }

    pub fn repeat_pause_ms(&self, sentence_ms: u64) -> u64 {
        Self::scaled_pause_ms(sentence_ms, self.pause_multiplier_repeat)
    }

    pub fn next_pause_ms(&self, sentence_ms: u64) -> u64 {
        Self::scaled_pause_ms(sentence_ms, self.pause_multiplier_next)
    }
}

/// Folds one group's rows into a single audio stream.
///
/// Owns the group's [`AudioCache`]; a new assembler (and cache) is created
/// for every group.
pub struct SegmentAssembler<'a> {
    client: &'a mut SynthesisClient,
    cache: AudioCache,
    settings: &'a AssemblySettings,
}

impl<'a> SegmentAssembler<'a> {
    pub fn new(client: &'a mut SynthesisClient, settings: &'a AssemblySettings) -> Self {
        Self {
            client,
            cache: AudioCache::new(),
            settings,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Assemble the group. A fatal synthesis error stops at the failing row.
    pub async fn assemble(&mut self, group: &Group) -> Result<AudioSegment, AssemblyError> {
        let mut parts: Vec<AudioSegment> = Vec::new();

        for (index, row) in group.rows.iter().enumerate() {
            let contribution = match row.kind {
                RowKind::Paragraph => self.paragraph_contribution(row).await?,
                RowKind::Repeat => self.repeat_contribution(row).await?,
            };
            tracing::debug!(
                group = %group.key,
                row = index + 1,
                kind = ?row.kind,
                contribution_ms = contribution.iter().map(AudioSegment::duration_ms).sum::<u64>(),
                "Row assembled"
            );
            parts.extend(contribution);
        }

        Ok(AudioSegment::concat(&parts)?)
    }

    async fn paragraph_contribution(
        &mut self,
        row: &Row,
    ) -> Result<Vec<AudioSegment>, FatalSynthesisError> {
        let Some(text) = non_empty(row.source_text.as_deref()) else {
            return Ok(Vec::new());
        };

        let segment = self
            .cache
            .get_or_create(self.client, text, self.settings.primary_language, Role::Narration)
            .await?;

        Ok(match segment {
            Some(segment) => {
                let pause = AudioSegment::silent(PARAGRAPH_PAUSE_MS, segment.sample_rate());
                vec![segment, pause]
            }
            None => {
                tracing::warn!(text = %snippet(text), "Skipping paragraph, no audio generated");
                Vec::new()
            }
        })
    }

    async fn repeat_contribution(
        &mut self,
        row: &Row,
    ) -> Result<Vec<AudioSegment>, FatalSynthesisError> {
        let Some(source) = non_empty(row.source_text.as_deref()) else {
            return Ok(Vec::new());
        };

        let translation = match non_empty(row.translation_text.as_deref()) {
            Some(text) => {
                self.cache
                    .get_or_create(
                        self.client,
                        text,
                        self.settings.secondary_language,
                        Role::Sentence,
                    )
                    .await?
            }
            None => None,
        };

        let primary = self
            .cache
            .get_or_create(
                self.client,
                source,
                self.settings.primary_language,
                Role::SlowSentence,
            )
            .await?;

        match primary {
            Some(primary) => Ok(repeat_block(
                translation.as_ref(),
                &primary,
                row.repeat_count,
                self.settings,
            )),
            None => {
                tracing::warn!(
                    text = %snippet(source),
                    "Skipping sentence due to audio generation failure"
                );
                Ok(Vec::new())
            }
        }
    }
}

/// Timing for one Repeat row:
/// `[translation, 700ms]`, then the sentence `repeat_count` times separated by
/// `round(D * repeat multiplier)`, then `round(D * next multiplier)`.
pub fn repeat_block(
    translation: Option<&AudioSegment>,
    primary: &AudioSegment,
    repeat_count: u32,
    settings: &AssemblySettings,
) -> Vec<AudioSegment> {
    let mut block = Vec::new();

    if let Some(translation) = translation {
        block.push(translation.clone());
        block.push(AudioSegment::silent(
            TRANSLATION_PAUSE_MS,
            translation.sample_rate(),
        ));
    }

    let sentence_ms = primary.duration_ms();
    let rate = primary.sample_rate();
    let repetition_pause = AudioSegment::silent(settings.repeat_pause_ms(sentence_ms), rate);

    for i in 0..repeat_count {
        block.push(primary.clone());
        if i + 1 < repeat_count {
            block.push(repetition_pause.clone());
        }
    }

    block.push(AudioSegment::silent(settings.next_pause_ms(sentence_ms), rate));
    block
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}
