use regex::Regex;
use rubato::{FftFixedIn, Resampler};
use std::sync::{Arc, OnceLock};

/// Sample rate assumed when the provider's media type does not name one
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

const RESAMPLE_CHUNK: usize = 1024;
const RESAMPLE_SUB_CHUNKS: usize = 2;

/// Immutable mono 16-bit PCM audio.
///
/// Samples are shared behind an `Arc`, so clones are cheap and two clones of
/// a cached segment are bit-identical by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    samples: Arc<[i16]>,
    sample_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("PCM payload has an odd number of bytes ({0})")]
    OddByteCount(usize),
    #[error("PCM payload is empty")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    #[error("could not build resampler: {0}")]
    Setup(#[from] rubato::ResamplerConstructionError),
    #[error("resampling failed: {0}")]
    Process(#[from] rubato::ResampleError),
}

impl AudioSegment {
    pub fn empty() -> Self {
        Self {
            samples: Arc::from(Vec::new()),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    pub fn from_samples(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples: Arc::from(samples),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Pure silence of `duration_ms`, rounded to the nearest sample
    pub fn silent(duration_ms: u64, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1);
        let count = (duration_ms * sample_rate as u64 + 500) / 1000;
        Self::from_samples(vec![0; count as usize], sample_rate)
    }

    /// Decode little-endian signed 16-bit mono PCM.
    pub fn from_pcm16le(data: &[u8], sample_rate: u32) -> Result<Self, DecodeError> {
        if data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if data.len() % 2 != 0 {
            return Err(DecodeError::OddByteCount(data.len()));
        }
        let samples = data
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self::from_samples(samples, sample_rate))
    }

    /// Decode a provider payload, taking the rate from its media type
    pub fn from_payload(data: &[u8], mime_type: &str) -> Result<Self, DecodeError> {
        Self::from_pcm16le(data, sample_rate_from_mime(mime_type))
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in whole milliseconds, rounded to nearest
    pub fn duration_ms(&self) -> u64 {
        let rate = self.sample_rate as u64;
        (self.samples.len() as u64 * 1000 + rate / 2) / rate
    }

    /// Little-endian PCM bytes, the format the exporter pipes to the encoder
    pub fn to_pcm16le(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Concatenate segments in order.
    ///
    /// The result takes the highest rate among the non-empty segments; the
    /// others are upsampled to it first.
    pub fn concat<'a, I>(segments: I) -> Result<AudioSegment, ResampleError>
    where
        I: IntoIterator<Item = &'a AudioSegment>,
    {
        let segments: Vec<&AudioSegment> = segments.into_iter().filter(|s| !s.is_empty()).collect();
        let Some(rate) = segments.iter().map(|s| s.sample_rate).max() else {
            return Ok(AudioSegment::empty());
        };

        let mut samples: Vec<i16> = Vec::with_capacity(segments.iter().map(|s| s.sample_count()).sum());
        for segment in segments {
            if segment.sample_rate == rate {
                samples.extend_from_slice(&segment.samples);
            } else {
                samples.extend(segment.resampled(rate)?.samples.iter());
            }
        }

        Ok(AudioSegment::from_samples(samples, rate))
    }

    /// Band-limited rate conversion; the duration is kept to the nearest sample
    pub fn resampled(&self, target_rate: u32) -> Result<AudioSegment, ResampleError> {
        let target_rate = target_rate.max(1);
        if target_rate == self.sample_rate || self.is_empty() {
            return Ok(AudioSegment {
                samples: self.samples.clone(),
                sample_rate: target_rate,
            });
        }

        let input: Vec<f32> = self.samples.iter().map(|&s| s as f32 / 32_768.0).collect();
        let output = resample_mono(&input, self.sample_rate, target_rate)?;
        let samples = output
            .into_iter()
            .map(|x| (x * 32_768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect();

        Ok(AudioSegment::from_samples(samples, target_rate))
    }
}

/// Chunked FFT resampling of mono samples in `[-1, 1]`.
///
/// The input is zero-padded until the resampler's delay has been flushed, then
/// the delay is cut off and the output trimmed to `len * sr_out / sr_in`.
fn resample_mono(input: &[f32], sr_in: u32, sr_out: u32) -> Result<Vec<f32>, ResampleError> {
    if sr_in == sr_out {
        return Ok(input.to_vec());
    }

    let mut resampler =
        FftFixedIn::<f32>::new(sr_in as usize, sr_out as usize, RESAMPLE_CHUNK, RESAMPLE_SUB_CHUNKS, 1)?;
    let delay = resampler.output_delay();
    let expected_len =
        ((input.len() as u64 * sr_out as u64 + sr_in as u64 / 2) / sr_in as u64) as usize;

    let mut out = Vec::with_capacity(expected_len + delay + RESAMPLE_CHUNK);
    let mut pos = 0;
    while out.len() < expected_len + delay {
        let mut input_chunk = vec![0.0; RESAMPLE_CHUNK];
        if pos < input.len() {
            let end = (pos + RESAMPLE_CHUNK).min(input.len());
            input_chunk[..end - pos].copy_from_slice(&input[pos..end]);
        }
        pos += RESAMPLE_CHUNK;

        let block = vec![input_chunk];
        let frames = resampler.process(&block, None)?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay);
    out.truncate(expected_len);
    Ok(out)
}

/// Read the `rate=` parameter of a media type such as
/// `audio/L16;codec=pcm;rate=24000`.
pub fn sample_rate_from_mime(mime_type: &str) -> u32 {
    static RATE: OnceLock<Regex> = OnceLock::new();
    let pattern = RATE.get_or_init(|| {
        Regex::new(r"(?i)(?:^|;)\s*rate\s*=\s*(\d+)").expect("rate pattern is valid")
    });

    pattern
        .captures(mime_type)
        .and_then(|c| c[1].parse::<u32>().ok())
        .filter(|&rate| rate > 0)
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}
