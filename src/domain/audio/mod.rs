pub mod assembler;
pub mod cache;
pub mod segment;

pub use assembler::{AssemblyError, AssemblySettings, SegmentAssembler};
pub use cache::{AudioCache, CacheStats};
pub use segment::{sample_rate_from_mime, AudioSegment, DecodeError, ResampleError, DEFAULT_SAMPLE_RATE};
