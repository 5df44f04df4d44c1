pub mod gemini_tts_repository;
pub mod lesson_repository;
pub mod tts_repository;

pub use gemini_tts_repository::GeminiTtsRepository;
pub use lesson_repository::LessonRepository;
pub use tts_repository::TtsRepository;
