pub mod audio;
pub mod lesson;
pub mod shared;
pub mod tts;
