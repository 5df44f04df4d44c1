use crate::domain::audio::AssemblyError;
use crate::domain::tts::FatalSynthesisError;

/// Main application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Synthesis aborted: {0}")]
    Synthesis(#[from] FatalSynthesisError),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Process exit code reported for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Input(_) => 3,
            Self::Synthesis(_) => 4,
            Self::Export(_) | Self::Io(_) => 5,
            Self::Other(_) => 1,
        }
    }
}

impl From<AssemblyError> for AppError {
    fn from(err: AssemblyError) -> Self {
        match err {
            AssemblyError::Fatal(fatal) => AppError::Synthesis(fatal),
            AssemblyError::Resample(e) => AppError::Other(anyhow::Error::new(e)),
        }
    }
}

/// Custom result type for the application
pub type AppResult<T> = Result<T, AppError>;
