/// Classified outcome of a single failed synthesis attempt
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisError {
    #[error("content blocked: {0}")]
    Blocked(String),
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("response contained no audio")]
    EmptyResponse,
    #[error("transient error: {0}")]
    Transient(String),
}

impl SynthesisError {
    /// Fatal errors abort the whole run, everything else is retried
    pub fn fatal_kind(&self) -> Option<FatalKind> {
        match self {
            SynthesisError::Blocked(_) => Some(FatalKind::ContentBlocked),
            SynthesisError::QuotaExhausted(_) => Some(FatalKind::QuotaExhausted),
            SynthesisError::InvalidCredential(_) => Some(FatalKind::InvalidCredential),
            SynthesisError::EmptyResponse | SynthesisError::Transient(_) => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal_kind().is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    ContentBlocked,
    QuotaExhausted,
    InvalidCredential,
}

impl std::fmt::Display for FatalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FatalKind::ContentBlocked => "content blocked by safety filters",
            FatalKind::QuotaExhausted => "API quota exhausted",
            FatalKind::InvalidCredential => "API key rejected",
        };
        f.write_str(label)
    }
}

/// A failure that must stop the run
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind} on attempt {attempt} for '{text_snippet}': {detail}")]
pub struct FatalSynthesisError {
    pub kind: FatalKind,
    pub detail: String,
    pub text_snippet: String,
    pub attempt: u32,
}

/// Result of a synthesis request after all retries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SynthesisFailure {
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: SynthesisError,
    },
    #[error(transparent)]
    Fatal(#[from] FatalSynthesisError),
}

/// First 50 characters of a text, for log lines and error messages
pub fn snippet(text: &str) -> String {
    const MAX_CHARS: usize = 50;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{head}...")
    }
}
