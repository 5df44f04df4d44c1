use std::str::FromStr;

/// ISO 639-1 language codes the lesson generator can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageCode {
    Dutch,
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
}

impl LanguageCode {
    /// Get the ISO 639-1 code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::Dutch => "nl",
            LanguageCode::English => "en",
            LanguageCode::German => "de",
            LanguageCode::French => "fr",
            LanguageCode::Spanish => "es",
            LanguageCode::Italian => "it",
            LanguageCode::Portuguese => "pt",
        }
    }

    /// English name of the language, used when framing prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageCode::Dutch => "Dutch",
            LanguageCode::English => "English",
            LanguageCode::German => "German",
            LanguageCode::French => "French",
            LanguageCode::Spanish => "Spanish",
            LanguageCode::Italian => "Italian",
            LanguageCode::Portuguese => "Portuguese",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LanguageCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "nl" | "dutch" => Ok(LanguageCode::Dutch),
            "en" | "english" => Ok(LanguageCode::English),
            "de" | "german" => Ok(LanguageCode::German),
            "fr" | "french" => Ok(LanguageCode::French),
            "es" | "spanish" => Ok(LanguageCode::Spanish),
            "it" | "italian" => Ok(LanguageCode::Italian),
            "pt" | "portuguese" => Ok(LanguageCode::Portuguese),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Prompt framing applied to a synthesis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// A whole passage read as a story
    Narration,
    /// A single sentence at natural pace (translations)
    Sentence,
    /// A single sentence spoken slowly for a learner to repeat
    SlowSentence,
}

impl Role {
    pub fn prompt(&self, language: LanguageCode, text: &str) -> String {
        let name = language.display_name();
        match self {
            Role::Narration => format!(
                "Read this {name} passage in a clear, calm, and engaging storytelling voice: {text}"
            ),
            Role::Sentence => format!("Say this {name} sentence clearly and naturally: {text}"),
            Role::SlowSentence => format!(
                "Speak this {name} sentence slowly and very clearly for a language learner: {text}"
            ),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::Narration => "narration",
            Role::Sentence => "sentence",
            Role::SlowSentence => "slow_sentence",
        };
        f.write_str(name)
    }
}
