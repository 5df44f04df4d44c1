use super::tts_repository::TtsRepository;
use crate::domain::tts::{snippet, AudioPayload, LanguageCode, Role, SynthesisError};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

/// Finish reasons that mean the model refused to produce audio
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "RECITATION",
];

/// Gemini streaming TTS implementation of TTS repository
pub struct GeminiTtsRepository {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
}

impl GeminiTtsRepository {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        model: String,
        voice: String,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            voice,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {
                        "prebuiltVoiceConfig": { "voiceName": self.voice }
                    }
                }
            }
        })
    }

    /// Issue the request and fold the SSE stream into one payload
    async fn call_gemini(&self, prompt: &str) -> Result<AudioPayload, SynthesisError> {
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| SynthesisError::Transient(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_error(status, &body));
        }

        let mut accumulator = StreamAccumulator::default();
        let mut pending: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| SynthesisError::Transient(format!("stream interrupted: {e}")))?;
            pending.extend_from_slice(&chunk);

            while let Some(newline) = pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = pending.drain(..=newline).collect();
                accumulator.feed_line(&String::from_utf8_lossy(&line))?;
            }
        }
        if !pending.is_empty() {
            accumulator.feed_line(&String::from_utf8_lossy(&pending))?;
        }

        accumulator.finish()
    }
}

#[async_trait]
impl TtsRepository for GeminiTtsRepository {
    async fn synthesize(
        &self,
        text: &str,
        role: Role,
        language: LanguageCode,
    ) -> Result<AudioPayload, SynthesisError> {
        let start_time = std::time::Instant::now();
        let prompt = role.prompt(language, text);

        tracing::debug!(
            model = %self.model,
            voice = %self.voice,
            role = %role,
            language = %language,
            text_preview = %snippet(text),
            "Calling Gemini TTS"
        );

        let result = self.call_gemini(&prompt).await;

        match &result {
            Ok(payload) => tracing::info!(
                provider = "gemini",
                model = %self.model,
                latency_ms = start_time.elapsed().as_millis(),
                audio_size_bytes = payload.data.len(),
                mime_type = %payload.mime_type,
                "TTS synthesis completed"
            ),
            Err(e) => tracing::debug!(
                provider = "gemini",
                error = %e,
                latency_ms = start_time.elapsed().as_millis(),
                "TTS synthesis failed"
            ),
        }

        result
    }
}

/// Collects inline audio chunks out of `data:` lines of the SSE stream
#[derive(Debug, Default)]
struct StreamAccumulator {
    data: Vec<u8>,
    mime_type: Option<String>,
}

impl StreamAccumulator {
    fn feed_line(&mut self, line: &str) -> Result<(), SynthesisError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let Some(event) = line.strip_prefix("data:") else {
            return Ok(());
        };
        let event = event.trim();
        if event.is_empty() || event == "[DONE]" {
            return Ok(());
        }

        let chunk: StreamChunk = serde_json::from_str(event)
            .map_err(|e| SynthesisError::Transient(format!("malformed stream event: {e}")))?;
        self.feed_chunk(chunk)
    }

    fn feed_chunk(&mut self, chunk: StreamChunk) -> Result<(), SynthesisError> {
        if let Some(error) = chunk.error {
            return Err(classify_api_error(&error, &error.raw_hint()));
        }
        if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(SynthesisError::Blocked(reason));
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            return Ok(());
        };

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        if parts.is_empty() {
            if let Some(reason) = candidate
                .finish_reason
                .filter(|r| BLOCKING_FINISH_REASONS.contains(&r.as_str()))
            {
                return Err(SynthesisError::Blocked(reason));
            }
            return Ok(());
        }

        for inline in parts.into_iter().filter_map(|p| p.inline_data) {
            if self.mime_type.is_none() {
                self.mime_type = inline.mime_type;
            }
            let bytes = STANDARD
                .decode(inline.data.as_bytes())
                .map_err(|e| SynthesisError::Transient(format!("invalid base64 audio: {e}")))?;
            self.data.extend(bytes);
        }

        Ok(())
    }

    fn finish(self) -> Result<AudioPayload, SynthesisError> {
        if self.data.is_empty() {
            return Err(SynthesisError::EmptyResponse);
        }
        let mime_type = self
            .mime_type
            .ok_or_else(|| SynthesisError::Transient("audio without media type".to_string()))?;

        Ok(AudioPayload {
            data: self.data,
            mime_type,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

impl ApiError {
    fn raw_hint(&self) -> String {
        serde_json::to_string(&self.details).unwrap_or_default()
    }
}

fn classify_http_error(status: StatusCode, body: &str) -> SynthesisError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => classify_api_error(&envelope.error, body),
        Err(_) if status == StatusCode::UNAUTHORIZED => {
            SynthesisError::InvalidCredential(format!("HTTP {status}"))
        }
        Err(_) if body.contains("API_KEY_INVALID") => {
            SynthesisError::InvalidCredential("API_KEY_INVALID".to_string())
        }
        Err(_) => SynthesisError::Transient(format!("HTTP {status}: {}", snippet(body))),
    }
}

fn classify_api_error(error: &ApiError, raw: &str) -> SynthesisError {
    let status = error.status.as_deref().unwrap_or_default();
    let detail = match error.code {
        Some(code) => format!("{code} {status}: {}", error.message),
        None => format!("{status}: {}", error.message),
    };

    if raw.contains("API_KEY_INVALID")
        || status == "UNAUTHENTICATED"
        || error.code == Some(401)
        || (status == "PERMISSION_DENIED" && error.message.to_lowercase().contains("api key"))
    {
        return SynthesisError::InvalidCredential(detail);
    }
    if status == "RESOURCE_EXHAUSTED" || error.message.to_lowercase().contains("quota") {
        return SynthesisError::QuotaExhausted(detail);
    }
    SynthesisError::Transient(detail)
}
