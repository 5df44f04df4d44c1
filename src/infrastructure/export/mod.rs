use crate::domain::audio::AudioSegment;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Container, codec and quality handed to the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportFormat {
    pub extension: &'static str,
    pub container: &'static str,
    pub codec: &'static str,
    pub quality: &'static str,
}

impl ExportFormat {
    /// Ogg Vorbis at VBR quality 7
    pub const OGG_VORBIS: ExportFormat = ExportFormat {
        extension: "ogg",
        container: "ogg",
        codec: "libvorbis",
        quality: "7",
    };
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::OGG_VORBIS
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("could not start encoder '{binary}': {source}")]
    Spawn {
        binary: String,
        source: std::io::Error,
    },
    #[error("I/O error while encoding: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoder exited with {status}: {stderr}")]
    Encoder { status: String, stderr: String },
}

/// Writes an assembled lesson to disk
#[async_trait]
pub trait AudioExporter: Send + Sync {
    async fn export(
        &self,
        audio: &AudioSegment,
        path: &Path,
        format: &ExportFormat,
    ) -> Result<(), ExportError>;
}

/// Encodes by piping raw PCM into an `ffmpeg` process.
///
/// Output goes to a temporary sibling first and is renamed into place, so an
/// interrupted run never leaves a file that a re-run would mistake for done.
pub struct FfmpegExporter {
    binary: String,
}

impl Default for FfmpegExporter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegExporter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn partial_path(path: &Path, format: &ExportFormat) -> PathBuf {
        path.with_extension(format!("partial.{}", format.extension))
    }

    fn encoder_args(audio: &AudioSegment, format: &ExportFormat, output: &Path) -> Vec<String> {
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "s16le".to_string(),
            "-ar".to_string(),
            audio.sample_rate().to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-c:a".to_string(),
            format.codec.to_string(),
            "-q:a".to_string(),
            format.quality.to_string(),
            "-f".to_string(),
            format.container.to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Run the encoder into `output`, feeding it the PCM on stdin
    async fn encode(
        &self,
        audio: &AudioSegment,
        format: &ExportFormat,
        output: &Path,
    ) -> Result<(), ExportError> {
        let args = Self::encoder_args(audio, format, output);
        tracing::debug!(command = %format!("{} {}", self.binary, args.join(" ")), "Running encoder");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ExportError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let pcm = audio.to_pcm16le();
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::BrokenPipe, "encoder stdin unavailable"))?;
        let writer = tokio::spawn(async move {
            stdin.write_all(&pcm).await?;
            stdin.shutdown().await
        });

        let finished = child.wait_with_output().await?;
        let write_result = writer
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        if !finished.status.success() {
            return Err(ExportError::Encoder {
                status: finished.status.to_string(),
                stderr: String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            });
        }
        write_result?;
        Ok(())
    }
}

#[async_trait]
impl AudioExporter for FfmpegExporter {
    async fn export(
        &self,
        audio: &AudioSegment,
        path: &Path,
        format: &ExportFormat,
    ) -> Result<(), ExportError> {
        let start_time = std::time::Instant::now();
        let partial = Self::partial_path(path, format);

        if let Err(e) = self.encode(audio, format, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, path).await?;

        tracing::info!(
            path = %path.display(),
            duration_ms = audio.duration_ms(),
            latency_ms = start_time.elapsed().as_millis(),
            "Audio exported"
        );
        Ok(())
    }
}
