use lessontape::domain::audio::AssemblySettings;
use lessontape::domain::lesson::{Group, LessonService, Row};
use lessontape::domain::shared::Clock;
use lessontape::domain::tts::{RateLimiter, RetryPolicy, SynthesisClient};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;


pub use fake_clock::FakeClock;
pub use recording_exporter::RecordingExporter;
pub use tts_mocks::{RecordedCall, ScriptedTtsRepository, SAMPLE_RATE};

pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Everything a pipeline test needs: a scratch output directory, virtual
/// time, a scripted provider and an exporter that records what it writes.
pub struct TestContext {
    pub dir: TempDir,
    pub clock: Arc<FakeClock>,
    pub tts: Arc<ScriptedTtsRepository>,
    pub exporter: Arc<RecordingExporter>,
    pub settings: AssemblySettings,
    pub calls_per_minute: usize,
    pub policy: RetryPolicy,
}

impl TestContext {
    pub fn new(tts: ScriptedTtsRepository) -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            clock: FakeClock::new(),
            tts: Arc::new(tts),
            exporter: Arc::new(RecordingExporter::default()),
            settings: AssemblySettings::default(),
            calls_per_minute: 1_000,
            policy: RetryPolicy {
                max_attempts: 10,
                retry_delay: RETRY_DELAY,
            },
        }
    }

    #[allow(dead_code)]
    pub fn with_rate_limit(mut self, calls_per_minute: usize) -> Self {
        self.calls_per_minute = calls_per_minute;
        self
    }

    #[allow(dead_code)]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output_audio")
    }

    #[allow(dead_code)]
    pub fn artifact(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    /// A fresh service, as a new process run would build it
    pub fn service(&self) -> LessonService {
        let clock: Arc<dyn Clock> = self.clock.clone();
        let client = SynthesisClient::new(
            self.tts.clone(),
            RateLimiter::new(self.calls_per_minute, clock.clone()),
            clock,
            self.policy,
        );

        LessonService::new(
            client,
            self.exporter.clone(),
            self.settings.clone(),
            self.output_dir(),
        )
    }
}

#[allow(dead_code)]
pub fn repeat(group: &str, source: &str, translation: Option<&str>, repetitions: u32) -> Row {
    Row::repeat(group, source, translation, repetitions)
}

#[allow(dead_code)]
pub fn paragraph(group: &str, source: &str) -> Row {
    Row::paragraph(group, source)
}

#[allow(dead_code)]
pub fn group(key: &str, rows: Vec<Row>) -> Group {
    Group::new(key, rows)
}
