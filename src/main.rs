use anyhow::Context;
use clap::Parser;
use lessontape::controllers::{GenerateController, GenerateOptions, GenerateOutcome, StdinConfirmation};
use lessontape::domain::lesson::LessonService;
use lessontape::domain::shared::{Clock, SystemClock};
use lessontape::domain::tts::{RateLimiter, SynthesisClient};
use lessontape::error::AppResult;
use lessontape::infrastructure::config::{Cli, Config, LogFormat};
use lessontape::infrastructure::export::FfmpegExporter;
use lessontape::infrastructure::repositories::{GeminiTtsRepository, LessonRepository};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, "Exiting");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, exit_code = err.exit_code(), "Run failed");
            eprintln!("ERROR: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> AppResult<GenerateOutcome> {
    // Load configuration; a missing API key stops us before any remote call
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.output_dir.clone() {
        config.output_dir = dir;
    }

    init_logging(&config);

    tracing::info!(
        input = %cli.input_file.display(),
        output_dir = %config.output_dir.display(),
        model = %config.gemini_model,
        voice = %config.voice,
        primary_language = %config.primary_language,
        secondary_language = %config.secondary_language,
        "Starting lesson generation"
    );

    // Load the lesson table
    let groups = LessonRepository::load(&cli.input_file)?;

    // === DEPENDENCY INJECTION SETUP ===
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .context("could not build HTTP client")?;

    let tts_repo = Arc::new(GeminiTtsRepository::new(
        http,
        config.gemini_base_url.clone(),
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.voice.clone(),
    ));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let limiter = RateLimiter::new(config.api_calls_per_minute, clock.clone());
    let client = SynthesisClient::new(tts_repo, limiter, clock, config.retry_policy());

    let lesson_service = LessonService::new(
        client,
        Arc::new(FfmpegExporter::default()),
        config.assembly_settings(),
        config.output_dir.clone(),
    );

    let options = GenerateOptions {
        test_mode: cli.test,
        test_group: cli.group,
        assume_yes: cli.yes,
    };

    let mut controller = GenerateController::new(lesson_service);
    controller
        .generate(groups, &options, &mut StdinConfirmation)
        .await
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "lessontape=info".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
