use crate::e2e::helpers;

use helpers::{group, paragraph, repeat, RecordedCall, ScriptedTtsRepository, TestContext, SAMPLE_RATE};
use lessontape::domain::lesson::{LessonServiceApi, Row, RowKind};
use lessontape::domain::tts::{FatalKind, LanguageCode, Role, SynthesisError};
use lessontape::error::AppError;
use lessontape::infrastructure::export::ExportFormat;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn it_should_assemble_repeat_row_with_exact_timing() {
    let tts = ScriptedTtsRepository::new()
        .with_duration("Hallo", LanguageCode::Dutch, 1_000)
        .with_duration("Hello", LanguageCode::English, 800);
    let ctx = TestContext::new(tts);
    let mut service = ctx.service();

    let plan = service.plan(vec![group("A", vec![repeat("A", "Hallo", Some("Hello"), 3)])]);
    let summary = service.run(plan).await.unwrap();

    // 800 + 700 + [1000, 1500, 1000, 1500, 1000] + 2500
    let exports = ctx.exporter.exports();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].path, ctx.artifact("A.ogg"));
    assert_eq!(exports[0].format, ExportFormat::OGG_VORBIS);
    assert_eq!(exports[0].audio.duration_ms(), 10_000);
    assert_eq!(exports[0].audio.sample_count(), 10_000 * 24);
    assert_eq!(exports[0].audio.sample_rate(), SAMPLE_RATE);
    assert_eq!(summary.exported, vec![ctx.artifact("A.ogg")]);
    assert_eq!(summary.remote_calls, 2);

    assert_eq!(
        ctx.tts.calls(),
        vec![
            RecordedCall {
                text: "Hello".to_string(),
                role: Role::Sentence,
                language: LanguageCode::English,
            },
            RecordedCall {
                text: "Hallo".to_string(),
                role: Role::SlowSentence,
                language: LanguageCode::Dutch,
            },
        ]
    );
}

#[tokio::test]
async fn it_should_sum_row_contributions_for_mixed_group() {
    let tts = ScriptedTtsRepository::new()
        .with_duration("Er was eens een kat.", LanguageCode::Dutch, 3_000)
        .with_duration("Kat", LanguageCode::Dutch, 400)
        .always_failing("Hond", SynthesisError::Transient("connection reset".into()));
    let ctx = TestContext::new(tts).with_max_attempts(2);
    let mut service = ctx.service();

    let lesson = group(
        "Les 1: Dieren",
        vec![
            paragraph("Les 1: Dieren", "Er was eens een kat."),
            repeat("Les 1: Dieren", "Kat", None, 2),
            repeat("Les 1: Dieren", "Hond", None, 4),
        ],
    );
    let plan = service.plan(vec![lesson]);
    service.run(plan).await.unwrap();

    // paragraph 3000 + 2000, Kat 400 + 600 + 400 + 1000, Hond skipped
    let exports = ctx.exporter.exports();
    assert_eq!(exports[0].path, ctx.artifact("Les1Dieren.ogg"));
    assert_eq!(exports[0].audio.duration_ms(), 7_400);
    assert_eq!(ctx.clock.sleeps(), vec![helpers::RETRY_DELAY]);
}

#[tokio::test]
async fn it_should_skip_failed_paragraph_without_its_pause() {
    let tts = ScriptedTtsRepository::new()
        .always_failing("Er was eens een kat.", SynthesisError::Transient("timeout".into()))
        .with_duration("Kat", LanguageCode::Dutch, 400);
    let ctx = TestContext::new(tts).with_max_attempts(2);
    let mut service = ctx.service();

    let plan = service.plan(vec![group(
        "A",
        vec![paragraph("A", "Er was eens een kat."), repeat("A", "Kat", None, 2)],
    )]);
    let summary = service.run(plan).await.unwrap();

    // only Kat: 400 + 600 + 400 + 1000, no 2000 ms paragraph pause
    let exports = ctx.exporter.exports();
    assert_eq!(exports.len(), 1);
    assert_eq!(exports[0].audio.duration_ms(), 2_400);
    assert_eq!(summary.exported, vec![ctx.artifact("A.ogg")]);
    assert!(summary.empty.is_empty());
    assert_eq!(
        ctx.tts.called_texts(),
        vec!["Er was eens een kat.", "Er was eens een kat.", "Kat"]
    );
}

#[tokio::test]
async fn it_should_reuse_cached_audio_within_group() {
    let ctx = TestContext::new(ScriptedTtsRepository::new());
    let mut service = ctx.service();

    let lesson = group(
        "A",
        vec![
            paragraph("A", "Hallo"),
            repeat("A", "Hallo", Some("Hello"), 2),
            repeat("A", "Hallo", Some("Hello"), 2),
        ],
    );
    let plan = service.plan(vec![lesson]);
    let summary = service.run(plan).await.unwrap();

    assert_eq!(summary.remote_calls, 2);
    assert_eq!(
        ctx.tts.calls(),
        vec![
            RecordedCall {
                text: "Hallo".to_string(),
                role: Role::Narration,
                language: LanguageCode::Dutch,
            },
            RecordedCall {
                text: "Hello".to_string(),
                role: Role::Sentence,
                language: LanguageCode::English,
            },
        ]
    );

    // 500 + 2000, then twice 500 + 700 + 500 + 750 + 500 + 1250
    assert_eq!(ctx.exporter.exports()[0].audio.duration_ms(), 2_500 + 2 * 4_200);
}

#[tokio::test]
async fn it_should_not_share_cache_across_groups() {
    let ctx = TestContext::new(ScriptedTtsRepository::new());
    let mut service = ctx.service();

    let plan = service.plan(vec![
        group("A", vec![repeat("A", "Hallo", None, 2)]),
        group("B", vec![repeat("B", "Hallo", None, 2)]),
    ]);
    let summary = service.run(plan).await.unwrap();

    assert_eq!(ctx.tts.called_texts(), vec!["Hallo", "Hallo"]);
    assert_eq!(summary.exported.len(), 2);
}

#[tokio::test]
async fn it_should_issue_no_remote_calls_when_outputs_exist() {
    let ctx = TestContext::new(ScriptedTtsRepository::new());
    let groups = vec![
        group("A", vec![repeat("A", "Hallo", Some("Hello"), 2)]),
        group("B", vec![repeat("B", "Dag", None, 2)]),
    ];

    let mut first = ctx.service();
    let plan = first.plan(groups.clone());
    first.run(plan).await.unwrap();
    let calls_after_first_run = ctx.tts.call_count();

    let mut second = ctx.service();
    let plan = second.plan(groups);
    assert!(plan.is_empty());
    assert_eq!(plan.skipped, vec!["A".to_string(), "B".to_string()]);

    let summary = second.run(plan).await.unwrap();
    assert_eq!(summary.remote_calls, 0);
    assert_eq!(summary.skipped_existing, 2);
    assert_eq!(ctx.tts.call_count(), calls_after_first_run);
}

#[tokio::test]
async fn it_should_abort_on_quota_exhaustion_before_later_rows() {
    let tts = ScriptedTtsRepository::new().failing_on_call(
        3,
        SynthesisError::QuotaExhausted("429 RESOURCE_EXHAUSTED".into()),
    );
    let ctx = TestContext::new(tts);
    let mut service = ctx.service();

    let plan = service.plan(vec![
        group("B", vec![repeat("B", "vijf", None, 2)]),
        group(
            "A",
            vec![
                repeat("A", "een", None, 2),
                repeat("A", "twee", None, 2),
                repeat("A", "drie", None, 2),
            ],
        ),
        group("C", vec![repeat("C", "zes", None, 2)]),
    ]);
    let result = service.run(plan).await;

    match result {
        Err(AppError::Synthesis(fatal)) => {
            assert_eq!(fatal.kind, FatalKind::QuotaExhausted);
            assert_eq!(fatal.text_snippet, "twee");
            assert_eq!(fatal.attempt, 1);
        }
        other => panic!("expected fatal synthesis error, got {other:?}"),
    }
    assert_eq!(ctx.tts.called_texts(), vec!["vijf", "een", "twee"]);
    assert!(ctx.clock.sleeps().is_empty());

    // groups finished before the failure stay exported
    let exported: Vec<_> = ctx.exporter.exports().into_iter().map(|e| e.path).collect();
    assert_eq!(exported, vec![ctx.artifact("B.ogg")]);
    assert!(!ctx.artifact("A.ogg").exists());
    assert!(!ctx.artifact("C.ogg").exists());
}

#[tokio::test]
async fn it_should_abort_on_blocked_content() {
    let tts = ScriptedTtsRepository::new()
        .always_failing("verboden", SynthesisError::Blocked("SAFETY".into()));
    let ctx = TestContext::new(tts);
    let mut service = ctx.service();

    let plan = service.plan(vec![group(
        "A",
        vec![repeat("A", "verboden", None, 2), repeat("A", "Hallo", None, 2)],
    )]);
    let result = service.run(plan).await;

    assert!(matches!(
        result,
        Err(AppError::Synthesis(ref fatal)) if fatal.kind == FatalKind::ContentBlocked
    ));
    assert_eq!(ctx.tts.called_texts(), vec!["verboden"]);
    assert_eq!(result.unwrap_err().exit_code(), 4);
}

#[tokio::test]
async fn it_should_back_off_linearly_then_succeed() {
    let tts = ScriptedTtsRepository::new().failing_times(
        "Hallo",
        2,
        SynthesisError::Transient("503 UNAVAILABLE".into()),
    );
    let ctx = TestContext::new(tts);
    let mut service = ctx.service();

    let plan = service.plan(vec![group("A", vec![repeat("A", "Hallo", None, 2)])]);
    let summary = service.run(plan).await.unwrap();

    assert_eq!(
        ctx.clock.sleeps(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    assert_eq!(summary.remote_calls, 3);
    assert_eq!(summary.exported.len(), 1);
}

#[tokio::test]
async fn it_should_skip_row_when_retries_are_exhausted() {
    let tts = ScriptedTtsRepository::new()
        .with_duration("Dag", LanguageCode::Dutch, 1_000)
        .always_failing("kapot", SynthesisError::EmptyResponse);
    let ctx = TestContext::new(tts).with_max_attempts(3);
    let mut service = ctx.service();

    let plan = service.plan(vec![group(
        "A",
        vec![repeat("A", "kapot", None, 2), repeat("A", "Dag", None, 1)],
    )]);
    service.run(plan).await.unwrap();

    // three attempts, waits only between them
    assert_eq!(
        ctx.clock.sleeps(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    assert_eq!(ctx.tts.called_texts(), vec!["kapot", "kapot", "kapot", "Dag"]);
    assert_eq!(ctx.exporter.exports()[0].audio.duration_ms(), 1_000 + 2_500);
}

#[tokio::test]
async fn it_should_drop_whole_row_when_primary_sentence_fails() {
    let tts = ScriptedTtsRepository::new()
        .always_failing("kapot", SynthesisError::Transient("timeout".into()));
    let ctx = TestContext::new(tts).with_max_attempts(2);
    let mut service = ctx.service();

    let plan = service.plan(vec![group("A", vec![repeat("A", "kapot", Some("broken"), 2)])]);
    let summary = service.run(plan).await.unwrap();

    assert_eq!(ctx.tts.called_texts(), vec!["broken", "kapot", "kapot"]);
    assert!(ctx.exporter.exports().is_empty());
    assert_eq!(summary.empty, vec!["A".to_string()]);
    assert!(!ctx.artifact("A.ogg").exists());
}

#[tokio::test]
async fn it_should_skip_rows_without_source_text() {
    let ctx = TestContext::new(ScriptedTtsRepository::new());
    let mut service = ctx.service();

    let blank = Row {
        group_key: "A".to_string(),
        kind: RowKind::Repeat,
        source_text: None,
        translation_text: Some("Hello".to_string()),
        repeat_count: 2,
    };
    let plan = service.plan(vec![group("A", vec![blank])]);
    let summary = service.run(plan).await.unwrap();

    assert_eq!(ctx.tts.call_count(), 0);
    assert_eq!(summary.empty, vec!["A".to_string()]);
}

#[tokio::test]
async fn it_should_wait_for_rate_window_at_ceiling() {
    let ctx = TestContext::new(ScriptedTtsRepository::new()).with_rate_limit(2);
    let mut service = ctx.service();

    let plan = service.plan(vec![group(
        "A",
        vec![
            repeat("A", "een", None, 1),
            repeat("A", "twee", None, 1),
            repeat("A", "drie", None, 1),
        ],
    )]);
    service.run(plan).await.unwrap();

    // both earlier calls happened at virtual t=0
    assert_eq!(ctx.clock.sleeps(), vec![Duration::from_secs(60)]);
    assert_eq!(ctx.tts.call_count(), 3);
}

#[tokio::test]
async fn it_should_write_test_artifact_from_first_row_only() {
    let ctx = TestContext::new(ScriptedTtsRepository::new());
    let service = ctx.service();

    let groups = vec![group(
        "A",
        vec![repeat("A", "Hallo", None, 2), repeat("A", "Dag", Some("Bye"), 2)],
    )];
    let plan = service.plan_test(groups, None).unwrap();
    assert!(plan.test_mode);
    assert_eq!(plan.pending[0].output_path, ctx.artifact("A_TEST.ogg"));

    let mut service = service;
    service.run(plan).await.unwrap();

    assert_eq!(ctx.tts.called_texts(), vec!["Hallo"]);
    assert!(ctx.artifact("A_TEST.ogg").exists());
    assert!(!ctx.artifact("A.ogg").exists());
}
