use super::model::Group;
use crate::domain::audio::{AssemblySettings, SegmentAssembler};
use crate::domain::tts::SynthesisClient;
use crate::error::{AppError, AppResult};
use crate::infrastructure::export::{AudioExporter, ExportFormat};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TEST_SUFFIX: &str = "_TEST";

/// A group scheduled for generation together with its artifact path
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedGroup {
    pub group: Group,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunPlan {
    pub pending: Vec<PlannedGroup>,
    /// Keys whose artifact already exists
    pub skipped: Vec<String>,
    pub test_mode: bool,
}

impl RunPlan {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub exported: Vec<PathBuf>,
    /// Groups that produced no audio at all
    pub empty: Vec<String>,
    pub skipped_existing: usize,
    pub remote_calls: u64,
}

pub struct LessonService {
    client: SynthesisClient,
    exporter: Arc<dyn AudioExporter>,
    settings: AssemblySettings,
    output_dir: PathBuf,
    format: ExportFormat,
}

impl LessonService {
    pub fn new(
        client: SynthesisClient,
        exporter: Arc<dyn AudioExporter>,
        settings: AssemblySettings,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            exporter,
            settings,
            output_dir,
            format: ExportFormat::OGG_VORBIS,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Remote calls issued so far by this service
    pub fn remote_calls(&self) -> u64 {
        self.client.calls_issued()
    }

    fn artifact_path(&self, group: &Group, suffix: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}{}.{}",
            group.sanitized_key(),
            suffix,
            self.format.extension
        ))
    }
}

#[async_trait]
pub trait LessonServiceApi: Send {
    /// Split groups into pending and already exported
    fn plan(&self, groups: Vec<Group>) -> RunPlan;

    /// Plan a single-row dry run.
    ///
    /// `target` picks the group by key; otherwise the first pending group is
    /// used. The artifact gets a `_TEST` suffix so the real one is untouched.
    fn plan_test(&self, groups: Vec<Group>, target: Option<&str>) -> AppResult<RunPlan>;

    /// Generate and export every pending group, in order.
    ///
    /// Stops at the first fatal synthesis error; groups exported before it
    /// stay on disk.
    async fn run(&mut self, plan: RunPlan) -> AppResult<RunSummary>;
}

#[async_trait]
impl LessonServiceApi for LessonService {
    fn plan(&self, groups: Vec<Group>) -> RunPlan {
        let mut plan = RunPlan::default();

        for group in groups {
            let output_path = self.artifact_path(&group, "");
            if output_path.exists() {
                tracing::info!(group = %group.key, path = %output_path.display(), "Skipping group, file already exists");
                plan.skipped.push(group.key);
            } else {
                plan.pending.push(PlannedGroup { group, output_path });
            }
        }

        plan
    }

    fn plan_test(&self, groups: Vec<Group>, target: Option<&str>) -> AppResult<RunPlan> {
        let chosen = match target {
            Some(key) => {
                let key = key.trim();
                groups
                    .into_iter()
                    .find(|g| g.key == key || g.sanitized_key() == key)
                    .ok_or_else(|| AppError::Input(format!("group '{key}' not found in table")))?
            }
            None => match self.plan(groups).pending.into_iter().next() {
                Some(planned) => planned.group,
                None => return Ok(RunPlan::default()),
            },
        };

        let group = chosen.first_row_only();
        let output_path = self.artifact_path(&group, TEST_SUFFIX);

        Ok(RunPlan {
            pending: vec![PlannedGroup { group, output_path }],
            skipped: Vec::new(),
            test_mode: true,
        })
    }

    async fn run(&mut self, plan: RunPlan) -> AppResult<RunSummary> {
        let mut summary = RunSummary {
            skipped_existing: plan.skipped.len(),
            ..RunSummary::default()
        };
        let calls_before = self.client.calls_issued();

        tokio::fs::create_dir_all(&self.output_dir).await?;

        for PlannedGroup { group, output_path } in plan.pending {
            if !plan.test_mode && output_path.exists() {
                tracing::info!(group = %group.key, "Skipping group, file already exists");
                summary.skipped_existing += 1;
                continue;
            }

            tracing::info!(group = %group.key, rows = group.rows.len(), "Processing group");

            let mut assembler = SegmentAssembler::new(&mut self.client, &self.settings);
            let audio = assembler.assemble(&group).await.map_err(|err| {
                tracing::error!(group = %group.key, error = %err, "Stopping run");
                AppError::from(err)
            })?;
            let stats = assembler.cache_stats();

            if audio.is_empty() {
                tracing::warn!(group = %group.key, "No audio was generated for group, skipping export");
                summary.empty.push(group.key);
                continue;
            }

            tracing::info!(
                group = %group.key,
                duration_ms = audio.duration_ms(),
                cache_hits = stats.hits,
                cache_misses = stats.misses,
                path = %output_path.display(),
                "Exporting audio file"
            );

            self.exporter
                .export(&audio, &output_path, &self.format)
                .await
                .map_err(|e| AppError::Export(format!("{}: {e}", output_path.display())))?;
            summary.exported.push(output_path);
        }

        summary.remote_calls = self.client.calls_issued() - calls_before;
        Ok(summary)
    }
}
