use crate::{
    domain::lesson::{Group, LessonServiceApi, RunPlan, RunSummary},
    error::AppResult,
};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub test_mode: bool,
    pub test_group: Option<String>,
    pub assume_yes: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    NothingToDo,
    Cancelled,
    Completed(RunSummary),
}

/// Asks the user whether to go ahead with a run
pub trait Confirmation: Send {
    fn confirm(&mut self, prompt: &str) -> AppResult<bool>;
}

/// Reads a y/n answer from standard input
pub struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&mut self, prompt: &str) -> AppResult<bool> {
        print!("{prompt} (y/n): ");
        std::io::stdout().flush()?;

        let mut answer = String::new();
        std::io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().eq_ignore_ascii_case("y"))
    }
}

pub struct GenerateController<S: LessonServiceApi> {
    lesson_service: S,
}

impl<S: LessonServiceApi> GenerateController<S> {
    pub fn new(lesson_service: S) -> Self {
        Self { lesson_service }
    }

    pub fn into_service(self) -> S {
        self.lesson_service
    }

    /// Plan, confirm and run the generation of all groups
    pub async fn generate(
        &mut self,
        groups: Vec<Group>,
        options: &GenerateOptions,
        confirmation: &mut dyn Confirmation,
    ) -> AppResult<GenerateOutcome> {
        if groups.is_empty() {
            println!("The input table has no usable rows. Nothing to do.");
            return Ok(GenerateOutcome::NothingToDo);
        }

        let plan = if options.test_mode {
            self.lesson_service
                .plan_test(groups, options.test_group.as_deref())?
        } else {
            self.lesson_service.plan(groups)
        };

        for key in &plan.skipped {
            println!("  - Skipping '{key}' (file already exists).");
        }
        if plan.is_empty() {
            println!("All audio files are already up to date. Nothing to do.");
            return Ok(GenerateOutcome::NothingToDo);
        }

        print_plan(&plan);

        if plan.test_mode {
            println!("--- RUNNING IN TEST MODE ---");
        } else if !options.assume_yes
            && !confirmation.confirm("Proceed with generating these files?")?
        {
            println!("Operation cancelled by user.");
            return Ok(GenerateOutcome::Cancelled);
        }

        let start_time = std::time::Instant::now();
        let summary = self.lesson_service.run(plan).await?;

        tracing::info!(
            exported = summary.exported.len(),
            empty = summary.empty.len(),
            skipped_existing = summary.skipped_existing,
            remote_calls = summary.remote_calls,
            elapsed_secs = format!("{:.2}", start_time.elapsed().as_secs_f64()),
            "Run completed"
        );
        println!(
            "Done! Process completed in {:.2} seconds.",
            start_time.elapsed().as_secs_f64()
        );

        Ok(GenerateOutcome::Completed(summary))
    }
}

fn print_plan(plan: &RunPlan) {
    println!("The following file groups will be generated:");
    for planned in &plan.pending {
        println!(
            "  - {} -> {}",
            planned.group.key,
            planned.output_path.display()
        );
    }
}

