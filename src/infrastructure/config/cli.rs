use clap::Parser;
use std::path::PathBuf;

/// Generate spoken language lessons from a CSV or TSV script
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the input CSV or TSV file
    pub input_file: PathBuf,

    /// Generate only the first row of one group, written to a *_TEST file
    #[arg(long)]
    pub test: bool,

    /// Group to use in test mode (defaults to the first group without output)
    #[arg(long, requires = "test")]
    pub group: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Directory for generated files (overrides OUTPUT_FOLDER)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
