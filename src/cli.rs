//! Command-line interface for foldersort.
//!
//! This module handles:
//! - Argument parsing
//! - Running the organizer on a background worker and rendering its events
//! - Dry runs and the category listing

use crate::file_category::CategoryTable;
use crate::file_organizer::FileOrganizer;
use crate::output::{JsonEventWriter, OutputFormatter, TerminalReporter};
use crate::worker::spawn_organize;
use clap::Parser;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Sort the files of a folder into category subfolders by extension.
#[derive(Debug, Parser)]
#[command(name = "foldersort", version, about)]
pub struct Cli {
    /// Folder whose files should be sorted
    #[arg(required_unless_present = "list_categories")]
    pub directory: Option<PathBuf>,

    /// Show what would be moved without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print events as JSON lines instead of a progress bar
    #[arg(long, conflicts_with = "dry_run")]
    pub json: bool,

    /// Only report failures and the final result
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the category table and exit
    #[arg(long)]
    pub list_categories: bool,
}

/// How organize events are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Progress bar and colored narration.
    Human { quiet: bool },
    /// One JSON object per event on stdout.
    Json,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human { quiet: self.quiet }
        }
    }
}

/// Runs the command described by parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use foldersort::cli::{Cli, run};
///
/// let cli = Cli::parse_from(["foldersort", "/path/to/Downloads", "--dry-run"]);
/// if let Err(e) = run(cli) {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run(cli: Cli) -> Result<(), String> {
    if cli.list_categories {
        list_categories();
        return Ok(());
    }

    let output = cli.output_mode();
    let base_path = cli
        .directory
        .ok_or_else(|| "No directory given".to_string())?;

    if cli.dry_run {
        organize_directory_dry_run(&base_path)
    } else {
        organize_directory(&base_path, output)
    }
}

/// Organizes files in a directory into category subdirectories.
///
/// The organizer runs on a background worker while this thread renders its
/// events. Returns an error if the directory is unusable, if the run is
/// aborted, or if any file could not be moved.
pub fn organize_directory(base_path: &Path, output: OutputMode) -> Result<(), String> {
    let organizer = FileOrganizer::new(CategoryTable::default());
    let handle = spawn_organize(organizer, base_path).map_err(|e| e.to_string())?;

    let mut write_error: Option<io::Error> = None;
    match output {
        OutputMode::Human { quiet } => {
            if !quiet {
                OutputFormatter::info(&format!("Organizing contents of: {}", base_path.display()));
            }
            let reporter = TerminalReporter::new(quiet);
            for event in handle.events() {
                reporter.handle(&event);
            }
        }
        OutputMode::Json => {
            let mut writer = JsonEventWriter::new(io::stdout().lock());
            for event in handle.events() {
                if let Err(e) = writer.write_event(&event) {
                    write_error = Some(e);
                    handle.cancel();
                    break;
                }
            }
        }
    }

    let summary = handle.join().map_err(|e| e.to_string())?;
    if let Some(e) = write_error {
        return Err(format!("Error writing events: {}", e));
    }

    if output == (OutputMode::Human { quiet: false }) && summary.moved_count() > 0 {
        OutputFormatter::summary_table(&summary.category_counts(), summary.moved_count());
    }

    match summary.failed_count() {
        0 => Ok(()),
        1 => Err("1 file could not be organized".to_string()),
        n => Err(format!("{} files could not be organized", n)),
    }
}

/// Shows where each file would go without creating folders or moving files.
pub fn organize_directory_dry_run(base_path: &Path) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", base_path.display()));

    let organizer = FileOrganizer::new(CategoryTable::default());
    let plan = organizer.plan(base_path).map_err(|e| e.to_string())?;

    if plan.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(());
    }

    OutputFormatter::header("Files would be organized as follows:");
    let mut category_counts: HashMap<String, usize> = HashMap::new();
    for planned in &plan {
        OutputFormatter::plain(&format!(" - {}", planned.file));
        OutputFormatter::plain(&format!("   → Would move to {}/", planned.category));
        *category_counts.entry(planned.category.clone()).or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&category_counts, plan.len());
    OutputFormatter::dry_run_notice("Dry run complete. No files were modified.");
    Ok(())
}

/// Prints the category table.
pub fn list_categories() {
    OutputFormatter::category_list(&CategoryTable::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directory_and_flags() {
        let cli = Cli::try_parse_from(["foldersort", "inbox", "--dry-run"])
            .expect("arguments should parse");
        assert_eq!(cli.directory, Some(PathBuf::from("inbox")));
        assert!(cli.dry_run);
        assert_eq!(cli.output_mode(), OutputMode::Human { quiet: false });
    }

    #[test]
    fn test_directory_required_unless_listing() {
        assert!(Cli::try_parse_from(["foldersort"]).is_err());
        let cli = Cli::try_parse_from(["foldersort", "--list-categories"])
            .expect("listing needs no directory");
        assert!(cli.list_categories);
        assert!(cli.directory.is_none());
    }

    #[test]
    fn test_json_mode() {
        let cli = Cli::try_parse_from(["foldersort", "inbox", "--json"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::Json);
        assert!(Cli::try_parse_from(["foldersort", "inbox", "--json", "--dry-run"]).is_err());
    }

    #[test]
    fn test_quiet_mode() {
        let cli = Cli::try_parse_from(["foldersort", "inbox", "-q"]).unwrap();
        assert_eq!(cli.output_mode(), OutputMode::Human { quiet: true });
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["foldersort", "inbox", "--config", "f.toml"]).is_err());
    }
}
