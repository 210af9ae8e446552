//! Output formatting and event rendering.
//!
//! [`OutputFormatter`] centralizes styled terminal output. The two event
//! consumers built on it are [`TerminalReporter`], which drives a progress
//! bar and prints narration, and [`JsonEventWriter`], which writes one JSON
//! object per event for scripts.

use crate::file_category::{CategoryTable, OTHERS};
use crate::file_organizer::OrganizeEvent;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::collections::HashMap;
use std::io::{self, Write};

/// Manages CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use foldersort::output::OutputFormatter;
    /// OutputFormatter::success("Folder organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{}", Self::success_line(message));
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{}", Self::error_line(message));
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{}", Self::warning_line(message));
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    fn success_line(message: &str) -> String {
        format!("{} {}", "✓".green(), message)
    }

    fn warning_line(message: &str) -> String {
        format!("{} {}", "⚠".yellow(), message)
    }

    fn error_line(message: &str) -> String {
        format!("{} {}", "✗".red(), message)
    }

    /// Creates a percentage progress bar for an organize run.
    ///
    /// The bar draws to stderr and stays hidden when stderr is not a terminal.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(100);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints a summary table with file counts by category.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use foldersort::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let mut counts = HashMap::new();
    /// counts.insert("Documents".to_string(), 15);
    /// counts.insert("Images".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(**count),
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = max_category_len
        );
    }

    /// Prints every category with its extensions, then the fallback.
    pub fn category_list(table: &CategoryTable) {
        Self::header("File Categories:");
        for category in table.categories() {
            let extensions: Vec<String> = category
                .extensions()
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_uppercase())
                .collect();
            println!("  {}: {}", category.name().bold(), extensions.join(", "));
        }
        println!("  {}: All other file types", OTHERS.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// A line of narration and the stream it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Stdout(String),
    Stderr(String),
}

/// Renders organize events on the terminal.
///
/// Narration is printed with the progress bar suspended so the two don't
/// garble each other, and still reaches the output when the bar is hidden
/// because stderr isn't a terminal. With `quiet` set only failures and the
/// final outcome are shown.
pub struct TerminalReporter {
    progress: ProgressBar,
    quiet: bool,
}

impl TerminalReporter {
    pub fn new(quiet: bool) -> Self {
        Self::with_progress(OutputFormatter::create_progress_bar(), quiet)
    }

    pub fn with_progress(progress: ProgressBar, quiet: bool) -> Self {
        Self { progress, quiet }
    }

    /// Returns the line printed for `event`, if any.
    pub fn narration(&self, event: &OrganizeEvent) -> Option<ReportLine> {
        match event {
            OrganizeEvent::Log { message } if !self.quiet => {
                Some(ReportLine::Stdout(message.clone()))
            }
            OrganizeEvent::FolderCreated { name } if !self.quiet => {
                Some(ReportLine::Stdout(format!("Created folder: {}", name)))
            }
            OrganizeEvent::FileFailed { file, reason } => Some(ReportLine::Stderr(
                OutputFormatter::error_line(&format!("{}: {}", file, reason)),
            )),
            _ => None,
        }
    }

    fn emit(&self, line: ReportLine) {
        self.progress.suspend(|| match line {
            ReportLine::Stdout(text) => println!("{}", text),
            ReportLine::Stderr(text) => eprintln!("{}", text),
        });
    }

    /// Renders a single event.
    pub fn handle(&self, event: &OrganizeEvent) {
        if let Some(line) = self.narration(event) {
            self.emit(line);
        }

        match event {
            OrganizeEvent::Log { .. }
            | OrganizeEvent::FolderCreated { .. }
            | OrganizeEvent::FileFailed { .. } => {}
            OrganizeEvent::Moved { file, .. } => {
                self.progress.set_message(format!("Processing: {}", file));
            }
            OrganizeEvent::Progress { percent } => {
                self.progress.set_position(u64::from(*percent));
            }
            OrganizeEvent::Completed { moved, failed } => {
                self.progress.finish_and_clear();
                OutputFormatter::success(&completion_message(*moved));
                if *failed > 0 {
                    OutputFormatter::warning(&format!(
                        "{} {} could not be organized. Please review errors above.",
                        failed,
                        plural(*failed)
                    ));
                }
            }
            OrganizeEvent::Cancelled { moved } => {
                self.progress.abandon();
                OutputFormatter::warning(&format!(
                    "Organization cancelled. (Files moved: {})",
                    moved
                ));
            }
            OrganizeEvent::Failed { message } => {
                self.progress
                    .abandon_with_message(format!("An error occurred: {}", message));
            }
        }
    }
}

/// Final message for a finished run.
///
/// # Example
///
/// ```
/// use foldersort::output::completion_message;
/// assert_eq!(
///     completion_message(3),
///     "Folder organized successfully! (Files moved: 3)"
/// );
/// ```
pub fn completion_message(moved: usize) -> String {
    format!("Folder organized successfully! (Files moved: {})", moved)
}

/// Writes organize events as JSON lines, each stamped with an RFC 3339 time.
///
/// ```text
/// {"category":"Images","event":"moved","file":"a.jpg","timestamp":"2025-01-01T10:00:00+00:00"}
/// ```
pub struct JsonEventWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonEventWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Serializes and writes one event, flushing after each line.
    pub fn write_event(&mut self, event: &OrganizeEvent) -> io::Result<()> {
        let mut value = serde_json::to_value(event)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "timestamp".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        serde_json::to_writer(&mut self.out, &value)?;
        self.out.write_all(b"\n")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_writer_emits_one_line_per_event() {
        let mut writer = JsonEventWriter::new(Vec::new());
        writer
            .write_event(&OrganizeEvent::FolderCreated {
                name: "Images".to_string(),
            })
            .unwrap();
        writer
            .write_event(&OrganizeEvent::Completed {
                moved: 2,
                failed: 0,
            })
            .unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "folder_created");
        assert_eq!(first["name"], "Images");
        assert!(first["timestamp"].is_string());

        let second: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["event"], "completed");
        assert_eq!(second["moved"], 2);
    }

    #[test]
    fn test_json_timestamp_is_rfc3339() {
        let mut writer = JsonEventWriter::new(Vec::new());
        writer
            .write_event(&OrganizeEvent::Progress { percent: 40 })
            .unwrap();
        let value: Value = serde_json::from_slice(&writer.into_inner()).unwrap();
        let stamp = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
        assert_eq!(value["percent"], 40);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1), "file");
        assert_eq!(plural(0), "files");
        assert_eq!(plural(4), "files");
    }

    #[test]
    fn test_reporter_handles_every_event() {
        let reporter = TerminalReporter::with_progress(ProgressBar::hidden(), true);
        reporter.handle(&OrganizeEvent::Progress { percent: 50 });
        assert_eq!(reporter.progress.position(), 50);
        reporter.handle(&OrganizeEvent::Moved {
            file: "a.jpg".to_string(),
            category: "Images".to_string(),
        });
        reporter.handle(&OrganizeEvent::Completed {
            moved: 1,
            failed: 0,
        });
        assert!(reporter.progress.is_finished());
    }

    #[test]
    fn test_failure_reason_reported_with_hidden_bar() {
        let reporter = TerminalReporter::with_progress(ProgressBar::hidden(), true);
        assert!(reporter.progress.is_hidden());

        let failed = OrganizeEvent::FileFailed {
            file: "a.jpg".to_string(),
            reason: "Destination already exists: Images/a.jpg".to_string(),
        };
        match reporter.narration(&failed) {
            Some(ReportLine::Stderr(text)) => {
                assert!(text.contains("a.jpg: Destination already exists"));
            }
            other => panic!("expected an error line, got {:?}", other),
        }
        reporter.handle(&failed);
    }

    #[test]
    fn test_quiet_hides_narration_only() {
        let log = OrganizeEvent::Log {
            message: "Moved: a.jpg → Images".to_string(),
        };
        let created = OrganizeEvent::FolderCreated {
            name: "Images".to_string(),
        };

        let quiet = TerminalReporter::with_progress(ProgressBar::hidden(), true);
        assert_eq!(quiet.narration(&log), None);
        assert_eq!(quiet.narration(&created), None);

        let chatty = TerminalReporter::with_progress(ProgressBar::hidden(), false);
        assert_eq!(
            chatty.narration(&log),
            Some(ReportLine::Stdout("Moved: a.jpg → Images".to_string()))
        );
        assert_eq!(
            chatty.narration(&created),
            Some(ReportLine::Stdout("Created folder: Images".to_string()))
        );
        assert_eq!(chatty.narration(&OrganizeEvent::Progress { percent: 10 }), None);
    }
}
