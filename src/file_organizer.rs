//! Moving files into category directories.
//!
//! [`FileOrganizer`] runs one organize pass over a directory: it makes sure
//! every category subdirectory exists, snapshots the top-level regular files
//! and moves each into the directory its category names. Progress is reported
//! through [`OrganizeEvent`]s handed to a caller-supplied callback, which is
//! invoked synchronously on the thread running the pass.

use crate::file_category::CategoryTable;
use serde::Serialize;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Something that happened during an organize run.
///
/// Every run that gets past the precondition check ends with exactly one
/// terminal event: [`Completed`](Self::Completed),
/// [`Cancelled`](Self::Cancelled) or [`Failed`](Self::Failed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrganizeEvent {
    /// A category directory is in place. Sent whether or not it already existed.
    FolderCreated { name: String },
    /// Human-readable narration.
    Log { message: String },
    /// A file was moved into its category directory.
    Moved { file: String, category: String },
    /// Share of the snapshot processed so far, 0 to 100.
    Progress { percent: u8 },
    /// A single file could not be moved; the run continues.
    FileFailed { file: String, reason: String },
    /// The run finished.
    Completed { moved: usize, failed: usize },
    /// The run stopped early on request.
    Cancelled { moved: usize },
    /// The run was aborted by an unrecoverable error.
    Failed { message: String },
}

impl OrganizeEvent {
    /// Returns true for the events that end a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed { .. } | Self::Cancelled { .. } | Self::Failed { .. }
        )
    }
}

/// Represents a single file move performed during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The original path of the file before organization.
    pub original_path: PathBuf,
    /// The new path of the file after organization.
    pub new_path: PathBuf,
    /// The category the file was moved to.
    pub category: String,
}

/// A file that stayed in place because its move failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub reason: String,
}

/// Where a file would go, as computed by [`FileOrganizer::plan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub file: String,
    pub category: String,
}

/// Outcome of a completed or cancelled run.
#[derive(Debug, Clone, Default)]
pub struct OrganizeSummary {
    /// Number of files in the snapshot.
    pub total: usize,
    /// Moves that succeeded, in snapshot order.
    pub operations: Vec<Operation>,
    /// Files that could not be moved.
    pub failures: Vec<FileFailure>,
    /// Whether the run stopped before the end of the snapshot.
    pub cancelled: bool,
}

impl OrganizeSummary {
    fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn moved_count(&self) -> usize {
        self.operations.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    /// Returns true when every snapshotted file was moved.
    pub fn is_complete_success(&self) -> bool {
        !self.cancelled && self.failures.is_empty() && self.moved_count() == self.total
    }

    /// Counts moved files per category.
    pub fn category_counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for op in &self.operations {
            *counts.entry(op.category.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Shared flag for cooperative cancellation, checked between files.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the run to stop before the next file.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Errors that can occur during file organization operations.
#[derive(Debug)]
pub enum OrganizeError {
    /// The base directory path doesn't exist or can't be inspected.
    InvalidBasePath {
        path: PathBuf,
        source: io::Error,
    },
    /// The base path exists but is not a directory.
    NotADirectory { path: PathBuf },
    /// Failed to create a category directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// Failed to list the base directory.
    DirectoryReadFailed {
        path: PathBuf,
        source: io::Error,
    },
    /// A file with the same name is already in the category directory.
    DestinationExists { path: PathBuf },
    /// Failed to move a file to its category directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: io::Error,
    },
    /// The base directory disappeared while the run was in progress.
    BaseDirectoryVanished { path: PathBuf },
    /// The background worker thread could not be started.
    WorkerSpawnFailed { source: io::Error },
    /// The background worker thread panicked.
    WorkerPanicked,
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBasePath { path, source } => {
                write!(f, "Invalid base path {}: {}", path.display(), source)
            }
            Self::NotADirectory { path } => {
                write!(f, "{} is not a directory", path.display())
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::DirectoryReadFailed { path, source } => {
                write!(f, "Failed to read directory {}: {}", path.display(), source)
            }
            Self::DestinationExists { path } => {
                write!(f, "Destination already exists: {}", path.display())
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::BaseDirectoryVanished { path } => {
                write!(f, "Directory {} disappeared during organization", path.display())
            }
            Self::WorkerSpawnFailed { source } => {
                write!(f, "Failed to start organizer thread: {}", source)
            }
            Self::WorkerPanicked => write!(f, "Organizer thread panicked"),
        }
    }
}

impl std::error::Error for OrganizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidBasePath { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::DirectoryReadFailed { source, .. }
            | Self::WorkerSpawnFailed { source } => Some(source),
            Self::FileMoveFailure { source_error, .. } => Some(source_error),
            _ => None,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Integer percentage of `processed` out of `total`, rounded half up.
///
/// An empty snapshot counts as fully processed.
///
/// # Examples
///
/// ```
/// use foldersort::file_organizer::progress_percent;
///
/// assert_eq!(progress_percent(0, 0), 100);
/// assert_eq!(progress_percent(1, 3), 33);
/// assert_eq!(progress_percent(2, 3), 67);
/// assert_eq!(progress_percent(3, 3), 100);
/// ```
pub fn progress_percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let processed = processed.min(total);
    ((processed * 100 + total / 2) / total) as u8
}

/// Sorts the top-level files of a directory into category subdirectories.
#[derive(Debug, Clone, Default)]
pub struct FileOrganizer {
    table: CategoryTable,
}

impl FileOrganizer {
    /// Creates an organizer for the given category table.
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Checks that `base_path` exists and is a directory.
    pub fn validate_base_path(base_path: &Path) -> OrganizeResult<()> {
        let metadata = fs::metadata(base_path).map_err(|e| OrganizeError::InvalidBasePath {
            path: base_path.to_path_buf(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(OrganizeError::NotADirectory {
                path: base_path.to_path_buf(),
            });
        }
        Ok(())
    }

    /// Lists the file names eligible for a run, sorted by name.
    ///
    /// Only regular files count. Symlinks are followed, so a link to a file
    /// is eligible while links to directories and dangling links are not.
    /// An entry whose metadata can't be read at all is skipped the same way
    /// and stays where it is.
    pub fn snapshot(&self, base_path: &Path) -> OrganizeResult<Vec<OsString>> {
        let read_failed = |e| OrganizeError::DirectoryReadFailed {
            path: base_path.to_path_buf(),
            source: e,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(base_path).map_err(read_failed)? {
            let entry = entry.map_err(read_failed)?;
            let is_file = fs::metadata(entry.path())
                .map(|m| m.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            names.push(entry.file_name());
        }
        names.sort();
        Ok(names)
    }

    /// Computes where each eligible file would go, without touching the disk.
    pub fn plan(&self, base_path: &Path) -> OrganizeResult<Vec<PlannedMove>> {
        Self::validate_base_path(base_path)?;
        let plan = self
            .snapshot(base_path)?
            .iter()
            .map(|name| {
                let file = name.to_string_lossy().into_owned();
                PlannedMove {
                    category: self.table.classify(&file).to_string(),
                    file,
                }
            })
            .collect();
        Ok(plan)
    }

    /// Organizes `base_path`, reporting progress through `on_event`.
    ///
    /// Returns an error without emitting anything if `base_path` is missing
    /// or not a directory. Fatal errors after that point are reported as a
    /// single [`OrganizeEvent::Failed`] and also returned. Files that fail to
    /// move individually are reported and skipped.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldersort::file_category::CategoryTable;
    /// use foldersort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::new(CategoryTable::default());
    /// let summary = organizer
    ///     .organize(Path::new("/path/to/Downloads"), |event| println!("{:?}", event))
    ///     .expect("organize failed");
    /// println!("moved {} files", summary.moved_count());
    /// ```
    pub fn organize<F>(&self, base_path: &Path, on_event: F) -> OrganizeResult<OrganizeSummary>
    where
        F: FnMut(OrganizeEvent),
    {
        self.organize_with_cancel(base_path, &CancelFlag::new(), on_event)
    }

    /// Like [`organize`](Self::organize), stopping before the next file once
    /// `cancel` is set.
    pub fn organize_with_cancel<F>(
        &self,
        base_path: &Path,
        cancel: &CancelFlag,
        mut on_event: F,
    ) -> OrganizeResult<OrganizeSummary>
    where
        F: FnMut(OrganizeEvent),
    {
        Self::validate_base_path(base_path)?;

        self.run(base_path, cancel, &mut on_event).inspect_err(|e| {
            on_event(OrganizeEvent::Failed {
                message: e.to_string(),
            })
        })
    }

    fn run<F>(
        &self,
        base_path: &Path,
        cancel: &CancelFlag,
        on_event: &mut F,
    ) -> OrganizeResult<OrganizeSummary>
    where
        F: FnMut(OrganizeEvent),
    {
        on_event(OrganizeEvent::Log {
            message: "Starting organization...".to_string(),
        });

        for name in self.table.category_names() {
            ensure_dir(&base_path.join(name))?;
            on_event(OrganizeEvent::FolderCreated {
                name: name.to_string(),
            });
        }

        let files = self.snapshot(base_path)?;
        let total = files.len();
        let mut summary = OrganizeSummary::new(total);

        if total == 0 {
            on_event(OrganizeEvent::Log {
                message: "No files to organize.".to_string(),
            });
            on_event(OrganizeEvent::Progress {
                percent: progress_percent(0, 0),
            });
        }

        for (index, name) in files.iter().enumerate() {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                on_event(OrganizeEvent::Log {
                    message: "Organization cancelled.".to_string(),
                });
                on_event(OrganizeEvent::Cancelled {
                    moved: summary.moved_count(),
                });
                return Ok(summary);
            }

            let file = name.to_string_lossy().into_owned();
            let category = self.table.classify(&file);

            match Self::move_to_category_with_record(base_path, &base_path.join(name), category) {
                Ok(operation) => {
                    on_event(OrganizeEvent::Moved {
                        file: file.clone(),
                        category: category.to_string(),
                    });
                    on_event(OrganizeEvent::Log {
                        message: format!("Moved: {} → {}", file, category),
                    });
                    summary.operations.push(operation);
                }
                Err(error) => {
                    if !base_path.is_dir() {
                        return Err(OrganizeError::BaseDirectoryVanished {
                            path: base_path.to_path_buf(),
                        });
                    }
                    let reason = error.to_string();
                    on_event(OrganizeEvent::FileFailed {
                        file: file.clone(),
                        reason: reason.clone(),
                    });
                    on_event(OrganizeEvent::Log {
                        message: format!("Could not move {}: {}", file, reason),
                    });
                    summary.failures.push(FileFailure { file, reason });
                }
            }

            on_event(OrganizeEvent::Progress {
                percent: progress_percent(index + 1, total),
            });
        }

        on_event(OrganizeEvent::Completed {
            moved: summary.moved_count(),
            failed: summary.failed_count(),
        });
        Ok(summary)
    }

    /// Moves a file into its category directory within the base path and
    /// records the operation.
    ///
    /// The category directory is created if it is missing. An existing entry
    /// with the same name in the category directory is never overwritten,
    /// even one that appears while the move is underway: the move fails with
    /// [`OrganizeError::DestinationExists`] instead.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use foldersort::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let result = FileOrganizer::move_to_category_with_record(
    ///     Path::new("/path/to/base"),
    ///     Path::new("/path/to/base/image.png"),
    ///     "Images",
    /// );
    ///
    /// match result {
    ///     Ok(op) => println!("Moved {} to {}", op.original_path.display(), op.new_path.display()),
    ///     Err(e) => eprintln!("Organization failed: {}", e),
    /// }
    /// ```
    pub fn move_to_category_with_record(
        base_path: &Path,
        file_path: &Path,
        category_dir_name: &str,
    ) -> OrganizeResult<Operation> {
        let category_path = base_path.join(category_dir_name);
        ensure_dir(&category_path)?;

        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::FileMoveFailure {
                source: file_path.to_path_buf(),
                destination: category_path.clone(),
                source_error: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "file has no name component",
                ),
            })?;

        let destination_path = category_path.join(file_name);

        move_file(file_path, &destination_path).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                OrganizeError::DestinationExists {
                    path: destination_path.clone(),
                }
            } else {
                OrganizeError::FileMoveFailure {
                    source: file_path.to_path_buf(),
                    destination: destination_path.clone(),
                    source_error: e,
                }
            }
        })?;

        Ok(Operation {
            original_path: file_path.to_path_buf(),
            new_path: destination_path,
            category: category_dir_name.to_string(),
        })
    }
}

/// Creates `path` as a directory unless a directory is already there.
fn ensure_dir(path: &Path) -> OrganizeResult<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(OrganizeError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Moves `from` to `to`, failing with `AlreadyExists` if anything is at `to`.
///
/// The new name is created with a hard link, or with an exclusive copy where
/// links aren't possible (across filesystems, or on filesystems without
/// them), and only then is the old name removed. Neither step replaces an
/// existing entry, unlike `rename`.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::hard_link(from, to) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Err(e),
        Err(_) => copy_new(from, to)?,
    }
    if let Err(e) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}

/// Copies `from` to a not yet existing `to`. A symlink is recreated as a
/// symlink to the same target rather than copied as its target's content.
fn copy_new(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(from)?;

    #[cfg(unix)]
    if metadata.file_type().is_symlink() {
        return std::os::unix::fs::symlink(fs::read_link(from)?, to);
    }

    let mut source = File::open(from)?;
    let mut destination = OpenOptions::new().write(true).create_new(true).open(to)?;
    let copied = io::copy(&mut source, &mut destination)
        .and_then(|_| destination.set_permissions(metadata.permissions()));
    if let Err(e) = copied {
        drop(destination);
        let _ = fs::remove_file(to);
        return Err(e);
    }
    Ok(())
}
