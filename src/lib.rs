//! foldersort - sort the files of a folder into category subfolders
//!
//! This library maps file names to categories by extension, moves the
//! top-level files of a directory into one subdirectory per category while
//! reporting progress as events, and can run that pass on a background
//! worker.

pub mod cli;
pub mod file_category;
pub mod file_organizer;
pub mod output;
pub mod worker;

pub use file_category::{Category, CategoryTable, OTHERS, extension_of};
pub use file_organizer::{
    CancelFlag, FileOrganizer, OrganizeError, OrganizeEvent, OrganizeResult, OrganizeSummary,
};
pub use worker::{OrganizeHandle, spawn_organize};

pub use cli::{Cli, OutputMode, run};
