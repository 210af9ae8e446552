//! Running an organize pass on a background thread.
//!
//! The worker owns a [`FileOrganizer`] and sends every [`OrganizeEvent`] over
//! a channel, so the consumer (a terminal renderer, a GUI, a log writer) can
//! stay responsive and handle events on its own thread.

use crate::file_organizer::{
    CancelFlag, FileOrganizer, OrganizeError, OrganizeEvent, OrganizeResult, OrganizeSummary,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::{self, JoinHandle};

/// Handle to an organize pass running on its own thread.
pub struct OrganizeHandle {
    events: Receiver<OrganizeEvent>,
    cancel: CancelFlag,
    thread: JoinHandle<OrganizeResult<OrganizeSummary>>,
}

impl OrganizeHandle {
    /// Blocks for the next event. Returns `None` once the worker is done and
    /// every event has been received.
    pub fn recv(&self) -> Option<OrganizeEvent> {
        self.events.recv().ok()
    }

    /// Returns the next event if one is ready, without blocking.
    pub fn try_recv(&self) -> Option<OrganizeEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Iterates over events until the worker finishes.
    pub fn events(&self) -> impl Iterator<Item = OrganizeEvent> + '_ {
        self.events.iter()
    }

    /// Asks the worker to stop before its next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns a flag that cancels this run when set, e.g. from a signal handler.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Waits for the worker and returns its result.
    ///
    /// Undelivered events are dropped.
    pub fn join(self) -> OrganizeResult<OrganizeSummary> {
        drop(self.events);
        self.thread
            .join()
            .unwrap_or(Err(OrganizeError::WorkerPanicked))
    }
}

/// Starts organizing `base_path` on a background thread.
///
/// The base path is validated before the thread starts, so a missing or
/// non-directory target fails here and no event is ever sent.
///
/// # Examples
///
/// ```no_run
/// use foldersort::file_category::CategoryTable;
/// use foldersort::file_organizer::FileOrganizer;
/// use foldersort::worker::spawn_organize;
///
/// let handle = spawn_organize(FileOrganizer::new(CategoryTable::default()), "/tmp/inbox")
///     .expect("could not start");
/// for event in handle.events() {
///     println!("{:?}", event);
/// }
/// let summary = handle.join().expect("organize failed");
/// println!("moved {} files", summary.moved_count());
/// ```
pub fn spawn_organize(
    organizer: FileOrganizer,
    base_path: impl Into<PathBuf>,
) -> OrganizeResult<OrganizeHandle> {
    let base_path = base_path.into();
    FileOrganizer::validate_base_path(&base_path)?;

    let (sender, events) = mpsc::channel();
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("organizer".to_string())
        .spawn(move || {
            organizer.organize_with_cancel(&base_path, &worker_cancel, |event| {
                // a dropped receiver only means nobody is listening anymore
                let _ = sender.send(event);
            })
        })
        .map_err(|e| OrganizeError::WorkerSpawnFailed { source: e })?;

    Ok(OrganizeHandle {
        events,
        cancel,
        thread,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryTable;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_worker_delivers_events_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        fs::write(base_path.join("a.jpg"), "a").unwrap();
        fs::write(base_path.join("b.pdf"), "b").unwrap();
        fs::write(base_path.join("c.xyz"), "c").unwrap();

        let handle = spawn_organize(FileOrganizer::new(CategoryTable::default()), base_path)
            .expect("Failed to start worker");
        let events: Vec<_> = handle.events().collect();
        let summary = handle.join().expect("organize failed");

        assert_eq!(summary.moved_count(), 3);
        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                OrganizeEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![33, 67, 100]);
        assert_eq!(
            events.last(),
            Some(&OrganizeEvent::Completed {
                moved: 3,
                failed: 0
            })
        );
    }

    #[test]
    fn test_worker_rejects_missing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = spawn_organize(FileOrganizer::default(), temp_dir.path().join("missing"));
        assert!(matches!(result, Err(OrganizeError::InvalidBasePath { .. })));
    }

    #[test]
    fn test_join_without_reading_events() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("song.aac"), "s").unwrap();

        let handle = spawn_organize(FileOrganizer::default(), temp_dir.path())
            .expect("Failed to start worker");
        let summary = handle.join().expect("organize failed");

        assert_eq!(summary.moved_count(), 1);
        assert!(temp_dir.path().join("Audio").join("song.aac").exists());
    }

    #[test]
    fn test_recv_ends_after_terminal_event() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let handle = spawn_organize(FileOrganizer::default(), temp_dir.path())
            .expect("Failed to start worker");
        let mut last = None;
        while let Some(event) = handle.recv() {
            last = Some(event);
        }

        assert_eq!(
            last,
            Some(OrganizeEvent::Completed {
                moved: 0,
                failed: 0
            })
        );
        assert!(handle.try_recv().is_none());
        handle.join().expect("organize failed");
    }
}
