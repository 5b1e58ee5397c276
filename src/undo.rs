/// Undoing a sort.
///
/// Moves every file recorded in an [`OperationLog`] back to where it came from,
/// then removes the category folders the undo left empty.
use crate::sorter::{MoveRecord, OperationLog};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Why a single record could not be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FailedUndoReason {
    /// The sorted file is no longer where the sort put it.
    MissingDestination,
    /// Something now sits at the original location; it is never overwritten.
    SourceOccupied,
    /// The rename itself failed.
    MoveFailed(String),
}

impl fmt::Display for FailedUndoReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDestination => write!(f, "file not found at its sorted location"),
            Self::SourceOccupied => write!(f, "original location is occupied by another file"),
            Self::MoveFailed(reason) => write!(f, "failed to move file back: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUndo {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub reason: FailedUndoReason,
}

/// A category folder that was empty but could not be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub folder: PathBuf,
    pub reason: String,
}

/// Represents the result of an undo operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UndoSummary {
    /// Number of files moved back.
    pub restored: usize,
    pub failed: Vec<FailedUndo>,
    /// Category folders removed because they ended up empty.
    pub removed_folders: Vec<PathBuf>,
    pub cleanup_failures: Vec<CleanupFailure>,
    /// Set when there was no sort to undo.
    pub nothing_to_undo: bool,
}

impl UndoSummary {
    pub(crate) fn nothing_to_undo() -> Self {
        Self {
            nothing_to_undo: true,
            ..Default::default()
        }
    }

    pub fn total_processed(&self) -> usize {
        self.restored + self.failed.len()
    }

    /// Returns true if every file came back and every empty folder went away.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.cleanup_failures.is_empty()
    }
}

/// Undoes the moves recorded in `log` and clears it.
///
/// Records are processed most recent first. A record that cannot be undone is
/// reported in [`UndoSummary::failed`] and the remaining records are still
/// processed. Once every record has been tried, each category folder touched by
/// the log is removed if it is empty.
///
/// Calling this with an empty log does nothing and reports
/// [`UndoSummary::nothing_to_undo`].
///
/// # Examples
///
/// ```no_run
/// use dirsort::config::CompiledFilters;
/// use dirsort::file_category::CategoryTable;
/// use dirsort::sorter::Sorter;
/// use dirsort::undo::undo;
/// use std::path::Path;
///
/// let table = CategoryTable::default();
/// let filters = CompiledFilters::allow_all();
/// let (mut log, _) = Sorter::new(&table, &filters)
///     .sort(Path::new("/home/me/Downloads"))
///     .expect("directory should be readable");
///
/// let summary = undo(&mut log);
/// println!("restored {} files", summary.restored);
/// assert!(log.is_empty());
/// ```
pub fn undo(log: &mut OperationLog) -> UndoSummary {
    if log.is_empty() {
        tracing::info!("nothing to undo");
        return UndoSummary::nothing_to_undo();
    }

    let folders = log.touched_folders();
    let records = log.drain();
    let mut summary = UndoSummary::default();

    for record in records.iter().rev() {
        match restore_file(record) {
            Ok(()) => {
                tracing::debug!(
                    "restored {} -> {}",
                    record.destination_path.display(),
                    record.source_path.display()
                );
                summary.restored += 1;
            }
            Err(reason) => {
                tracing::warn!(
                    "could not restore {}: {}",
                    record.source_path.display(),
                    reason
                );
                summary.failed.push(FailedUndo {
                    source_path: record.source_path.clone(),
                    destination_path: record.destination_path.clone(),
                    reason,
                });
            }
        }
    }

    for folder in folders {
        match remove_if_empty(&folder) {
            Ok(true) => summary.removed_folders.push(folder),
            Ok(false) => {}
            Err(reason) => summary.cleanup_failures.push(CleanupFailure { folder, reason }),
        }
    }

    tracing::info!(
        "undo: {} restored, {} failed, {} folders removed",
        summary.restored,
        summary.failed.len(),
        summary.removed_folders.len()
    );
    summary
}

/// Moves one file back to its original location.
fn restore_file(record: &MoveRecord) -> Result<(), FailedUndoReason> {
    if fs::symlink_metadata(&record.destination_path).is_err() {
        return Err(FailedUndoReason::MissingDestination);
    }

    if fs::symlink_metadata(&record.source_path).is_ok() {
        return Err(FailedUndoReason::SourceOccupied);
    }

    fs::rename(&record.destination_path, &record.source_path)
        .map_err(|e| FailedUndoReason::MoveFailed(e.to_string()))
}

/// Removes `folder` if it exists and is empty. Returns whether it was removed.
fn remove_if_empty(folder: &Path) -> Result<bool, String> {
    let mut entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        // Already gone, or replaced by something we should not touch.
        Err(_) if !folder.is_dir() => return Ok(false),
        Err(e) => return Err(format!("Could not read folder: {}", e)),
    };

    if entries.next().is_some() {
        return Ok(false);
    }

    fs::remove_dir(folder)
        .map(|()| true)
        .map_err(|e| format!("Could not remove folder: {}", e))
}
