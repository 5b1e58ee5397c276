//! The undoable state of one run of the program.
//!
//! A [`Session`] owns the only [`OperationLog`] there is. Each sort replaces it,
//! and an undo drains it, so only the most recent sort can ever be undone.

use crate::config::CompiledFilters;
use crate::file_category::CategoryTable;
use crate::sorter::{OperationLog, SortPlan, SortResult, SortSummary, Sorter};
use crate::undo::{self, UndoSummary};
use std::path::Path;

/// Where the session stands with respect to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing to undo.
    Idle,
    /// The last sort moved files and can be undone.
    Sorted,
}

pub struct Session {
    table: CategoryTable,
    filters: CompiledFilters,
    log: Option<OperationLog>,
    last_sort: Option<SortSummary>,
    last_undo: Option<UndoSummary>,
}

impl Session {
    pub fn new(table: CategoryTable, filters: CompiledFilters) -> Self {
        Self {
            table,
            filters,
            log: None,
            last_sort: None,
            last_undo: None,
        }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Sorts `target_dir`, replacing whatever the previous sort recorded.
    ///
    /// If the directory cannot be read the previous log is kept and can still
    /// be undone.
    pub fn sort(&mut self, target_dir: &Path) -> SortResult<&SortSummary> {
        self.sort_with_progress(target_dir, |_, _, _| {})
    }

    pub fn sort_with_progress<F>(
        &mut self,
        target_dir: &Path,
        on_progress: F,
    ) -> SortResult<&SortSummary>
    where
        F: FnMut(usize, usize, &Path),
    {
        let (log, summary) =
            Sorter::new(&self.table, &self.filters).sort_with_progress(target_dir, on_progress)?;
        if let Some(previous) = &self.log
            && !previous.is_empty()
        {
            tracing::debug!(
                "discarding undo log of {} ({} moves)",
                previous.target_dir().display(),
                previous.len()
            );
        }
        self.log = Some(log);
        self.last_undo = None;
        Ok(self.last_sort.insert(summary))
    }

    /// Dry run with this session's table and filters.
    pub fn plan(&self, target_dir: &Path) -> SortResult<SortPlan> {
        Sorter::new(&self.table, &self.filters).plan(target_dir)
    }

    /// Undoes the most recent sort. With nothing to undo this is a no-op whose
    /// summary says so.
    pub fn undo(&mut self) -> &UndoSummary {
        let summary = match self.log.as_mut() {
            Some(log) => undo::undo(log),
            None => UndoSummary::nothing_to_undo(),
        };
        self.log = None;
        self.last_sort = None;
        self.last_undo.insert(summary)
    }

    pub fn state(&self) -> SessionState {
        match &self.log {
            Some(log) if !log.is_empty() => SessionState::Sorted,
            _ => SessionState::Idle,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.state() == SessionState::Sorted
    }

    /// The log of the most recent sort, if it has not been undone.
    pub fn log(&self) -> Option<&OperationLog> {
        self.log.as_ref()
    }

    pub fn last_sort(&self) -> Option<&SortSummary> {
        self.last_sort.as_ref()
    }

    pub fn last_undo(&self) -> Option<&UndoSummary> {
        self.last_undo.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(CategoryTable::default(), CompiledFilters::allow_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::default();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.can_undo());
        assert!(session.last_sort().is_none());
    }

    #[test]
    fn test_sort_then_undo_returns_to_idle() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.txt"), "a").unwrap();

        let mut session = Session::default();
        let moved = session.sort(base).unwrap().moved_count();
        assert_eq!(moved, 1);
        assert_eq!(session.state(), SessionState::Sorted);

        let restored = session.undo().restored;
        assert_eq!(restored, 1);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.last_sort().is_none());
        assert!(session.last_undo().is_some());
        assert!(base.join("a.txt").is_file());
    }

    #[test]
    fn test_undo_on_idle_session_reports_nothing_to_undo() {
        let mut session = Session::default();
        assert!(session.undo().nothing_to_undo);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_new_sort_replaces_previous_log() {
        let first = TempDir::new().expect("Failed to create temp directory");
        let second = TempDir::new().expect("Failed to create temp directory");
        fs::write(first.path().join("a.txt"), "a").unwrap();
        fs::write(second.path().join("b.png"), "b").unwrap();

        let mut session = Session::default();
        session.sort(first.path()).unwrap();
        session.sort(second.path()).unwrap();
        session.undo();

        // Only the second sort is undone.
        assert!(first.path().join("Documents/a.txt").is_file());
        assert!(second.path().join("b.png").is_file());
        assert!(!second.path().join("Images").exists());
    }

    #[test]
    fn test_sort_moving_nothing_leaves_session_idle() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut session = Session::default();
        session.sort(temp_dir.path()).unwrap();
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_failed_sort_keeps_previous_log() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        let mut session = Session::default();
        session.sort(temp_dir.path()).unwrap();
        assert!(session.sort(Path::new("/non/existent/path")).is_err());
        assert!(session.can_undo());
    }
}
