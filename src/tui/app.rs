use std::fs;
use std::path::{Path, PathBuf};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::session::Session;

/// Files listed per category in the results view before "... and N more".
pub const RESULTS_PREVIEW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    /// Subdirectories of the current directory.
    Browser,
    /// Filesystem roots and drives.
    Roots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightView {
    Actions,
    Results,
}

/// Work requested by a key press, run by the event loop after the next draw
/// so the status line can say what is happening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Sort,
    Undo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserRow {
    pub label: String,
    pub path: PathBuf,
}

pub struct App {
    session: Session,
    current_dir: PathBuf,
    rows: Vec<BrowserRow>,
    roots: Vec<PathBuf>,
    selected: usize,
    root_selected: usize,
    pane: Pane,
    view: RightView,
    status: String,
    pending: Option<PendingAction>,
    should_quit: bool,
}

impl App {
    pub fn new(session: Session, start_dir: PathBuf) -> Self {
        let mut app = Self {
            session,
            current_dir: start_dir,
            rows: Vec::new(),
            roots: available_roots(),
            selected: 0,
            root_selected: 0,
            pane: Pane::Browser,
            view: RightView::Actions,
            status: String::from("Ready. Browse to a directory and press 's' to sort it."),
            pending: None,
            should_quit: false,
        };
        app.refresh();
        app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_dir(&self) -> &Path {
        &self.current_dir
    }

    pub fn rows(&self) -> &[BrowserRow] {
        &self.rows
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn root_selected(&self) -> usize {
        self.root_selected
    }

    pub fn pane(&self) -> Pane {
        self.pane
    }

    pub fn view(&self) -> RightView {
        self.view
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn take_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('s') => self.request(PendingAction::Sort),
            KeyCode::Char('u') => self.request(PendingAction::Undo),
            KeyCode::Char('r') => {
                self.refresh();
                self.status = format!("Refreshed {}", self.current_dir.display());
            }
            KeyCode::Char('v') => self.toggle_results(),
            KeyCode::Char('d') => self.toggle_roots(),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => self.open_selected(),
            KeyCode::Backspace | KeyCode::Left | KeyCode::Char('h') => self.go_parent(),
            _ => {}
        }
    }

    fn request(&mut self, action: PendingAction) {
        self.status = match action {
            PendingAction::Sort => format!("Sorting files in {}...", self.current_dir.display()),
            PendingAction::Undo => String::from("Undoing last sort operation..."),
        };
        self.pending = Some(action);
    }

    pub fn run_pending(&mut self, action: PendingAction) {
        match action {
            PendingAction::Sort => self.sort_current(),
            PendingAction::Undo => self.undo_last(),
        }
    }

    /// Sorts the directory currently shown in the browser.
    pub fn sort_current(&mut self) {
        let target = self.current_dir.clone();
        self.status = match self.session.sort(&target) {
            Ok(summary) if summary.total_scanned == 0 => {
                String::from("No files found in the selected directory.")
            }
            Ok(summary) => {
                let mut message = format!(
                    "Sorting complete. {} of {} files sorted into categories.",
                    summary.moved_count(),
                    summary.total_scanned
                );
                if !summary.skipped.is_empty() {
                    message.push_str(&format!(
                        " {} skipped (press 'v' for details).",
                        summary.skipped.len()
                    ));
                }
                message
            }
            Err(e) => format!("Error: {}", e),
        };
        if self.session.last_sort().is_some_and(|s| s.moved_count() > 0) {
            self.view = RightView::Results;
        }
        self.refresh();
    }

    pub fn undo_last(&mut self) {
        let summary = self.session.undo();
        self.status = if summary.nothing_to_undo {
            String::from("Nothing to undo.")
        } else {
            let mut message = format!(
                "Undo complete. {} files restored to their original locations.",
                summary.restored
            );
            if !summary.removed_folders.is_empty() {
                message.push_str(&format!(
                    " Removed {} empty directories.",
                    summary.removed_folders.len()
                ));
            }
            if !summary.failed.is_empty() {
                message.push_str(&format!(
                    " {} could not be restored (press 'v' for details).",
                    summary.failed.len()
                ));
            }
            message
        };
        self.refresh();
    }

    /// Re-reads the current directory.
    pub fn refresh(&mut self) {
        self.rows = list_subdirectories(&self.current_dir);
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    fn toggle_results(&mut self) {
        self.view = match self.view {
            RightView::Actions => RightView::Results,
            RightView::Results => RightView::Actions,
        };
    }

    fn toggle_roots(&mut self) {
        self.pane = match self.pane {
            Pane::Browser => {
                self.roots = available_roots();
                self.root_selected = 0;
                Pane::Roots
            }
            Pane::Roots => Pane::Browser,
        };
    }

    fn move_selection(&mut self, delta: isize) {
        let (index, len) = match self.pane {
            Pane::Browser => (&mut self.selected, self.rows.len()),
            Pane::Roots => (&mut self.root_selected, self.roots.len()),
        };
        if len == 0 {
            return;
        }
        *index = index.saturating_add_signed(delta).min(len - 1);
    }

    fn open_selected(&mut self) {
        let target = match self.pane {
            Pane::Browser => self.rows.get(self.selected).map(|row| row.path.clone()),
            Pane::Roots => self.roots.get(self.root_selected).cloned(),
        };
        if let Some(path) = target {
            self.change_dir(path);
        }
    }

    fn go_parent(&mut self) {
        if let Some(parent) = self.current_dir.parent() {
            let parent = parent.to_path_buf();
            self.change_dir(parent);
        }
    }

    pub fn change_dir(&mut self, path: PathBuf) {
        match fs::read_dir(&path) {
            Ok(_) => {
                self.current_dir = path;
                self.pane = Pane::Browser;
                self.selected = 0;
                self.refresh();
                self.status = format!("Selected directory: {}", self.current_dir.display());
            }
            Err(e) => {
                self.status = format!("Error changing directory: {}", e);
            }
        }
    }

    /// Lines for the results view: per-category counts with a preview of the
    /// moved files, then anything that went wrong.
    pub fn result_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();

        if let Some(summary) = self.session.last_sort() {
            lines.push(format!("Total files sorted: {}", summary.moved_count()));
            for (category, files) in &summary.moved {
                lines.push(format!("{} ({})", category, files.len()));
                for file in files.iter().take(RESULTS_PREVIEW) {
                    let name = file
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default();
                    lines.push(format!("  • {}", name));
                }
                if files.len() > RESULTS_PREVIEW {
                    let hidden = files.len() - RESULTS_PREVIEW;
                    lines.push(format!("  • ... and {} more", hidden));
                }
            }
            if !summary.skipped.is_empty() {
                lines.push(format!("Skipped ({})", summary.skipped.len()));
                for skipped in &summary.skipped {
                    lines.push(format!(
                        "  • {}: {}",
                        skipped.path.display(),
                        skipped.reason
                    ));
                }
            }
        } else if let Some(summary) = self.session.last_undo() {
            if summary.nothing_to_undo {
                lines.push(String::from("Nothing to undo."));
            } else {
                lines.push(format!("Restored: {}", summary.restored));
                let removed = summary.removed_folders.len();
                lines.push(format!("Removed folders: {}", removed));
                for failed in &summary.failed {
                    lines.push(format!(
                        "  • {}: {}",
                        failed.source_path.display(),
                        failed.reason
                    ));
                }
                for cleanup in &summary.cleanup_failures {
                    lines.push(format!(
                        "  • {}: {}",
                        cleanup.folder.display(),
                        cleanup.reason
                    ));
                }
            }
        } else {
            lines.push(String::from("No sorting results to show."));
        }

        lines
    }
}

/// Subdirectories of `dir`, sorted case-insensitively. Unreadable directories
/// yield an empty list.
fn list_subdirectories(dir: &Path) -> Vec<BrowserRow> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut rows: Vec<BrowserRow> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .map(|entry| BrowserRow {
            label: format!("{}/", entry.file_name().to_string_lossy()),
            path: entry.path(),
        })
        .collect();
    rows.sort_by_key(|row| row.label.to_lowercase());
    rows
}

/// Places to start browsing from: drive letters on Windows, otherwise the
/// filesystem root and the home directory.
pub fn available_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if cfg!(windows) {
        for letter in b'A'..=b'Z' {
            let drive = PathBuf::from(format!("{}:\\", letter as char));
            if drive.exists() {
                roots.push(drive);
            }
        }
    } else {
        roots.push(PathBuf::from("/"));
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        let home = PathBuf::from(home);
        if !roots.contains(&home) {
            roots.push(home);
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_in(dir: &Path) -> App {
        App::new(Session::default(), dir.to_path_buf())
    }

    #[test]
    fn test_browser_lists_only_subdirectories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("beta")).unwrap();
        fs::create_dir(temp_dir.path().join("Alpha")).unwrap();
        fs::write(temp_dir.path().join("file.txt"), "x").unwrap();

        let app = app_in(temp_dir.path());
        let labels: Vec<_> = app.rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha/", "beta/"]);
    }

    #[test]
    fn test_sort_key_queues_then_sorts_current_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();
        fs::write(temp_dir.path().join("b.png"), "b").unwrap();

        let mut app = app_in(temp_dir.path());
        app.handle_key(key(KeyCode::Char('s')));
        assert!(app.status().starts_with("Sorting files in"));
        let action = app.take_pending().expect("sort should be queued");
        app.run_pending(action);

        assert!(temp_dir.path().join("Documents/a.txt").is_file());
        assert!(temp_dir.path().join("Images/b.png").is_file());
        assert!(app.status().starts_with("Sorting complete. 2 of 2"));
        assert_eq!(app.view(), RightView::Results);
        assert_eq!(app.rows().len(), 2);
        assert!(app.session().can_undo());
    }

    #[test]
    fn test_undo_restores_and_reports() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        let mut app = app_in(temp_dir.path());
        app.sort_current();
        app.undo_last();

        assert!(temp_dir.path().join("a.txt").is_file());
        assert!(app.rows().is_empty());
        assert!(app.status().contains("Removed 1 empty directories"));
    }

    #[test]
    fn test_undo_without_sort_says_nothing_to_undo() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = app_in(temp_dir.path());
        app.undo_last();
        assert_eq!(app.status(), "Nothing to undo.");
    }

    #[test]
    fn test_sort_empty_directory_reports_no_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = app_in(temp_dir.path());
        app.sort_current();
        assert_eq!(app.status(), "No files found in the selected directory.");
        assert_eq!(app.view(), RightView::Actions);
    }

    #[test]
    fn test_navigation_enters_and_leaves_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("inner")).unwrap();

        let mut app = app_in(temp_dir.path());
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.current_dir(), temp_dir.path().join("inner"));

        app.handle_key(key(KeyCode::Backspace));
        assert_eq!(app.current_dir(), temp_dir.path());
    }

    #[test]
    fn test_selection_is_clamped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("a")).unwrap();
        fs::create_dir(temp_dir.path().join("b")).unwrap();

        let mut app = app_in(temp_dir.path());
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.selected(), 0);
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Down));
        }
        assert_eq!(app.selected(), 1);
    }

    #[test]
    fn test_results_preview_truncates_long_categories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        for i in 0..7 {
            fs::write(temp_dir.path().join(format!("note{}.txt", i)), "x").unwrap();
        }

        let mut app = app_in(temp_dir.path());
        app.sort_current();
        let lines = app.result_lines();

        assert_eq!(lines[0], "Total files sorted: 7");
        assert_eq!(lines[1], "Documents (7)");
        assert_eq!(lines.last().map(String::as_str), Some("  • ... and 2 more"));
    }

    #[test]
    fn test_quit_keys() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = app_in(temp_dir.path());
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.should_quit());

        let mut app = app_in(temp_dir.path());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }

    #[test]
    fn test_roots_pane_toggles() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut app = app_in(temp_dir.path());
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.pane(), Pane::Roots);
        assert!(!app.roots().is_empty());
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.pane(), Pane::Browser);
    }
}
