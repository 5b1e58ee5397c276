/// Sorting files into category folders.
///
/// This module moves the files sitting directly in a target directory into
/// per-category subfolders, creating each folder the first time a file needs
/// it. Every completed move is recorded in an [`OperationLog`] so the sort can
/// be undone.
use crate::config::CompiledFilters;
use crate::file_category::CategoryTable;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single completed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// Where the file was before the sort.
    pub source_path: PathBuf,
    /// Where the sort put it.
    pub destination_path: PathBuf,
    pub category: String,
}

impl MoveRecord {
    /// The category folder holding the moved file.
    pub fn folder(&self) -> Option<&Path> {
        self.destination_path.parent()
    }
}

/// The moves performed by one sort invocation.
///
/// Only moves that actually happened are recorded, so the log always matches
/// what is on disk at the end of a sort.
#[derive(Debug, Clone, Serialize)]
pub struct OperationLog {
    target_dir: PathBuf,
    started_at: DateTime<Local>,
    records: Vec<MoveRecord>,
    created_folders: Vec<PathBuf>,
}

impl OperationLog {
    /// Creates an empty log for a sort of `target_dir`.
    pub fn new(target_dir: PathBuf) -> Self {
        Self {
            target_dir,
            started_at: Local::now(),
            records: Vec::new(),
            created_folders: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub(crate) fn note_created_folder(&mut self, folder: PathBuf) {
        self.created_folders.push(folder);
    }

    pub(crate) fn forget_created_folder(&mut self, folder: &Path) {
        self.created_folders.retain(|f| f != folder);
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// Category folders this sort had to create.
    pub fn created_folders(&self) -> &[PathBuf] {
        &self.created_folders
    }

    /// Every distinct category folder a file was moved into.
    pub fn touched_folders(&self) -> BTreeSet<PathBuf> {
        self.records
            .iter()
            .filter_map(|r| r.folder().map(Path::to_path_buf))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Removes and returns all records, leaving the log empty.
    pub(crate) fn drain(&mut self) -> Vec<MoveRecord> {
        self.created_folders.clear();
        std::mem::take(&mut self.records)
    }
}

/// Errors that abort a sort before any file is touched.
#[derive(Debug, Error)]
pub enum SortError {
    #[error("Cannot read directory {}: {source}", .path.display())]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type SortResult<T> = Result<T, SortError>;

/// A file that was left in place, with the reason why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// What a sort did, for display.
#[derive(Debug, Clone, Serialize)]
pub struct SortSummary {
    pub target_dir: PathBuf,
    /// Files considered for sorting (after filter rules).
    pub total_scanned: usize,
    /// Destination paths of the moved files, by category.
    pub moved: BTreeMap<String, Vec<PathBuf>>,
    pub skipped: Vec<SkippedFile>,
    pub created_folders: Vec<PathBuf>,
}

impl SortSummary {
    fn new(target_dir: PathBuf) -> Self {
        Self {
            target_dir,
            total_scanned: 0,
            moved: BTreeMap::new(),
            skipped: Vec::new(),
            created_folders: Vec::new(),
        }
    }

    pub fn moved_count(&self) -> usize {
        self.moved.values().map(Vec::len).sum()
    }

    /// Number of moved files per category, ordered by category name.
    pub fn moved_per_category(&self) -> BTreeMap<&str, usize> {
        self.moved
            .iter()
            .map(|(category, files)| (category.as_str(), files.len()))
            .collect()
    }

    /// True when every scanned file was moved.
    pub fn is_complete_success(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// A move a sort would perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedMove {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub category: String,
}

/// Result of a dry run.
#[derive(Debug, Clone, Serialize)]
pub struct SortPlan {
    pub target_dir: PathBuf,
    pub moves: Vec<PlannedMove>,
    /// Files the sort would leave in place, with the reason.
    pub skipped: Vec<SkippedFile>,
}

impl SortPlan {
    pub fn counts_per_category(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for planned in &self.moves {
            *counts.entry(planned.category.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Category folders the sort would have to create.
    pub fn folders_to_create(&self) -> BTreeSet<&Path> {
        self.moves
            .iter()
            .filter_map(|m| m.destination_path.parent())
            .filter(|folder| !folder.is_dir())
            .collect()
    }
}

/// A file found directly inside the target directory.
struct Candidate {
    path: PathBuf,
    file_name: OsString,
    category: String,
}

/// Sorts the top level of a directory into category folders.
pub struct Sorter<'a> {
    table: &'a CategoryTable,
    filters: &'a CompiledFilters,
}

impl<'a> Sorter<'a> {
    pub fn new(table: &'a CategoryTable, filters: &'a CompiledFilters) -> Self {
        Self { table, filters }
    }

    /// Moves every file directly inside `target_dir` into its category folder.
    ///
    /// Subdirectories, including category folders from earlier sorts, are left
    /// alone. A file that cannot be moved is reported in the summary and the
    /// sort carries on with the next one.
    ///
    /// # Errors
    ///
    /// Returns [`SortError::UnreadableDirectory`] if `target_dir` cannot be
    /// listed; nothing has been moved in that case.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dirsort::config::CompiledFilters;
    /// use dirsort::file_category::CategoryTable;
    /// use dirsort::sorter::Sorter;
    /// use std::path::Path;
    ///
    /// let table = CategoryTable::default();
    /// let filters = CompiledFilters::allow_all();
    /// let (log, summary) = Sorter::new(&table, &filters)
    ///     .sort(Path::new("/home/me/Downloads"))
    ///     .expect("directory should be readable");
    /// println!("moved {} of {} files", log.len(), summary.total_scanned);
    /// ```
    pub fn sort(&self, target_dir: &Path) -> SortResult<(OperationLog, SortSummary)> {
        self.sort_with_progress(target_dir, |_, _, _| {})
    }

    /// Like [`Sorter::sort`], calling `on_progress(processed, total, file)`
    /// after each file.
    pub fn sort_with_progress<F>(
        &self,
        target_dir: &Path,
        mut on_progress: F,
    ) -> SortResult<(OperationLog, SortSummary)>
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut summary = SortSummary::new(target_dir.to_path_buf());
        let candidates = self.scan(target_dir, &mut summary.skipped)?;
        let total = candidates.len();
        summary.total_scanned = total;

        let mut log = OperationLog::new(target_dir.to_path_buf());
        let mut moved_from: HashSet<PathBuf> = HashSet::new();

        for (index, candidate) in candidates.into_iter().enumerate() {
            match self.move_candidate(target_dir, &candidate, &moved_from, &mut log) {
                Ok(record) => {
                    tracing::debug!(
                        "moved {} -> {}",
                        record.source_path.display(),
                        record.destination_path.display()
                    );
                    summary
                        .moved
                        .entry(record.category.clone())
                        .or_default()
                        .push(record.destination_path.clone());
                    moved_from.insert(record.source_path.clone());
                    log.push(record);
                }
                Err(reason) => {
                    tracing::warn!("skipped {}: {}", candidate.path.display(), reason);
                    summary.skipped.push(SkippedFile {
                        path: candidate.path.clone(),
                        reason,
                    });
                }
            }
            on_progress(index + 1, total, &candidate.path);
        }

        summary.created_folders = log.created_folders().to_vec();
        tracing::info!(
            "sorted {}: {} moved, {} skipped, {} folders created",
            target_dir.display(),
            summary.moved_count(),
            summary.skipped.len(),
            summary.created_folders.len()
        );
        Ok((log, summary))
    }

    /// Computes what [`Sorter::sort`] would do without touching the disk.
    ///
    /// Files the sort would skip, including entries that cannot be read, are
    /// listed in [`SortPlan::skipped`] with the same reasons a sort gives.
    pub fn plan(&self, target_dir: &Path) -> SortResult<SortPlan> {
        let mut skipped = Vec::new();
        let candidates = self.scan(target_dir, &mut skipped)?;

        let mut planned: HashSet<PathBuf> = HashSet::new();
        let mut moved_from: HashSet<PathBuf> = HashSet::new();
        let mut moves = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let folder = target_dir.join(&candidate.category);
            if let Err(reason) = inspect_category_folder(&folder, &moved_from) {
                skipped.push(SkippedFile {
                    path: candidate.path,
                    reason,
                });
                continue;
            }

            let destination = unique_destination(&folder, &candidate.file_name, |path| {
                planned.contains(path) || occupied(path)
            });
            planned.insert(destination.clone());
            moved_from.insert(candidate.path.clone());
            moves.push(PlannedMove {
                source_path: candidate.path,
                destination_path: destination,
                category: candidate.category,
            });
        }

        Ok(SortPlan {
            target_dir: target_dir.to_path_buf(),
            moves,
            skipped,
        })
    }

    /// Lists the files to sort, in file-name order.
    ///
    /// Entries that cannot even be read are pushed to `skipped`.
    fn scan(
        &self,
        target_dir: &Path,
        skipped: &mut Vec<SkippedFile>,
    ) -> SortResult<Vec<Candidate>> {
        let entries = fs::read_dir(target_dir).map_err(|e| SortError::UnreadableDirectory {
            path: target_dir.to_path_buf(),
            source: e,
        })?;

        let mut candidates = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    skipped.push(SkippedFile {
                        path: target_dir.to_path_buf(),
                        reason: format!("Could not read directory entry: {}", e),
                    });
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let file_name = entry.file_name();
            let display_name = file_name.to_string_lossy();
            if !self.filters.should_include(&display_name) {
                tracing::trace!("filtered out {}", path.display());
                continue;
            }

            if let Some(target) = relative_link_target(&path) {
                skipped.push(SkippedFile {
                    reason: format!(
                        "Symbolic link with relative target {} would break if moved",
                        target.display()
                    ),
                    path,
                });
                continue;
            }

            let category = self.table.classify(&display_name).to_string();
            candidates.push(Candidate {
                path,
                file_name,
                category,
            });
        }

        candidates.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(candidates)
    }

    fn move_candidate(
        &self,
        target_dir: &Path,
        candidate: &Candidate,
        moved_from: &HashSet<PathBuf>,
        log: &mut OperationLog,
    ) -> Result<MoveRecord, String> {
        let folder = target_dir.join(&candidate.category);
        let created = match inspect_category_folder(&folder, moved_from)? {
            FolderStatus::Present => false,
            FolderStatus::Missing => {
                fs::create_dir(&folder).map_err(|e| {
                    format!("Failed to create folder {}: {}", folder.display(), e)
                })?;
                tracing::debug!("created category folder {}", folder.display());
                true
            }
        };
        if created {
            log.note_created_folder(folder.clone());
        }

        let destination = unique_destination(&folder, &candidate.file_name, occupied);
        if let Err(e) = fs::rename(&candidate.path, &destination) {
            if created && fs::remove_dir(&folder).is_ok() {
                log.forget_created_folder(&folder);
            }
            return Err(format!(
                "Failed to move to {}: {}",
                destination.display(),
                e
            ));
        }

        Ok(MoveRecord {
            source_path: candidate.path.clone(),
            destination_path: destination,
            category: candidate.category.clone(),
        })
    }
}

enum FolderStatus {
    Present,
    Missing,
}

/// Checks whether `folder` can receive sorted files, without touching the disk.
///
/// A path in `moved_from` held a file this sort already moved away; it is
/// refused as a folder so undo can put that file back.
fn inspect_category_folder(
    folder: &Path,
    moved_from: &HashSet<PathBuf>,
) -> Result<FolderStatus, String> {
    if moved_from.contains(folder) {
        return Err(format!(
            "{} held a file moved by this sort and cannot become a folder",
            folder.display()
        ));
    }

    match fs::metadata(folder) {
        Ok(meta) if meta.is_dir() => Ok(FolderStatus::Present),
        Ok(_) => Err(format!("{} exists and is not a folder", folder.display())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FolderStatus::Missing),
        Err(e) => Err(format!("Cannot access folder {}: {}", folder.display(), e)),
    }
}

/// The target of `path` if it is a symbolic link with a relative target.
fn relative_link_target(path: &Path) -> Option<PathBuf> {
    let meta = fs::symlink_metadata(path).ok()?;
    if !meta.file_type().is_symlink() {
        return None;
    }
    fs::read_link(path).ok().filter(|target| target.is_relative())
}

/// True if anything, even a dangling symlink, sits at `path`.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Picks a free path for `file_name` inside `folder`.
///
/// On collision `_1`, `_2`, ... is appended to the file stem, keeping the
/// extension: `report.pdf` becomes `report_1.pdf`.
fn unique_destination<F>(folder: &Path, file_name: &OsStr, mut taken: F) -> PathBuf
where
    F: FnMut(&Path) -> bool,
{
    let candidate = folder.join(file_name);
    if !taken(&candidate) {
        return candidate;
    }

    let as_path = Path::new(file_name);
    let stem = as_path.file_stem().unwrap_or(file_name);
    let extension = as_path.extension();

    let mut counter = 1usize;
    loop {
        let mut name = stem.to_os_string();
        name.push(format!("_{}", counter));
        if let Some(ext) = extension {
            name.push(".");
            name.push(ext);
        }
        let candidate = folder.join(&name);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
