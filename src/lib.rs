//! dirsort - sort the files of a directory into category folders
//!
//! This library classifies files by extension, moves them into per-category
//! subfolders of the directory being sorted, records every move so the most
//! recent sort can be undone, and removes category folders an undo leaves empty.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod output;
pub mod session;
pub mod sorter;
pub mod tui;
pub mod undo;

pub use config::{CompiledFilters, ConfigError, SorterConfig};
pub use file_category::{CategoryTable, OTHERS_CATEGORY, extension_of};
pub use session::{Session, SessionState};
pub use sorter::{MoveRecord, OperationLog, SortError, SortPlan, SortSummary, Sorter};
pub use undo::{FailedUndo, FailedUndoReason, UndoSummary, undo};
