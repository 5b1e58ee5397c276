//! Output formatting and styling for the command line.
//!
//! Colored status lines, the sort progress bar and summary tables live here so
//! the command handlers only decide *what* to print.

use crate::sorter::{SkippedFile, SortPlan, SortSummary};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` files.
    ///
    /// ```no_run
    /// use dirsort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("done");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb
    }

    /// Prints a table of file counts by category with a total row.
    pub fn summary_table(
        title: &str,
        category_counts: &BTreeMap<&str, usize>,
        total_files: usize,
    ) {
        Self::header(title);

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!("{:<width$} | {}", "Category".bold(), "Files".bold());
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }

    /// Prints the outcome of a sort: the per-category table and every skipped
    /// file with its reason.
    pub fn sort_summary(summary: &SortSummary) {
        let counts = summary.moved_per_category();
        Self::summary_table("SUMMARY", &counts, summary.moved_count());

        println!(
            "Scanned {} {} in {}",
            summary.total_scanned,
            plural(summary.total_scanned),
            summary.target_dir.display()
        );

        if !summary.created_folders.is_empty() {
            let names: Vec<String> = summary
                .created_folders
                .iter()
                .map(|folder| last_component(folder))
                .collect();
            println!("Created folders: {}", names.join(", "));
        }

        Self::skipped(&summary.skipped, "skipped");
    }

    fn skipped(skipped: &[SkippedFile], verb: &str) {
        if skipped.is_empty() {
            return;
        }

        let message = format!("{} {} {}:", skipped.len(), plural(skipped.len()), verb);
        Self::warning(&message);
        for file in skipped {
            eprintln!("    - {}: {}", file.path.display(), file.reason);
        }
    }

    /// Prints what a sort would do.
    pub fn plan(plan: &SortPlan) {
        Self::skipped(&plan.skipped, "would be skipped");

        if plan.moves.is_empty() {
            Self::info("No files found to sort.");
            return;
        }

        Self::header("Files would be sorted as follows:");
        for planned in &plan.moves {
            let name = planned
                .source_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            println!(" - {}", name);
            println!(
                "   → would move to {}/{}",
                planned.category,
                last_component(&planned.destination_path)
            );
        }

        let counts = plan.counts_per_category();
        Self::summary_table("DRY RUN SUMMARY", &counts, plan.moves.len());

        let folders = plan.folders_to_create();
        if !folders.is_empty() {
            let names: Vec<String> = folders.iter().map(|f| last_component(f)).collect();
            println!("Folders to create: {}", names.join(", "));
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn last_component(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
