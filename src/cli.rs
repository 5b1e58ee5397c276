//! Command-line interface for dirsort.
//!
//! Argument parsing with clap and the handlers behind each subcommand. The
//! interactive shell is the default; `sort` and `plan` are one-shot commands
//! for scripts.

use crate::config::SorterConfig;
use crate::output::OutputFormatter;
use crate::session::Session;
use crate::tui;
use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "dirsort",
    about = "Sort the files of a directory into category folders by extension",
    version,
    long_about = "dirsort moves every file at the top level of a directory into a\n\
                  subfolder named after its category (Images, Documents, Audio, ...),\n\
                  decided by the file extension. Folders are only created when needed.\n\n\
                  The interactive shell can undo the most recent sort and removes the\n\
                  category folders the undo leaves empty."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Browse, sort and undo interactively (default)
    Tui {
        /// Directory to start browsing in (defaults to the current directory)
        dir: Option<PathBuf>,
    },

    /// Sort a directory once and print a summary
    Sort {
        dir: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show what a sort would do without moving anything
    Plan {
        dir: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// The subcommand to run, falling back to the interactive shell.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Tui { dir: None })
    }
}

/// Loads configuration and builds a session from it.
pub fn load_session(config_path: Option<&Path>) -> anyhow::Result<Session> {
    let config = SorterConfig::load(config_path).context("Error loading configuration")?;
    let table = config
        .category_table()
        .context("Error in category overrides")?;
    let filters = config
        .compile_filters()
        .context("Error compiling filters")?;
    Ok(Session::new(table, filters))
}

/// Runs the command the user asked for.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let session = load_session(cli.config.as_deref())?;

    match cli.command() {
        Command::Tui { dir } => {
            let start_dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir().context("Cannot determine current directory")?,
            };
            tui::run(session, start_dir)
        }
        Command::Sort { dir, json } => sort_directory(session, &dir, json),
        Command::Plan { dir, json } => plan_directory(&session, &dir, json),
    }
}

fn sort_directory(mut session: Session, dir: &Path, json: bool) -> anyhow::Result<()> {
    if !json {
        OutputFormatter::info(&format!("Sorting contents of: {}", dir.display()));
    }

    let progress = (!json).then(|| OutputFormatter::create_progress_bar(0));
    let summary = session.sort_with_progress(dir, |done, total, path| {
        if let Some(pb) = &progress {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
            if let Some(name) = path.file_name() {
                pb.set_message(name.to_string_lossy().to_string());
            }
        }
    });
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }
    let summary = summary?;

    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    if summary.total_scanned == 0 {
        OutputFormatter::info("No files found to sort.");
        return Ok(());
    }

    OutputFormatter::sort_summary(summary);
    if summary.is_complete_success() {
        OutputFormatter::success("Sorting complete.");
    } else {
        OutputFormatter::warning("Sorting finished, some files were skipped.");
    }
    OutputFormatter::info("Undo is only available inside the interactive shell (dirsort tui).");
    Ok(())
}

fn plan_directory(session: &Session, dir: &Path, json: bool) -> anyhow::Result<()> {
    let plan = session.plan(dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    OutputFormatter::info(&format!(
        "DRY RUN: Analyzing contents of: {}",
        dir.display()
    ));
    OutputFormatter::plan(&plan);
    if !plan.moves.is_empty() {
        OutputFormatter::success("Dry run complete. No files were modified.");
    }
    Ok(())
}
