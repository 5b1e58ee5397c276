use clap::Parser;
use dirsort::cli::{Cli, Command, run_command};
use dirsort::output::OutputFormatter;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// File the interactive shell logs to, so log lines never draw over the UI.
const TUI_LOG_FILE: &str = "dirsort.log";

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Opens the TUI log file for appending, or discards log output if it cannot
/// be opened.
fn tui_log_writer(path: &Path) -> (BoxMakeWriter, Option<io::Error>) {
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => (BoxMakeWriter::new(Mutex::new(file)), None),
        Err(e) => (BoxMakeWriter::new(io::sink), Some(e)),
    }
}

fn init_tracing(cli: &Cli) {
    let level = log_level(cli.verbose);

    if let Command::Tui { .. } = cli.command() {
        let path = std::env::temp_dir().join(TUI_LOG_FILE);
        let (writer, error) = tui_log_writer(&path);
        if let Some(e) = error {
            OutputFormatter::warning(&format!(
                "Cannot open log file {}: {}. Logging is disabled.",
                path.display(),
                e
            ));
        }
        tracing_subscriber::fmt()
            .with_writer(writer)
            .with_ansi(false)
            .with_max_level(level.max(Level::INFO))
            .init();
        return;
    }

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run_command(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_level_from_verbosity() {
        assert_eq!(log_level(0), Level::WARN);
        assert_eq!(log_level(1), Level::INFO);
        assert_eq!(log_level(2), Level::DEBUG);
        assert_eq!(log_level(7), Level::TRACE);
    }

    #[test]
    fn test_tui_log_writer_opens_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(TUI_LOG_FILE);

        let (_, error) = tui_log_writer(&path);

        assert!(error.is_none());
        assert!(path.is_file());
    }

    #[test]
    fn test_tui_log_writer_falls_back_when_unwritable() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("missing").join(TUI_LOG_FILE);

        let (_, error) = tui_log_writer(&path);

        assert!(error.is_some());
        assert!(!path.exists());
    }
}
