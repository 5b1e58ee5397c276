//! Terminal front end.
//!
//! A directory browser on the left and actions or sort results on the right.
//! Sorting and undo run on the event-loop thread between two draws.

pub mod app;
pub mod render;

use std::io;
use std::panic;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyEventKind};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};

use crate::session::Session;

pub use app::App;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Runs the interactive UI until the user quits.
pub fn run(session: Session, start_dir: PathBuf) -> anyhow::Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;

    let mut app = App::new(session, start_dir);
    let result = run_app(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    while !app.should_quit() {
        terminal.draw(|frame| render::draw_app(frame, app))?;

        if let Some(action) = app.take_pending() {
            tracing::debug!("running {:?}", action);
            app.run_pending(action);
            continue;
        }

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key);
        }
    }
    Ok(())
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Leaves the alternate screen before the default hook prints the panic.
fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
