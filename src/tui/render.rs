use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use super::app::{App, Pane, RightView};

use crate::session::SessionState;

const KEYS: &str =
    "Keys: s sort | u undo | r refresh | v results | d drives | Enter open | Backspace up | q quit";

pub fn draw_app(frame: &mut Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(4)])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[0]);

    match app.pane() {
        Pane::Browser => draw_browser(frame, app, columns[0]),
        Pane::Roots => draw_roots(frame, app, columns[0]),
    }

    match app.view() {
        RightView::Actions => draw_actions(frame, app, columns[1]),
        RightView::Results => draw_results(frame, app, columns[1]),
    }

    let status = Paragraph::new(vec![Line::from(app.status()), Line::from(KEYS)])
        .wrap(Wrap { trim: true })
        .block(Block::default().title("Status").borders(Borders::ALL));
    frame.render_widget(status, chunks[1]);
}

fn highlight() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn draw_browser(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items: Vec<ListItem> = if app.rows().is_empty() {
        vec![ListItem::new("(no subdirectories)")]
    } else {
        app.rows()
            .iter()
            .map(|row| ListItem::new(row.label.as_str()))
            .collect()
    };

    let title = app.current_dir().display().to_string();
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(highlight())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.rows().is_empty() {
        state.select(Some(app.selected()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_roots(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .roots()
        .iter()
        .map(|root| ListItem::new(root.display().to_string()))
        .collect();

    let list = List::new(items)
        .block(Block::default().title("Drives").borders(Borders::ALL))
        .highlight_style(highlight())
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.roots().is_empty() {
        state.select(Some(app.root_selected()));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_actions(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let session = app.session();
    let undo_line = match session.state() {
        SessionState::Sorted => match session.log() {
            Some(log) => format!(
                "[u] Undo last sort ({} files, {})",
                log.len(),
                log.started_at().format("%H:%M:%S")
            ),
            None => String::from("[u] Undo last sort"),
        },
        SessionState::Idle => String::from("[u] Undo (nothing to undo)"),
    };

    let known = format!("{} categories known", session.table().categories().len());
    let lines = vec![
        Line::from(format!("Selected: {}", app.current_dir().display())),
        Line::from(""),
        Line::from("[s] Sort files"),
        Line::from(undo_line),
        Line::from("[r] Refresh"),
        Line::from("[v] Show results"),
        Line::from(""),
        Line::from(known),
    ];

    let actions = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Actions").borders(Borders::ALL));
    frame.render_widget(actions, area);
}

fn draw_results(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let lines: Vec<Line> = app.result_lines().into_iter().map(Line::from).collect();
    let results = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Results").borders(Borders::ALL));
    frame.render_widget(results, area);
}
