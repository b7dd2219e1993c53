//! The interactive search session.
//!
//! Keystrokes are read from the terminal and sent as raw queries through
//! the debouncer into the [SearchController]. The controller runs on the same
//! task as the input loop; every model it publishes is redrawn.

mod render;

use std::io::{self, Write};

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{PrintStyledContent, Stylize};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedSender};
use reelscout_core::telemetry::TelemetryRecord;
use reelscout_core::{SearchController, SearchModel, TelemetrySink, debounced};
use tokio::sync::watch;
use tracing::{debug, warn};

use self::render::{Frame, LineStyle, View, render};
use crate::config::Config;
use crate::utils::init::{init_catalog_client, init_telemetry_sink};
use crate::utils::message;

/// How many popular searches are shown above the results
const TRENDING_LIMIT: usize = 5;

pub(super) async fn run(config: &Config) -> Result<()> {
    let client = init_catalog_client(config)?;
    let sink = init_telemetry_sink(config)?;

    if !config.has_catalog_token() {
        message::warning(
            "No catalog token configured, searches will likely be rejected. \
             Set 'catalog_token' in reelscout.toml or $REELSCOUT_CATALOG_TOKEN.",
        );
    }

    let trending = match sink.trending(TRENDING_LIMIT).await {
        Ok(trending) => trending,
        Err(err) => {
            warn!(error = %err, "could not load trending searches");
            vec![]
        },
    };

    let controller = SearchController::new(client, sink);
    let updates = controller.subscribe();
    let (raw_queries, raw_inputs) = mpsc::unbounded();
    let queries = debounced(raw_inputs, config.debounce(), "");

    let mut terminal = RawTerminal::enter()?;

    // Leaving the session drops in-flight requests.
    tokio::select! {
        model = controller.run(queries) => {
            debug!(query = model.query(), "search controller stopped");
            Ok(())
        },
        result = interact(&mut terminal.out, raw_queries, updates, &trending) => result,
    }
}

/// Raw mode on the alternate screen, restored on drop
struct RawTerminal {
    out: io::Stdout,
}

impl RawTerminal {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Could not enable raw terminal mode")?;
        let mut terminal = RawTerminal { out: io::stdout() };
        execute!(terminal.out, EnterAlternateScreen)
            .context("Could not switch to the alternate screen")?;
        Ok(terminal)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if let Err(err) = execute!(self.out, LeaveAlternateScreen, cursor::Show) {
            warn!(error = %err, "could not leave the alternate screen");
        }
        if let Err(err) = terminal::disable_raw_mode() {
            warn!(error = %err, "could not disable raw terminal mode");
        }
    }
}

async fn interact(
    out: &mut impl Write,
    raw_queries: UnboundedSender<String>,
    mut updates: watch::Receiver<SearchModel>,
    trending: &[TelemetryRecord],
) -> Result<()> {
    let mut events = EventStream::new();
    let mut input = String::new();

    loop {
        let model = updates.borrow_and_update().clone();
        let (width, height) = terminal::size().context("Could not read terminal size")?;
        let view = View {
            input: &input,
            model: &model,
            trending,
        };
        draw(out, &render(&view, width, height))?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    return Ok(());
                };
                let event = event.context("Could not read terminal event")?;
                match apply_event(&mut input, &event) {
                    InputAction::Quit => return Ok(()),
                    InputAction::Edited => raw_queries
                        .unbounded_send(input.clone())
                        .context("Search controller stopped")?,
                    InputAction::Unchanged => {},
                }
            },
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputAction {
    Quit,
    Edited,
    Unchanged,
}

/// Apply a terminal event to the query being typed.
fn apply_event(input: &mut String, event: &Event) -> InputAction {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        ..
    }) = event
    else {
        return InputAction::Unchanged;
    };
    let control = modifiers.contains(KeyModifiers::CONTROL);

    match code {
        KeyCode::Esc => InputAction::Quit,
        KeyCode::Char('c') if control => InputAction::Quit,
        KeyCode::Char('u') if control && !input.is_empty() => {
            input.clear();
            InputAction::Edited
        },
        KeyCode::Char(_) if control || modifiers.contains(KeyModifiers::ALT) => {
            InputAction::Unchanged
        },
        KeyCode::Char(c) => {
            input.push(*c);
            InputAction::Edited
        },
        KeyCode::Backspace => match input.pop() {
            Some(_) => InputAction::Edited,
            None => InputAction::Unchanged,
        },
        _ => InputAction::Unchanged,
    }
}

fn draw(out: &mut impl Write, frame: &Frame) -> Result<()> {
    queue!(out, cursor::MoveTo(0, 0), Clear(ClearType::All))?;
    for (row, line) in frame.lines.iter().enumerate() {
        let text = line.text.as_str();
        let styled = match line.style {
            LineStyle::Plain => text.stylize(),
            LineStyle::Heading => text.bold(),
            LineStyle::Dim => text.dim(),
            LineStyle::Error => text.red(),
        };
        queue!(out, cursor::MoveTo(0, row as u16), PrintStyledContent(styled))?;
    }
    let (column, row) = frame.cursor;
    queue!(out, cursor::MoveTo(column, row))?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::commands::search::render::Line;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn typed(keys: &[Event]) -> (String, Vec<InputAction>) {
        let mut input = String::new();
        let actions = keys
            .iter()
            .map(|event| apply_event(&mut input, event))
            .collect();
        (input, actions)
    }

    #[test]
    fn characters_are_appended() {
        let (input, actions) = typed(&[
            key(KeyCode::Char('b'), KeyModifiers::NONE),
            key(KeyCode::Char('A'), KeyModifiers::SHIFT),
            key(KeyCode::Char('t'), KeyModifiers::NONE),
        ]);
        assert_eq!(input, "bAt");
        assert_eq!(actions, vec![InputAction::Edited; 3]);
    }

    #[test]
    fn backspace_removes_last_character() {
        let (input, actions) = typed(&[
            key(KeyCode::Char('a'), KeyModifiers::NONE),
            key(KeyCode::Backspace, KeyModifiers::NONE),
            key(KeyCode::Backspace, KeyModifiers::NONE),
        ]);
        assert_eq!(input, "");
        assert_eq!(actions, vec![
            InputAction::Edited,
            InputAction::Edited,
            InputAction::Unchanged
        ]);
    }

    #[test]
    fn ctrl_u_clears_the_query() {
        let (input, actions) = typed(&[
            key(KeyCode::Char('d'), KeyModifiers::NONE),
            key(KeyCode::Char('u'), KeyModifiers::CONTROL),
            key(KeyCode::Char('u'), KeyModifiers::CONTROL),
        ]);
        assert_eq!(input, "");
        assert_eq!(&actions[1..], &[InputAction::Edited, InputAction::Unchanged]);
    }

    #[test]
    fn escape_and_ctrl_c_quit() {
        let mut input = String::from("dune");
        assert_eq!(
            apply_event(&mut input, &key(KeyCode::Esc, KeyModifiers::NONE)),
            InputAction::Quit
        );
        assert_eq!(
            apply_event(
                &mut input,
                &key(KeyCode::Char('c'), KeyModifiers::CONTROL)
            ),
            InputAction::Quit
        );
        assert_eq!(input, "dune");
    }

    #[test]
    fn releases_and_other_events_are_ignored() {
        let mut input = String::new();
        let release = Event::Key(KeyEvent::new_with_kind_and_state(
            KeyCode::Char('x'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        ));

        assert_eq!(apply_event(&mut input, &release), InputAction::Unchanged);
        assert_eq!(
            apply_event(&mut input, &Event::Resize(80, 24)),
            InputAction::Unchanged
        );
        assert_eq!(
            apply_event(&mut input, &key(KeyCode::Char('x'), KeyModifiers::ALT)),
            InputAction::Unchanged
        );
        assert_eq!(input, "");
    }

    #[test]
    fn draw_writes_every_line_and_places_cursor() {
        let frame = Frame {
            lines: vec![
                Line {
                    text: "All Movies".to_string(),
                    style: LineStyle::Heading,
                },
                Line {
                    text: "  The Batman".to_string(),
                    style: LineStyle::Plain,
                },
            ],
            cursor: (8, 2),
        };
        let mut out = Vec::new();

        draw(&mut out, &frame).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("All Movies"));
        assert!(out.contains("  The Batman"));
        // the cursor is moved to the input last; terminal rows are 1-based
        assert!(out.ends_with("\u{1b}[3;9H"));
    }
}
