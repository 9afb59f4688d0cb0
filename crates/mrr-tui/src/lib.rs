// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod controller;
mod render;

pub use controller::{Controller, FIXED_ROWS, LoopControl, StatusLine};
pub use render::{NOTE_COLUMN, render, status_bar_text, truncate_note};

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::info;
use mrr_app::{Entry, EntryId, EntryUpdate, NewEntry};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::io::{self, Stdout};

/// Data access the interactive list needs. Calls are synchronous and one at
/// a time.
pub trait RecordStore {
    /// Every entry, newest first by date then id.
    fn list_all(&mut self) -> Result<Vec<Entry>>;
    fn insert(&mut self, entry: &NewEntry) -> Result<EntryId>;
    /// Fails when `id` does not exist.
    fn update(&mut self, id: EntryId, update: &EntryUpdate) -> Result<()>;
    /// Fails when `id` does not exist.
    fn delete(&mut self, id: EntryId) -> Result<()>;
}

/// Blocking source of terminal events.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Event>;
}

#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn next_event(&mut self) -> Result<Event> {
        event::read().context("read terminal event")
    }
}

/// Raw mode plus alternate screen for as long as the value lives.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub fn acquire() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        let mut stdout = io::stdout();
        if let Err(error) = execute!(stdout, EnterAlternateScreen) {
            teardown_terminal();
            return Err(error).context("enter alternate screen");
        }

        let mut terminal = match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => terminal,
            Err(error) => {
                teardown_terminal();
                return Err(error).context("create terminal");
            }
        };
        if let Err(error) = terminal.clear() {
            teardown_terminal();
            return Err(error).context("clear terminal");
        }

        info!("terminal session acquired");
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = self.terminal.show_cursor();
        teardown_terminal();
        info!("terminal session released");
    }
}

fn teardown_terminal() {
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);
}

/// Loads the entries, then draws and dispatches one event at a time until a
/// quit key arrives.
pub fn run_loop<B, E, S>(
    terminal: &mut Terminal<B>,
    events: &mut E,
    controller: &mut Controller,
    store: &mut S,
) -> Result<()>
where
    B: Backend,
    E: EventSource,
    S: RecordStore,
{
    let size = terminal.size().context("read terminal size")?;
    controller.handle_resize(size.width, size.height);
    controller.refresh(store);

    loop {
        terminal
            .draw(|frame| render(frame, controller))
            .context("draw frame")?;

        match events.next_event()? {
            Event::Key(key) => {
                if controller.handle_key(store, key) == LoopControl::Quit {
                    return Ok(());
                }
            }
            Event::Resize(width, height) => controller.handle_resize(width, height),
            _ => {}
        }
    }
}

/// Takes over the terminal and runs the interactive list against `store`.
pub fn run_app<S: RecordStore>(store: &mut S) -> Result<()> {
    let mut session = TerminalSession::acquire()?;
    let mut controller = Controller::new();
    run_loop(
        session.terminal_mut(),
        &mut CrosstermEvents,
        &mut controller,
        store,
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::{FakeStore, fixed_today, key};
    use super::{Controller, EventSource, run_loop};
    use anyhow::{Result, anyhow};
    use crossterm::event::{Event, KeyCode};
    use mrr_app::Mode;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::collections::VecDeque;

    struct ScriptedEvents(VecDeque<Event>);

    impl ScriptedEvents {
        fn keys(codes: impl IntoIterator<Item = KeyCode>) -> Self {
            Self(codes.into_iter().map(|code| Event::Key(key(code))).collect())
        }
    }

    impl EventSource for ScriptedEvents {
        fn next_event(&mut self) -> Result<Event> {
            self.0
                .pop_front()
                .ok_or_else(|| anyhow!("event script exhausted"))
        }
    }

    #[test]
    fn loop_loads_entries_and_stops_on_quit() -> Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(80, 20))?;
        let mut store = FakeStore::with_entries(4);
        let mut controller = Controller::with_clock(fixed_today);
        let mut events = ScriptedEvents::keys([KeyCode::Char('j'), KeyCode::Char('q')]);

        run_loop(&mut terminal, &mut events, &mut controller, &mut store)?;

        assert_eq!(controller.entries().len(), 4);
        assert_eq!(controller.selected(), Some(1));
        assert_eq!(controller.size(), (80, 20));
        assert!(events.0.is_empty());
        Ok(())
    }

    #[test]
    fn loop_applies_resize_events() -> Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(80, 40))?;
        let mut store = FakeStore::with_entries(30);
        let mut controller = Controller::with_clock(fixed_today);
        let mut events = ScriptedEvents::keys([KeyCode::Char('G')]);
        events.0.push_back(Event::Resize(80, 9));
        events.0.push_back(Event::Resize(60, 2));
        events.0.push_back(Event::Key(key(KeyCode::Char('q'))));

        run_loop(&mut terminal, &mut events, &mut controller, &mut store)?;

        assert_eq!(controller.size(), (60, 2));
        assert_eq!(controller.visible_rows(), 1);
        assert_eq!(controller.offset(), 29);
        Ok(())
    }

    #[test]
    fn loop_survives_store_errors() -> Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(80, 20))?;
        let mut store = FakeStore::with_entries(2);
        store.fail_writes = true;
        let mut controller = Controller::with_clock(fixed_today);
        let mut events = ScriptedEvents::keys([
            KeyCode::Char('d'),
            KeyCode::Char('y'),
            KeyCode::Enter,
            KeyCode::Char('q'),
        ]);

        run_loop(&mut terminal, &mut events, &mut controller, &mut store)?;

        assert_eq!(controller.mode(), Mode::Normal);
        assert_eq!(store.entries.len(), 2);
        Ok(())
    }

    #[test]
    fn event_source_errors_end_the_loop() -> Result<()> {
        let mut terminal = Terminal::new(TestBackend::new(80, 20))?;
        let mut store = FakeStore::with_entries(1);
        let mut controller = Controller::with_clock(fixed_today);
        let mut events = ScriptedEvents::keys([]);

        let error = run_loop(&mut terminal, &mut events, &mut controller, &mut store)
            .expect_err("exhausted script should fail");
        assert!(error.to_string().contains("exhausted"));
        Ok(())
    }
}
