pub mod render;
pub mod state;

use crate::pipeline::{ForecastHorizon, RunParams};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use state::{AppState, Controls};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Commands the TUI can send back to the engine.
#[derive(Debug, Clone)]
pub enum TuiCommand {
    Generate(RunParams),
    Quit,
}

/// What a key press means for the sidebar.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyAction {
    None,
    Trigger,
    Quit,
}

/// Apply one key press to the sidebar controls.
pub fn handle_key(controls: &mut Controls, key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }
    match key.code {
        KeyCode::Esc => KeyAction::Quit,
        KeyCode::Enter => KeyAction::Trigger,
        KeyCode::Tab | KeyCode::Right | KeyCode::Down => {
            controls.horizon = controls.horizon.next();
            KeyAction::None
        }
        KeyCode::BackTab | KeyCode::Left | KeyCode::Up => {
            controls.horizon = controls.horizon.prev();
            KeyAction::None
        }
        KeyCode::Backspace => {
            controls.topic.pop();
            KeyAction::None
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            controls.topic.push(c);
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(
    state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
    default_topic: String,
    default_horizon: ForecastHorizon,
) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx, default_topic, default_horizon).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
    default_topic: String,
    default_horizon: ForecastHorizon,
) -> Result<()> {
    let mut controls = Controls::new(&default_topic, default_horizon);
    let mut spinner_frame: u8 = 0;

    loop {
        let state = state_rx.borrow().clone();
        terminal.draw(|f| render::draw(f, &state, &controls, spinner_frame))?;
        spinner_frame = spinner_frame.wrapping_add(1);

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(&mut controls, key) {
                    KeyAction::Quit => {
                        let _ = cmd_tx.send(TuiCommand::Quit).await;
                        return Ok(());
                    }
                    KeyAction::Trigger => {
                        // one run in flight at a time
                        let current = state_rx.borrow().clone();
                        if !controls.can_trigger(&current) {
                            continue;
                        }
                        let params = RunParams::new(&controls.topic, &default_topic, controls.horizon);
                        controls.topic = params.topic.clone();
                        controls.mark_requested(&current);
                        let _ = cmd_tx.send(TuiCommand::Generate(params)).await;
                    }
                    KeyAction::None => {}
                }
            }
        }
    }
}
