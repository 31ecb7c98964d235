/*
[INPUT]:  AppState, UI task queue, crossterm input
[OUTPUT]: Ratatui run loop driving ticks, key handling and queued UI tasks
[POS]:    TUI runtime loop
[UPDATE]: When changing tick handling, input polling or headless test mode
*/

use std::time::Duration;

use anyhow::Result;
use logdeck_core::{LoggingPanel, UiQueue};
use ratatui::crossterm::event::{self, Event as CrosstermEvent, KeyEventKind};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::app::AppState;
use super::events::handle_key_event;
use super::terminal::Screen;
use super::ui::draw_ui;

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(200);

enum UiEvent {
    Input(CrosstermEvent),
}

/// Runs the viewer until the user quits.
///
/// With `exit_after_ticks` set the loop draws into an off-screen buffer and
/// returns after that many ticks, so it can run without a terminal.
pub async fn run_tui(
    panel: LoggingPanel,
    mut queue: UiQueue,
    tick_interval: Duration,
    exit_after_ticks: Option<u64>,
) -> Result<()> {
    let mut app = AppState::new(panel);
    let mut screen = match exit_after_ticks {
        Some(_) => Screen::headless()?,
        None => Screen::interactive()?,
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let input_shutdown = CancellationToken::new();
    if screen.is_interactive() {
        let input_shutdown_clone = input_shutdown.clone();
        tokio::task::spawn_blocking(move || {
            while !input_shutdown_clone.is_cancelled() {
                if event::poll(INPUT_POLL_INTERVAL).unwrap_or(false) {
                    if let Ok(event) = event::read() {
                        if event_tx.send(UiEvent::Input(event)).is_err() {
                            break;
                        }
                    }
                }
            }
        });
    } else {
        drop(event_tx);
    }

    let mut tick = tokio::time::interval(tick_interval);
    let mut ticks = 0u64;
    let mut should_quit = false;
    info!(headless = !screen.is_interactive(), "log viewer started");

    while !should_quit {
        tokio::select! {
            _ = tick.tick() => {
                app.on_tick();
                ticks += 1;
                if exit_after_ticks.is_some_and(|limit| ticks >= limit) {
                    debug!(ticks, "tick limit reached");
                    should_quit = true;
                }
            }
            Some(event) = event_rx.recv() => {
                match event {
                    UiEvent::Input(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        should_quit = handle_key_event(&mut app, key);
                    }
                    UiEvent::Input(_) => {}
                }
            }
            Some(task) = queue.recv() => {
                task();
                queue.run_pending();
            }
        }

        screen.draw(|frame| draw_ui(frame, &mut app))?;
    }

    input_shutdown.cancel();
    info!(ticks, "log viewer stopped");
    Ok(())
}
