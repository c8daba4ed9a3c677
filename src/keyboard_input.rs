use crate::error::Result;
use crate::events::{Actor, StrokeKind};
use crate::pipeline::PipelineOrchestrator;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Map a key to the stroke it simulates; lower case is player A, upper case B
pub fn stroke_for_key(key: char) -> Option<(StrokeKind, Actor)> {
    let actor = if key.is_ascii_uppercase() {
        Actor::B
    } else {
        Actor::A
    };
    let kind = match key.to_ascii_lowercase() {
        's' => StrokeKind::Serve,
        'f' => StrokeKind::Forehand,
        'b' => StrokeKind::Backhand,
        'v' => StrokeKind::Volley,
        'm' => StrokeKind::Smash,
        _ => return None,
    };
    Some((kind, actor))
}

/// Keyboard handler that injects simulated strokes in test mode
pub struct KeyboardInputHandler {
    pipeline: Arc<PipelineOrchestrator>,
    shutdown: CancellationToken,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// `shutdown` is cancelled when the user presses `q` or Esc
    pub fn new(pipeline: Arc<PipelineOrchestrator>, shutdown: CancellationToken) -> Self {
        Self {
            pipeline,
            shutdown,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input.
    ///
    /// Fails with an IO error when the terminal cannot enter raw mode.
    pub async fn start(&self) -> Result<()> {
        enable_raw_mode().map_err(|e| {
            error!("Failed to enable raw mode for keyboard input: {}", e);
            e
        })?;

        info!("Keyboard simulation active: s/f/b/v/m for player A, S/F/B/V/M for player B, q to quit");

        let pipeline = Arc::clone(&self.pipeline);
        let shutdown = self.shutdown.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        match key_event.code {
                            KeyCode::Char('q') | KeyCode::Esc => {
                                info!("Quit key pressed - requesting shutdown");
                                shutdown.cancel();
                                break;
                            }
                            KeyCode::Char(c) => match stroke_for_key(c) {
                                Some((kind, actor)) => {
                                    if !pipeline.simulate(kind, actor) {
                                        warn!("Simulation ignored: pipeline not in test mode");
                                    }
                                }
                                None => debug!("Unbound key: {:?}", c),
                            },
                            other => debug!("Key pressed: {:?}", other),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the polling loop notice and restore the terminal
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}
