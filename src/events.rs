//! Shared control signals and the operator keyboard listener.
//!
//! The episode loop and skill session are interrupted through a small set of
//! flags written by exactly one background listener and consumed by exactly
//! one control loop. Discipline: the listener owns setting a flag, the
//! consumer owns clearing it - each flag is cleared (`take_*`) immediately
//! after being observed true. This replaces the ambient mutable dict of the
//! usual recording scripts with an explicit shared state object.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEventKind};
use log::{debug, warn};
use tokio::task::JoinHandle;

/// Shared signal set for interrupting the control loops.
#[derive(Debug, Default)]
pub struct Events {
    exit_early: AtomicBool,
    stop_recording: AtomicBool,
    rerecord_episode: AtomicBool,
    acknowledge: AtomicBool,
}

impl Events {
    /// Create a cleared signal set behind an `Arc` for sharing with the listener.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Request the current episode to terminate immediately.
    pub fn set_exit_early(&self) {
        self.exit_early.store(true, Ordering::SeqCst);
    }

    /// Request the session to stop after committing the current episode.
    pub fn set_stop_recording(&self) {
        self.stop_recording.store(true, Ordering::SeqCst);
    }

    /// Request the session to discard and redo the current episode.
    pub fn set_rerecord_episode(&self) {
        self.rerecord_episode.store(true, Ordering::SeqCst);
    }

    /// Acknowledge a pending escalation alert.
    pub fn set_acknowledge(&self) {
        self.acknowledge.store(true, Ordering::SeqCst);
    }

    /// Observe-and-clear the exit-early flag.
    pub fn take_exit_early(&self) -> bool {
        self.exit_early.swap(false, Ordering::SeqCst)
    }

    /// Observe-and-clear the stop-recording flag.
    pub fn take_stop_recording(&self) -> bool {
        self.stop_recording.swap(false, Ordering::SeqCst)
    }

    /// Observe-and-clear the rerecord flag.
    pub fn take_rerecord_episode(&self) -> bool {
        self.rerecord_episode.swap(false, Ordering::SeqCst)
    }

    /// Observe-and-clear the acknowledge flag.
    pub fn take_acknowledge(&self) -> bool {
        self.acknowledge.swap(false, Ordering::SeqCst)
    }

    /// Clear every flag without observing it.
    ///
    /// Used when entering a fresh episode so stale signals from a previous
    /// phase cannot leak in.
    pub fn clear_all(&self) {
        self.exit_early.store(false, Ordering::SeqCst);
        self.stop_recording.store(false, Ordering::SeqCst);
        self.rerecord_episode.store(false, Ordering::SeqCst);
        self.acknowledge.store(false, Ordering::SeqCst);
    }
}

/// Background keyboard listener for operator control.
///
/// Key bindings:
/// - Right arrow: exit the current episode early
/// - Left arrow: exit early and re-record the current episode
/// - Esc: exit early and stop recording after the current episode
/// - Enter: acknowledge a pending escalation alert
///
/// The listener is the single writer of the shared [`Events`] flags and the
/// single reader of the terminal; every consumer, including the escalation
/// hand-off, observes keys through the flags rather than reading input
/// itself. It polls crossterm in a blocking task so the async control loop
/// is never blocked.
pub struct KeyboardListener {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl KeyboardListener {
    /// Spawn the listener, writing into the given signal set.
    pub fn spawn(events: Arc<Events>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = tokio::task::spawn_blocking(move || {
            while !stop_flag.load(Ordering::SeqCst) {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => match event::read() {
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            match key.code {
                                KeyCode::Right => {
                                    debug!("Operator requested early exit");
                                    events.set_exit_early();
                                }
                                KeyCode::Left => {
                                    debug!("Operator requested episode re-record");
                                    events.set_rerecord_episode();
                                    events.set_exit_early();
                                }
                                KeyCode::Esc => {
                                    debug!("Operator requested stop recording");
                                    events.set_stop_recording();
                                    events.set_exit_early();
                                }
                                KeyCode::Enter => {
                                    debug!("Operator acknowledged");
                                    events.set_acknowledge();
                                }
                                _ => {}
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!("Keyboard listener read error: {}", e);
                            break;
                        }
                    },
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Keyboard listener poll error: {}", e);
                        break;
                    }
                }
            }
        });

        Self { stop, handle }
    }

    /// Signal the listener to stop and wait for it to finish.
    pub async fn shutdown(self) {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.handle.await;
    }
}
