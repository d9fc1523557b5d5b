//! Non-blocking player handle
//!
//! Wraps [`PlaybackManager`] in a spawned control task. Commands are
//! enqueued over a channel and the call returns immediately; engine events
//! are marshaled onto the same task, so every transition runs on one
//! serialized context. Validation happens synchronously against a mirror of
//! the transport state, which is how `OutOfRange`/`InvalidState`/`Busy`
//! come back from the call itself while all observable effects arrive
//! through listener callbacks.

use crate::engine::{engine_events, RenderEngine};
use crate::error::{PlayerError, Result};
use crate::listener::{ListenerSet, PlayerListener};
use crate::manager::{PlaybackManager, PlayerStatus};
use crate::types::{PlaybackItem, PlaybackPhase, PlayerConfig};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::debug;

/// Transport command carried to the control task
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// Replace the queue and begin loading index 0
    InitQueue(Vec<PlaybackItem>),

    /// Toggle playing/paused
    PlayPause,

    /// Release the current session
    Stop,

    /// Move the playhead
    Seek(Duration),

    /// Advance to the next item
    Next,

    /// Step back to the previous item
    Previous,

    /// Jump to a queue position
    SetIndex(usize),

    /// Queue position changed outside the transport
    ExternalIndex(usize),
}

/// Cloneable, non-blocking handle to a playback transport
///
/// Create with [`Player::spawn`] from within a Tokio runtime. Transport
/// methods validate against the state mirror, enqueue the command and
/// return; notifications arrive asynchronously on registered listeners.
/// Dropping the last handle shuts the control task down and releases the
/// engine session.
#[derive(Clone)]
pub struct Player {
    commands: UnboundedSender<PlayerCommand>,
    status: Arc<RwLock<PlayerStatus>>,
    listeners: Arc<Mutex<ListenerSet>>,
}

impl Player {
    /// Spawn the control task around an engine and return the handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(engine: Box<dyn RenderEngine>, config: PlayerConfig) -> Player {
        let (engine_tx, mut engine_rx) = engine_events();
        let mut manager = PlaybackManager::new(engine, config, engine_tx);
        let status = manager.status_handle();
        let listeners = manager.listener_set();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    command = command_rx.recv() => match command {
                        Some(command) => apply(&mut manager, command),
                        // All handles dropped
                        None => break,
                    },
                    Some((session, event)) = engine_rx.recv() => {
                        manager.handle_engine_event(session, event);
                    }
                }
            }
            manager.shutdown();
        });

        Player {
            commands: command_tx,
            status,
            listeners,
        }
    }

    // ===== Transport Commands =====

    /// Replace the queue and begin loading index 0. Always accepted.
    pub fn init_queue(&self, items: Vec<PlaybackItem>) -> Result<()> {
        self.send(PlayerCommand::InitQueue(items))
    }

    /// Toggle between playing and paused.
    ///
    /// Accepted during a load or seek as pending intent.
    pub fn play_pause(&self) -> Result<()> {
        match self.snapshot().phase {
            PlaybackPhase::Playing
            | PlaybackPhase::Paused
            | PlaybackPhase::Loading
            | PlaybackPhase::Ready
            | PlaybackPhase::Seeking => self.send(PlayerCommand::PlayPause),
            phase => Err(PlayerError::InvalidState {
                operation: "play_pause",
                phase,
            }),
        }
    }

    /// Cease playback and release the engine session.
    pub fn stop(&self) -> Result<()> {
        match self.snapshot().phase {
            phase @ (PlaybackPhase::Empty | PlaybackPhase::Stopped) => {
                Err(PlayerError::InvalidState {
                    operation: "stop",
                    phase,
                })
            }
            _ => self.send(PlayerCommand::Stop),
        }
    }

    /// Move the playhead within the current item.
    pub fn seek(&self, position: Duration) -> Result<()> {
        match self.snapshot().phase {
            PlaybackPhase::Playing | PlaybackPhase::Paused => {
                self.send(PlayerCommand::Seek(position))
            }
            PlaybackPhase::Loading | PlaybackPhase::Ready | PlaybackPhase::Seeking => {
                Err(PlayerError::Busy { operation: "seek" })
            }
            phase => Err(PlayerError::InvalidState {
                operation: "seek",
                phase,
            }),
        }
    }

    /// Advance to the next queue item.
    pub fn next(&self) -> Result<()> {
        let status = self.snapshot();
        self.validate_advance(&status, "next")?;
        let index = status.index.ok_or(PlayerError::NoSuchTrack)?;
        if index + 1 >= status.queue_len {
            return Err(PlayerError::NoSuchTrack);
        }
        self.send(PlayerCommand::Next)
    }

    /// Step back to the previous queue item.
    pub fn previous(&self) -> Result<()> {
        let status = self.snapshot();
        self.validate_advance(&status, "previous")?;
        let index = status.index.ok_or(PlayerError::NoSuchTrack)?;
        if index == 0 {
            return Err(PlayerError::NoSuchTrack);
        }
        self.send(PlayerCommand::Previous)
    }

    /// Jump directly to a queue position and load it.
    pub fn set_index(&self, index: usize) -> Result<()> {
        let status = self.snapshot();
        if matches!(
            status.phase,
            PlaybackPhase::Loading | PlaybackPhase::Ready | PlaybackPhase::Seeking
        ) {
            return Err(PlayerError::Busy {
                operation: "set_index",
            });
        }
        if index >= status.queue_len {
            return Err(PlayerError::OutOfRange {
                index,
                len: status.queue_len,
            });
        }
        self.send(PlayerCommand::SetIndex(index))
    }

    /// Report a queue-position change made outside the transport (system
    /// remote control, engine-side auto advance, ...).
    pub fn external_index_changed(&self, index: usize) -> Result<()> {
        let status = self.snapshot();
        if matches!(
            status.phase,
            PlaybackPhase::Empty | PlaybackPhase::Stopped
        ) {
            return Err(PlayerError::InvalidState {
                operation: "external_index_changed",
                phase: status.phase,
            });
        }
        if index >= status.queue_len {
            return Err(PlayerError::OutOfRange {
                index,
                len: status.queue_len,
            });
        }
        self.send(PlayerCommand::ExternalIndex(index))
    }

    // ===== Listeners =====

    /// Register a listener. Idempotent.
    pub fn add_listener(&self, listener: Arc<dyn PlayerListener>) -> bool {
        self.listeners.lock().unwrap().add(listener)
    }

    /// Unregister a listener. Safe from within a callback.
    pub fn remove_listener(&self, listener: &Arc<dyn PlayerListener>) -> bool {
        self.listeners.lock().unwrap().remove(listener)
    }

    // ===== State Accessors =====

    /// Current lifecycle phase (last published)
    pub fn phase(&self) -> PlaybackPhase {
        self.snapshot().phase
    }

    /// Queue cursor, unset for an empty queue
    pub fn current_index(&self) -> Option<usize> {
        self.snapshot().index
    }

    /// Queue length
    pub fn queue_len(&self) -> usize {
        self.snapshot().queue_len
    }

    // ===== Internals =====

    fn snapshot(&self) -> PlayerStatus {
        *self.status.read().unwrap()
    }

    fn validate_advance(&self, status: &PlayerStatus, operation: &'static str) -> Result<()> {
        match status.phase {
            PlaybackPhase::Playing
            | PlaybackPhase::Paused
            | PlaybackPhase::Completed
            | PlaybackPhase::Failed => Ok(()),
            PlaybackPhase::Loading | PlaybackPhase::Ready | PlaybackPhase::Seeking => {
                Err(PlayerError::Busy { operation })
            }
            phase => Err(PlayerError::InvalidState { operation, phase }),
        }
    }

    fn send(&self, command: PlayerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlayerError::Closed)
    }
}

/// Apply one command on the control task.
///
/// Commands were validated against the state mirror when enqueued; the
/// manager re-validates authoritatively, and anything that went stale in
/// between is dropped here with a trace.
fn apply(manager: &mut PlaybackManager, command: PlayerCommand) {
    let result = match command {
        PlayerCommand::InitQueue(items) => {
            manager.init_queue(items);
            Ok(())
        }
        PlayerCommand::PlayPause => manager.play_pause(),
        PlayerCommand::Stop => manager.stop(),
        PlayerCommand::Seek(position) => manager.seek(position),
        PlayerCommand::Next => manager.next(),
        PlayerCommand::Previous => manager.previous(),
        PlayerCommand::SetIndex(index) => manager.set_index(index),
        PlayerCommand::ExternalIndex(index) => manager.external_index_changed(index),
    };
    if let Err(e) = result {
        debug!("command dropped after revalidation: {}", e);
    }
}
