//! Playback state machine - core orchestration
//!
//! Owns the queue, the render engine session and the listener registry,
//! and converts transport commands plus engine events into phase
//! transitions and listener notifications.
//!
//! `PlaybackManager` is strictly single-writer: it is `&mut self` all the
//! way down and performs no locking of its own state. Drive it from one
//! context only - the [`crate::Player`] control task does exactly that, and
//! hosts with their own serialized loop can drive it directly.

use crate::engine::{
    EngineEvent, EngineEventSender, EngineEventSink, RenderEngine, SessionId,
};
use crate::error::{PlayerError, Result};
use crate::listener::{ListenerSet, PlayerListener};
use crate::queue::{Direction, Queue};
use crate::types::{PlaybackItem, PlaybackPhase, PlayerConfig};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Read-only mirror of the transport state
///
/// Published after every transition; the [`crate::Player`] handle validates
/// commands against it without touching the control context.
#[derive(Debug, Clone, Copy)]
pub struct PlayerStatus {
    /// Current lifecycle phase
    pub phase: PlaybackPhase,

    /// Queue cursor, unset for an empty queue
    pub index: Option<usize>,

    /// Queue length
    pub queue_len: usize,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Empty,
            index: None,
            queue_len: 0,
        }
    }
}

/// What kind of load is in flight, deciding which completion notification
/// to emit once the engine reports ready.
#[derive(Debug, Clone, Copy)]
enum LoadKind {
    /// Queue replacement, direct jump, or an externally switched item
    Fresh,

    /// API-driven next/previous navigation
    Advance { direction: Direction, index: usize },
}

/// Transient binding between the current item and the engine
struct Session {
    id: SessionId,
    position: Duration,
    duration: Duration,
    buffering: u8,

    /// Whether the user wants audio rolling once the pending load or seek
    /// resolves. Toggled by `play_pause` during Loading/Seeking so intent
    /// is never lost to an async gap.
    desired_playing: bool,

    /// Phase to compare against when a seek completes
    resume_playing: bool,

    /// Pending load; consumed when the engine reports ready
    load: Option<LoadKind>,
}

impl Session {
    fn new(id: SessionId, desired_playing: bool, load: LoadKind) -> Self {
        Self {
            id,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            buffering: 0,
            desired_playing,
            resume_playing: desired_playing,
            load: Some(load),
        }
    }
}

/// Playback state machine
///
/// Converts commands and engine events into phase transitions, engine
/// commands and listener notifications. Validation errors never change
/// state; engine failures fold into the `Failed` phase and exactly one
/// `on_failed_prepare`.
pub struct PlaybackManager {
    queue: Queue,
    engine: Box<dyn RenderEngine>,
    listeners: Arc<Mutex<ListenerSet>>,
    config: PlayerConfig,
    phase: PlaybackPhase,
    session: Option<Session>,
    next_session: u64,
    engine_events: EngineEventSink,
    status: Arc<RwLock<PlayerStatus>>,
}

impl PlaybackManager {
    /// Create a new state machine around an engine.
    ///
    /// `engine_events` is the sink half of [`crate::engine_events`]; feed
    /// everything arriving on the stream half into
    /// [`handle_engine_event`](Self::handle_engine_event) from the same
    /// context that issues commands.
    pub fn new(
        engine: Box<dyn RenderEngine>,
        config: PlayerConfig,
        engine_events: EngineEventSink,
    ) -> Self {
        Self {
            queue: Queue::new(),
            engine,
            listeners: Arc::new(Mutex::new(ListenerSet::new())),
            config,
            phase: PlaybackPhase::Empty,
            session: None,
            next_session: 0,
            engine_events,
            status: Arc::new(RwLock::new(PlayerStatus::default())),
        }
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

    /// Shared handle to the listener registry
    pub fn listener_set(&self) -> Arc<Mutex<ListenerSet>> {
        Arc::clone(&self.listeners)
    }

    // ===== Transport Commands =====

    /// Replace the queue and begin loading index 0.
    ///
    /// Always succeeds. Any active session is torn down silently; an empty
    /// replacement leaves the transport in `Empty`.
    pub fn init_queue(&mut self, items: Vec<PlaybackItem>) {
        if self.session.take().is_some() {
            self.engine.stop();
        }
        let len = self.queue.reset(items);
        if len == 0 {
            self.phase = PlaybackPhase::Empty;
            self.debug_message("queue cleared");
            self.publish();
            return;
        }
        self.debug_message(&format!("queue replaced, {} items", len));
        let desired = self.config.autoplay;
        self.begin_load(LoadKind::Fresh, desired);
    }

    /// Toggle between playing and paused.
    ///
    /// During `Loading`/`Seeking` the toggle is recorded as pending intent
    /// and applied once the async operation resolves.
    pub fn play_pause(&mut self) -> Result<()> {
        match self.phase {
            PlaybackPhase::Playing => {
                self.engine.pause();
                if let Some(session) = self.session.as_mut() {
                    session.desired_playing = false;
                }
                self.phase = PlaybackPhase::Paused;
                self.notify(|l| l.on_player_paused());
                self.publish();
                Ok(())
            }
            PlaybackPhase::Paused => {
                self.engine.play();
                if let Some(session) = self.session.as_mut() {
                    session.desired_playing = true;
                }
                self.phase = PlaybackPhase::Playing;
                self.notify(|l| l.on_player_playing());
                self.publish();
                Ok(())
            }
            PlaybackPhase::Loading | PlaybackPhase::Ready | PlaybackPhase::Seeking => {
                let deferred = match self.session.as_mut() {
                    Some(session) => {
                        session.desired_playing = !session.desired_playing;
                        session.desired_playing
                    }
                    None => return Ok(()),
                };
                self.debug_message(&format!(
                    "play/pause deferred, will resume {}",
                    if deferred { "playing" } else { "paused" }
                ));
                Ok(())
            }
            phase => Err(PlayerError::InvalidState {
                operation: "play_pause",
                phase,
            }),
        }
    }

    /// Cease playback and release the engine session.
    ///
    /// Cancels any in-flight load or seek; engine callbacks still on the
    /// wire for the released session are dropped.
    pub fn stop(&mut self) -> Result<()> {
        match self.phase {
            PlaybackPhase::Empty | PlaybackPhase::Stopped => Err(PlayerError::InvalidState {
                operation: "stop",
                phase: self.phase,
            }),
            _ => {
                self.engine.stop();
                self.session = None;
                self.phase = PlaybackPhase::Stopped;
                self.notify(|l| l.on_player_stopped());
                self.debug_message("session released");
                self.publish();
                Ok(())
            }
        }
    }

    /// Move the playhead within the current item.
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        match self.phase {
            PlaybackPhase::Playing | PlaybackPhase::Paused => {
                let was_playing = self.phase == PlaybackPhase::Playing;
                if let Some(session) = self.session.as_mut() {
                    session.resume_playing = was_playing;
                }
                self.phase = PlaybackPhase::Seeking;
                self.notify(|l| l.on_seek_started());
                self.engine.seek(position);
                self.publish();
                Ok(())
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
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        self.advance(Direction::Next)
    }

    /// Step back to the previous queue item.
    pub fn previous(&mut self) -> Result<()> {
        self.advance(Direction::Previous)
    }

    fn advance(&mut self, direction: Direction) -> Result<()> {
        let operation = match direction {
            Direction::Next => "next",
            Direction::Previous => "previous",
        };
        match self.phase {
            PlaybackPhase::Playing
            | PlaybackPhase::Paused
            | PlaybackPhase::Completed
            | PlaybackPhase::Failed => {
                // Boundary check first: a failed advance leaves state and
                // notifications untouched.
                let index = self.queue.advance(direction)?;
                let desired = self
                    .session
                    .as_ref()
                    .map_or(self.config.autoplay, |s| s.desired_playing);
                if self.session.take().is_some() {
                    self.engine.stop();
                }
                self.begin_load(LoadKind::Advance { direction, index }, desired);
                Ok(())
            }
            PlaybackPhase::Loading | PlaybackPhase::Ready | PlaybackPhase::Seeking => {
                Err(PlayerError::Busy { operation })
            }
            phase => Err(PlayerError::InvalidState { operation, phase }),
        }
    }

    /// Jump directly to a queue position and load it.
    pub fn set_index(&mut self, index: usize) -> Result<()> {
        match self.phase {
            PlaybackPhase::Loading | PlaybackPhase::Ready | PlaybackPhase::Seeking => {
                Err(PlayerError::Busy {
                    operation: "set_index",
                })
            }
            _ => {
                self.queue.set_index(index)?;
                let desired = self
                    .session
                    .as_ref()
                    .map_or(self.config.autoplay, |s| s.desired_playing);
                if self.session.take().is_some() {
                    self.engine.stop();
                }
                self.begin_load(LoadKind::Fresh, desired);
                Ok(())
            }
        }
    }

    /// Accept a queue-position change reported from outside the transport.
    ///
    /// The engine has already switched items, so no load command is issued;
    /// the live session keeps receiving that engine's events. Emits only
    /// `on_index_changed_externally`.
    pub fn external_index_changed(&mut self, index: usize) -> Result<()> {
        match self.phase {
            PlaybackPhase::Empty | PlaybackPhase::Stopped => Err(PlayerError::InvalidState {
                operation: "external_index_changed",
                phase: self.phase,
            }),
            _ => {
                self.queue.external_update(index)?;
                match self.session.as_mut() {
                    Some(session) => {
                        session.position = Duration::ZERO;
                        session.duration = Duration::ZERO;
                        session.buffering = 0;
                        session.load = Some(LoadKind::Fresh);
                    }
                    None => {
                        // No live session (post-failure); rebind so the
                        // phase invariant holds. The host recovers with
                        // set_index if the engine never reports in.
                        let id = self.alloc_session();
                        self.session =
                            Some(Session::new(id, self.config.autoplay, LoadKind::Fresh));
                    }
                }
                self.phase = PlaybackPhase::Loading;
                self.notify(|l| l.on_index_changed_externally(index));
                self.debug_message(&format!("index changed externally to {}", index));
                self.publish();
                Ok(())
            }
        }
    }

    // ===== Engine Events =====

    /// Apply one engine event.
    ///
    /// Events from a session that is no longer live are dropped; that is
    /// how cancellation invalidates callbacks still in flight.
    pub fn handle_engine_event(&mut self, session: SessionId, event: EngineEvent) {
        if self.session.as_ref().map(|s| s.id) != Some(session) {
            debug!("dropping stale engine event from {}: {:?}", session, event);
            return;
        }

        match event {
            EngineEvent::Buffering { percent } => {
                if self.phase != PlaybackPhase::Loading {
                    debug!("ignoring buffering update while {}", self.phase);
                    return;
                }
                if let Some(session) = self.session.as_mut() {
                    session.buffering = percent;
                }
                self.notify(|l| l.on_buffering_update(percent));
            }

            EngineEvent::Ready { duration } => {
                if self.phase != PlaybackPhase::Loading {
                    debug!("ignoring ready while {}", self.phase);
                    return;
                }
                let (desired, finished) = match self.session.as_mut() {
                    Some(session) => {
                        session.duration = duration;
                        (session.desired_playing, session.load.take())
                    }
                    None => return,
                };
                self.phase = PlaybackPhase::Ready;
                self.notify(|l| l.on_audio_ready(duration));
                if desired {
                    self.engine.play();
                    self.phase = PlaybackPhase::Playing;
                    self.notify(|l| l.on_player_playing());
                } else {
                    self.engine.pause();
                    self.phase = PlaybackPhase::Paused;
                    self.notify(|l| l.on_player_paused());
                }
                if let Some(LoadKind::Advance { direction, index }) = finished {
                    match direction {
                        Direction::Next => self.notify(|l| l.on_next_completed(index)),
                        Direction::Previous => self.notify(|l| l.on_previous_completed(index)),
                    }
                }
                self.publish();
            }

            EngineEvent::Progress { position, duration } => {
                if let Some(session) = self.session.as_mut() {
                    session.position = position;
                    session.duration = duration;
                }
                if self.phase == PlaybackPhase::Playing {
                    self.notify(|l| l.on_player_playback_update(position, duration));
                }
            }

            EngineEvent::SeekCompleted { position } => {
                if self.phase != PlaybackPhase::Seeking {
                    debug!("ignoring seek completion while {}", self.phase);
                    return;
                }
                let (desired, resume) = match self.session.as_mut() {
                    Some(session) => {
                        session.position = position;
                        (session.desired_playing, session.resume_playing)
                    }
                    None => return,
                };
                self.phase = if desired {
                    PlaybackPhase::Playing
                } else {
                    PlaybackPhase::Paused
                };
                self.notify(|l| l.on_seek_completed(position));
                if desired != resume {
                    // Intent flipped while the seek was in flight
                    if desired {
                        self.engine.play();
                        self.notify(|l| l.on_player_playing());
                    } else {
                        self.engine.pause();
                        self.notify(|l| l.on_player_paused());
                    }
                }
                self.publish();
            }

            EngineEvent::Completed => {
                if self.phase != PlaybackPhase::Playing {
                    debug!("ignoring completion while {}", self.phase);
                    return;
                }
                self.phase = PlaybackPhase::Completed;
                self.notify(|l| l.on_player_completed());
                self.debug_message("item completed");
                self.publish();
            }

            EngineEvent::Failed { message } => {
                warn!("engine failure: {}", message);
                self.session = None;
                self.phase = PlaybackPhase::Failed;
                self.notify(|l| l.on_failed_prepare());
                self.debug_message(&format!("prepare failed: {}", message));
                self.publish();
            }
        }
    }

    // ===== State Accessors =====

    /// Current lifecycle phase
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Queue cursor, unset for an empty queue
    pub fn current_index(&self) -> Option<usize> {
        self.queue.index()
    }

    /// Item under the queue cursor
    pub fn current_item(&self) -> Option<&PlaybackItem> {
        self.queue.current()
    }

    /// Queue length
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Last known playhead position and duration of the live session
    pub fn position(&self) -> Option<(Duration, Duration)> {
        self.session.as_ref().map(|s| (s.position, s.duration))
    }

    /// Last known buffering percent of the live session
    pub fn buffering(&self) -> Option<u8> {
        self.session.as_ref().map(|s| s.buffering)
    }

    pub(crate) fn status_handle(&self) -> Arc<RwLock<PlayerStatus>> {
        Arc::clone(&self.status)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.session.take().is_some() {
            self.engine.stop();
        }
        debug!("playback manager shut down");
    }

    // ===== Internals =====

    fn alloc_session(&mut self) -> SessionId {
        self.next_session += 1;
        SessionId::new(self.next_session)
    }

    fn begin_load(&mut self, kind: LoadKind, desired_playing: bool) {
        let item = match self.queue.current() {
            Some(item) => item.clone(),
            None => return,
        };
        let id = self.alloc_session();
        self.session = Some(Session::new(id, desired_playing, kind));
        self.phase = PlaybackPhase::Loading;

        if let LoadKind::Advance { direction, index } = kind {
            match direction {
                Direction::Next => self.notify(|l| l.on_next_started(index)),
                Direction::Previous => self.notify(|l| l.on_previous_started(index)),
            }
        }
        self.notify(|l| l.on_audio_loading());
        self.debug_message(&format!("loading \"{}\" as {}", item.title, id));

        let events = EngineEventSender::new(id, self.engine_events.clone());
        self.engine.load(&item, events);
        self.publish();
    }

    fn notify(&self, f: impl Fn(&dyn PlayerListener)) {
        let snapshot = self.listeners.lock().unwrap().snapshot();
        for listener in &snapshot {
            f(listener.as_ref());
        }
    }

    fn debug_message(&self, text: &str) {
        debug!("{}", text);
        if self.config.debug_messages {
            self.notify(|l| l.on_debug_message(text));
        }
    }

    fn publish(&self) {
        let mut status = self.status.write().unwrap();
        status.phase = self.phase;
        status.index = self.queue.index();
        status.queue_len = self.queue.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::engine_events;

    struct NullEngine;

    impl RenderEngine for NullEngine {
        fn load(&mut self, _item: &PlaybackItem, _events: EngineEventSender) {}
        fn play(&mut self) {}
        fn pause(&mut self) {}
        fn stop(&mut self) {}
        fn seek(&mut self, _position: Duration) {}
    }

    fn manager() -> PlaybackManager {
        let (sink, _stream) = engine_events();
        PlaybackManager::new(Box::new(NullEngine), PlayerConfig::default(), sink)
    }

    #[test]
    fn starts_empty() {
        let manager = manager();
        assert_eq!(manager.phase(), PlaybackPhase::Empty);
        assert_eq!(manager.current_index(), None);
        assert_eq!(manager.queue_len(), 0);
    }

    #[test]
    fn commands_rejected_while_empty() {
        let mut manager = manager();
        assert!(matches!(
            manager.play_pause(),
            Err(PlayerError::InvalidState { .. })
        ));
        assert!(matches!(
            manager.seek(Duration::from_secs(5)),
            Err(PlayerError::InvalidState { .. })
        ));
        assert!(matches!(manager.stop(), Err(PlayerError::InvalidState { .. })));
        assert!(matches!(
            manager.next(),
            Err(PlayerError::InvalidState { .. })
        ));
    }

    #[test]
    fn empty_init_queue_stays_empty() {
        let mut manager = manager();
        manager.init_queue(Vec::new());
        assert_eq!(manager.phase(), PlaybackPhase::Empty);
    }
}
