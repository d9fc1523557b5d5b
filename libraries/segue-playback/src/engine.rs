//! Opaque render engine contract
//!
//! Abstracts the native media pipeline (AVFoundation, ExoPlayer, GStreamer,
//! a decoder stack, ...) behind a command trait plus an event channel. The
//! transport never inspects engine internals; it only reacts to the events
//! the engine reports.

use crate::types::PlaybackItem;
use std::time::Duration;
use tokio::sync::mpsc;

/// Identifies one load of one queue item.
///
/// Every engine event carries the id of the session it belongs to; events
/// from a session that is no longer live are dropped by the transport. This
/// is how a `stop()` or queue replacement invalidates callbacks still in
/// flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Events reported by the render engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The current item has buffered to the given percentage
    Buffering { percent: u8 },

    /// The current item can be played
    Ready { duration: Duration },

    /// Periodic playhead update while rendering
    Progress {
        position: Duration,
        duration: Duration,
    },

    /// An in-flight seek finished at the given position
    SeekCompleted { position: Duration },

    /// The current item reached its natural end
    Completed,

    /// The engine could not prepare or continue the current item
    Failed { message: String },
}

/// Sending half of the engine event channel
pub type EngineEventSink = mpsc::UnboundedSender<(SessionId, EngineEvent)>;

/// Receiving half of the engine event channel
pub type EngineEventStream = mpsc::UnboundedReceiver<(SessionId, EngineEvent)>;

/// Create the channel pair carrying engine events into the transport.
///
/// The sink goes to `PlaybackManager::new`; the stream goes to whatever
/// drives the manager (the `Player` control task, or a host's own loop).
pub fn engine_events() -> (EngineEventSink, EngineEventStream) {
    mpsc::unbounded_channel()
}

/// Event sender bound to one session
///
/// Handed to the engine at `load` time. Everything sent through it is
/// tagged with that load's session id, so a stale engine cannot corrupt a
/// newer session. Sending after the transport has shut down is a no-op.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    session: SessionId,
    sink: EngineEventSink,
}

impl EngineEventSender {
    pub(crate) fn new(session: SessionId, sink: EngineEventSink) -> Self {
        Self { session, sink }
    }

    /// Session this sender is bound to
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Report an engine event for this session.
    pub fn send(&self, event: EngineEvent) {
        // Receiver gone means the transport shut down; nothing to report to.
        let _ = self.sink.send((self.session, event));
    }
}

/// Opaque media-rendering engine
///
/// Commands are fire-and-forget: every outcome (ready, failure, seek
/// completion, progress) comes back asynchronously as an [`EngineEvent`]
/// through the sender supplied at `load` time. Implementations bridge to
/// the actual platform pipeline.
pub trait RenderEngine: Send {
    /// Begin preparing an item for playback.
    ///
    /// Replaces any previous load. Events for this load must go through
    /// `events`; senders from earlier loads are dead and their events will
    /// be dropped.
    fn load(&mut self, item: &PlaybackItem, events: EngineEventSender);

    /// Start or resume rendering
    fn play(&mut self);

    /// Pause rendering, keeping the session alive
    fn pause(&mut self);

    /// Release the current session entirely
    fn stop(&mut self);

    /// Move the playhead; completion is reported via `SeekCompleted`
    fn seek(&mut self, position: Duration);
}

/// Engine that reports failure for every load
///
/// Useful as a placeholder while wiring a host up.
#[derive(Debug, Default)]
pub struct UnsupportedEngine;

impl RenderEngine for UnsupportedEngine {
    fn load(&mut self, item: &PlaybackItem, events: EngineEventSender) {
        events.send(EngineEvent::Failed {
            message: format!("no engine available for {}", item.locator),
        });
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn stop(&mut self) {}

    fn seek(&mut self, _position: Duration) {}
}
