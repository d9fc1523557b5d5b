//! Segue - Playback Transport
//!
//! Queue-ordered audio transport core for Segue.
//!
//! This crate provides:
//! - Ordered playback queue with index-based navigation (next/previous/jump)
//! - Playback state machine (loading, buffering, playing, paused, seeking)
//! - Exactly-once, ordered listener notifications
//! - Pending play/pause intent across async loads and seeks
//! - Stale-callback invalidation on stop and queue replacement
//! - External index reconciliation (system remote controls)
//!
//! # Architecture
//!
//! `segue-playback` sits between a host application and a native
//! media-rendering engine, and is completely platform-agnostic:
//! - No dependency on any decoder or audio output stack
//! - No dependency on any UI framework
//!
//! The engine is supplied via the [`RenderEngine`] trait and reports back
//! through an event channel. All state lives behind a single-writer
//! control context: [`Player`] spawns one on a Tokio task, while hosts
//! with their own serialized loop can drive [`PlaybackManager`] directly.
//!
//! # Example: Transport over a custom engine
//!
//! ```rust,no_run
//! use segue_playback::{
//!     EngineEvent, EngineEventSender, PlaybackItem, Player, PlayerConfig, RenderEngine,
//! };
//! use std::time::Duration;
//!
//! // Bridge to the platform media pipeline
//! struct MyEngine;
//!
//! impl RenderEngine for MyEngine {
//!     fn load(&mut self, item: &PlaybackItem, events: EngineEventSender) {
//!         // Kick off the platform load; report back when playable
//!         events.send(EngineEvent::Ready {
//!             duration: Duration::from_secs(180),
//!         });
//!     }
//!
//!     fn play(&mut self) { /* resume the platform pipeline */ }
//!     fn pause(&mut self) { /* pause the platform pipeline */ }
//!     fn stop(&mut self) { /* release the platform session */ }
//!     fn seek(&mut self, _position: Duration) { /* move the playhead */ }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let player = Player::spawn(Box::new(MyEngine), PlayerConfig::default());
//!
//!     player
//!         .init_queue(vec![PlaybackItem {
//!             id: "track-1".to_string(),
//!             locator: "https://cdn.example.com/audio/track-1.mp3".to_string(),
//!             title: "First Track".to_string(),
//!             artist: "Some Artist".to_string(),
//!             album: None,
//!         }])
//!         .ok();
//!
//!     // Effects arrive on listeners registered via player.add_listener(...)
//! }
//! ```
//!
//! # Example: Remote-control status mapping
//!
//! ```rust
//! use segue_playback::CommandStatus;
//! # use segue_playback::{PlayerError, Result};
//!
//! # fn transport_next() -> Result<()> { Err(PlayerError::NoSuchTrack) }
//! // A lock-screen bridge collapses the typed result to the tri-state
//! // status the platform expects.
//! let status = CommandStatus::from_result(&transport_next());
//! assert_eq!(status, CommandStatus::NoSuchItem);
//! ```

mod engine;
mod error;
mod listener;
mod manager;
mod player;
mod queue;
pub mod types;

// Public exports
pub use engine::{
    engine_events, EngineEvent, EngineEventSender, EngineEventSink, EngineEventStream,
    RenderEngine, SessionId, UnsupportedEngine,
};
pub use error::{PlayerError, Result};
pub use listener::{ListenerSet, PlayerListener};
pub use manager::{PlaybackManager, PlayerStatus};
pub use player::{Player, PlayerCommand};
pub use queue::{Direction, Queue};
pub use types::{CommandStatus, PlaybackItem, PlaybackPhase, PlayerConfig};
