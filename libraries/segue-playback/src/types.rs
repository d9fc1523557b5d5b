//! Core types for the playback transport

use crate::error::{PlayerError, Result};
use serde::{Deserialize, Serialize};

/// One queue entry: an opaque source locator plus display metadata.
///
/// Immutable once enqueued. The locator is handed to the render engine
/// verbatim; this crate never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackItem {
    /// Opaque source identifier
    pub id: String,

    /// Locator handed to the render engine (URL, file path, ...)
    pub locator: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    pub album: Option<String>,
}

/// Lifecycle phase of the playback transport
///
/// `Stopped` and `Completed` are terminal per item: a fresh load
/// (`init_queue`, `set_index` or next/previous) is required to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackPhase {
    /// No queue loaded
    Empty,

    /// Waiting for the engine to prepare the current item
    Loading,

    /// Engine reported the item playable; transient before Playing/Paused
    Ready,

    /// Audio is rendering
    Playing,

    /// Paused mid-item
    Paused,

    /// A seek is in flight
    Seeking,

    /// Session explicitly released
    Stopped,

    /// Current item reached its natural end
    Completed,

    /// The engine failed to prepare the current item
    Failed,
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackPhase::Empty => "empty",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Ready => "ready",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Seeking => "seeking",
            PlaybackPhase::Stopped => "stopped",
            PlaybackPhase::Completed => "completed",
            PlaybackPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Tri-state command outcome mirroring system remote-control conventions
///
/// Lets an external control surface (lock screen, media keys) distinguish
/// "I will act on this" from "ignored because state forbids it" and
/// "the requested item does not exist".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandStatus {
    /// Command accepted; effects arrive via listener callbacks
    Handled,

    /// Command rejected by the current state
    NotHandled,

    /// The target index/track does not exist
    NoSuchItem,
}

impl CommandStatus {
    /// Collapse a transport command result to the tri-state status.
    pub fn from_result(result: &Result<()>) -> Self {
        match result {
            Ok(()) => CommandStatus::Handled,
            Err(PlayerError::NoSuchTrack) | Err(PlayerError::OutOfRange { .. }) => {
                CommandStatus::NoSuchItem
            }
            Err(_) => CommandStatus::NotHandled,
        }
    }
}

/// Configuration for the playback transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Start playing as soon as a freshly loaded item is ready (default: true)
    pub autoplay: bool,

    /// Mirror transition diagnostics to `on_debug_message` (default: false)
    pub debug_messages: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            debug_messages: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PlayerConfig::default();
        assert!(config.autoplay);
        assert!(!config.debug_messages);
    }

    #[test]
    fn command_status_mapping() {
        assert_eq!(CommandStatus::from_result(&Ok(())), CommandStatus::Handled);
        assert_eq!(
            CommandStatus::from_result(&Err(PlayerError::NoSuchTrack)),
            CommandStatus::NoSuchItem
        );
        assert_eq!(
            CommandStatus::from_result(&Err(PlayerError::OutOfRange { index: 7, len: 3 })),
            CommandStatus::NoSuchItem
        );
        assert_eq!(
            CommandStatus::from_result(&Err(PlayerError::Busy { operation: "seek" })),
            CommandStatus::NotHandled
        );
        assert_eq!(
            CommandStatus::from_result(&Err(PlayerError::InvalidState {
                operation: "seek",
                phase: PlaybackPhase::Stopped,
            })),
            CommandStatus::NotHandled
        );
    }

    #[test]
    fn playback_item_serde_round_trip() {
        let item = PlaybackItem {
            id: "track-9".to_string(),
            locator: "https://cdn.example.com/audio/track-9.mp3".to_string(),
            title: "Ninth Track".to_string(),
            artist: "Some Artist".to_string(),
            album: Some("Some Album".to_string()),
        };

        let json = serde_json::to_string(&item).unwrap();
        let back: PlaybackItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn phase_display_is_lowercase() {
        assert_eq!(PlaybackPhase::Playing.to_string(), "playing");
        assert_eq!(PlaybackPhase::Seeking.to_string(), "seeking");
    }
}
