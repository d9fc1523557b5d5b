//! Error types for the playback transport

use crate::types::PlaybackPhase;
use thiserror::Error;

/// Playback transport errors
///
/// Validation errors (`OutOfRange`, `NoSuchTrack`, `InvalidState`, `Busy`)
/// are returned synchronously from the command that triggered them and never
/// change state. Engine failures surface asynchronously through
/// `on_failed_prepare` instead of a return value.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Requested queue index does not exist
    #[error("index {index} out of range (queue length {len})")]
    OutOfRange { index: usize, len: usize },

    /// Next/previous would step outside the queue
    #[error("no track in that direction")]
    NoSuchTrack,

    /// Command is not legal in the current phase
    #[error("{operation} is not valid while {phase}")]
    InvalidState {
        operation: &'static str,
        phase: PlaybackPhase,
    },

    /// A load or seek is already in flight
    #[error("{operation} rejected: a load or seek is still in flight")]
    Busy { operation: &'static str },

    /// Opaque render engine error
    #[error("render engine error: {0}")]
    Engine(String),

    /// The control task has shut down
    #[error("player control task is gone")]
    Closed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlayerError>;
