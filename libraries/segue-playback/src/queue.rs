//! Ordered playback queue with a current-index cursor
//!
//! Insertion order is playback order. Navigation is strictly index-based:
//! no wraparound, no clamping. The queue itself never talks to the engine;
//! it only resolves indices for its owner to load.

use crate::error::{PlayerError, Result};
use crate::types::PlaybackItem;

/// Relative navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Ordered sequence of playback items plus the queue cursor
///
/// Invariant: the cursor is a valid index whenever the queue is non-empty,
/// and unset when it is empty.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<PlaybackItem>,
    cursor: Option<usize>,
}

impl Queue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
        }
    }

    /// Replace the queue contents.
    ///
    /// Resets the cursor to 0 (or unset for an empty replacement) and
    /// returns the new length. The owner is responsible for tearing down
    /// any in-flight engine session.
    pub fn reset(&mut self, items: Vec<PlaybackItem>) -> usize {
        self.items = items;
        self.cursor = if self.items.is_empty() { None } else { Some(0) };
        self.items.len()
    }

    /// Move the cursor to an absolute index.
    ///
    /// Returns the item at that index for the owner to load.
    pub fn set_index(&mut self, index: usize) -> Result<&PlaybackItem> {
        if index >= self.items.len() {
            return Err(PlayerError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.cursor = Some(index);
        Ok(&self.items[index])
    }

    /// Step the cursor one position forward or backward.
    ///
    /// Fails with `NoSuchTrack` when the step would leave the queue; the
    /// cursor is untouched in that case. No wraparound.
    pub fn advance(&mut self, direction: Direction) -> Result<usize> {
        let cursor = self.cursor.ok_or(PlayerError::NoSuchTrack)?;
        let target = match direction {
            Direction::Next => cursor.checked_add(1).filter(|i| *i < self.items.len()),
            Direction::Previous => cursor.checked_sub(1),
        };
        let target = target.ok_or(PlayerError::NoSuchTrack)?;
        self.cursor = Some(target);
        Ok(target)
    }

    /// Accept an index change reported from outside the transport.
    ///
    /// The render engine has already switched, so the owner must not issue
    /// a fresh load; it emits the "changed externally" notification instead
    /// of the next/previous pair.
    pub fn external_update(&mut self, index: usize) -> Result<usize> {
        if index >= self.items.len() {
            return Err(PlayerError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.cursor = Some(index);
        Ok(index)
    }

    /// Item under the cursor
    pub fn current(&self) -> Option<&PlaybackItem> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    /// Item at an arbitrary index
    pub fn get(&self, index: usize) -> Option<&PlaybackItem> {
        self.items.get(index)
    }

    /// Current cursor position, unset for an empty queue
    pub fn index(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of items in the queue
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
