//! Listener trait and registry
//!
//! Fan-out of lifecycle notifications to registered observers. The registry
//! holds `Arc` handles; observer identity is the allocation, so the same
//! `Arc` cannot be registered twice. Each dispatch iterates a snapshot of
//! the registration list, which makes add/remove from within a callback
//! well-defined: changes take effect from the next dispatched notification.

use std::sync::Arc;
use std::time::Duration;

/// Observer of playback lifecycle events
///
/// All methods have empty default bodies; implement only what you care
/// about. Callbacks run on the transport's control context, so keep them
/// short and never block.
#[allow(unused_variables)]
pub trait PlayerListener: Send + Sync {
    /// An item just started being loaded
    fn on_audio_loading(&self) {}

    /// The current item has buffered to the given percent
    fn on_buffering_update(&self, percent: u8) {}

    /// The current item is playable. Immediately afterwards listeners are
    /// told `on_player_playing` or `on_player_paused`, depending on the
    /// intent in force before the load.
    fn on_audio_ready(&self, duration: Duration) {}

    /// The engine failed to prepare the current item
    fn on_failed_prepare(&self) {}

    /// Rendering started (from pause or right after ready)
    fn on_player_playing(&self) {}

    /// Periodic playhead update while playing
    fn on_player_playback_update(&self, position: Duration, duration: Duration) {}

    /// Rendering paused (from playing or right after ready)
    fn on_player_paused(&self) {}

    /// Playback ceased and the session was released; a fresh load is
    /// required to play again
    fn on_player_stopped(&self) {}

    /// The current item reached its natural end
    fn on_player_completed(&self) {}

    /// A seek operation began
    fn on_seek_started(&self) {}

    /// A seek operation finished at the given position
    fn on_seek_completed(&self, position: Duration) {}

    /// Advancing to the next item began
    fn on_next_started(&self, index: usize) {}

    /// The next item finished loading
    fn on_next_completed(&self, index: usize) {}

    /// Stepping back to the previous item began
    fn on_previous_started(&self, index: usize) {}

    /// The previous item finished loading
    fn on_previous_completed(&self, index: usize) {}

    /// The queue position changed outside this transport (e.g. a system
    /// remote control); no next/previous notifications accompany it
    fn on_index_changed_externally(&self, index: usize) {}

    /// Diagnostic text; purely observational
    fn on_debug_message(&self, message: &str) {}
}

/// Registry of playback listeners
///
/// Holds non-owning-in-spirit `Arc` handles: the caller keeps its own clone
/// and removes the listener before letting it go if it must stop receiving
/// events. Notifications are delivered in registration order.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Vec<Arc<dyn PlayerListener>>,
}

fn listener_key(listener: &Arc<dyn PlayerListener>) -> usize {
    // Compare by allocation, not by fat pointer: the vtable half is not
    // stable across codegen units.
    Arc::as_ptr(listener) as *const () as usize
}

impl ListenerSet {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    ///
    /// Idempotent: re-adding an already registered listener is a no-op.
    /// Returns whether the listener was actually added.
    pub fn add(&mut self, listener: Arc<dyn PlayerListener>) -> bool {
        let key = listener_key(&listener);
        if self.listeners.iter().any(|l| listener_key(l) == key) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Unregister a listener.
    ///
    /// Safe to call from within a notification callback: the dispatch in
    /// progress keeps its snapshot, subsequent dispatches no longer see the
    /// listener. Returns whether the listener was registered.
    pub fn remove(&mut self, listener: &Arc<dyn PlayerListener>) -> bool {
        let key = listener_key(listener);
        let before = self.listeners.len();
        self.listeners.retain(|l| listener_key(l) != key);
        self.listeners.len() != before
    }

    /// Snapshot of the current registration list, in registration order
    pub fn snapshot(&self) -> Vec<Arc<dyn PlayerListener>> {
        self.listeners.clone()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Check if no listeners are registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingListener {
        seen: Mutex<Vec<String>>,
    }

    impl PlayerListener for CountingListener {
        fn on_player_playing(&self) {
            self.seen.lock().unwrap().push("playing".to_string());
        }
    }

    #[test]
    fn add_is_idempotent() {
        let mut set = ListenerSet::new();
        let listener: Arc<dyn PlayerListener> = Arc::new(CountingListener::default());

        assert!(set.add(listener.clone()));
        assert!(!set.add(listener.clone()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn distinct_listeners_both_register() {
        let mut set = ListenerSet::new();
        let a: Arc<dyn PlayerListener> = Arc::new(CountingListener::default());
        let b: Arc<dyn PlayerListener> = Arc::new(CountingListener::default());

        assert!(set.add(a));
        assert!(set.add(b));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn remove_unregistered_is_a_no_op() {
        let mut set = ListenerSet::new();
        let listener: Arc<dyn PlayerListener> = Arc::new(CountingListener::default());
        assert!(!set.remove(&listener));
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let mut set = ListenerSet::new();
        let a: Arc<dyn PlayerListener> = Arc::new(CountingListener::default());
        let b: Arc<dyn PlayerListener> = Arc::new(CountingListener::default());
        set.add(a.clone());
        set.add(b);

        let snapshot = set.snapshot();
        set.remove(&a);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let mut set = ListenerSet::new();
        let a = Arc::new(CountingListener::default());
        let b = Arc::new(CountingListener::default());
        set.add(a.clone());
        set.add(b.clone());

        let snapshot = set.snapshot();
        assert_eq!(listener_key(&snapshot[0]), Arc::as_ptr(&a) as *const () as usize);
        assert_eq!(listener_key(&snapshot[1]), Arc::as_ptr(&b) as *const () as usize);
    }
}
