//! Property-based tests for queue navigation and the load lifecycle
//!
//! Uses proptest to verify invariants across many random inputs: cursor
//! validity, round-trip navigation, boundary behavior, and notification
//! ordering under random pending-intent toggles.

use proptest::prelude::*;
use segue_playback::{
    engine_events, Direction, EngineEvent, EngineEventSender, PlaybackItem, PlaybackManager,
    PlaybackPhase, PlayerConfig, PlayerListener, Queue, RenderEngine,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Helpers =====

fn arbitrary_item() -> impl Strategy<Value = PlaybackItem> {
    (
        "[a-z0-9]{1,10}",                        // id
        "[A-Za-z ]{1,30}",                       // title
        "[A-Za-z ]{1,20}",                       // artist
        proptest::option::of("[A-Za-z ]{1,20}"), // album
    )
        .prop_map(|(id, title, artist, album)| PlaybackItem {
            locator: format!("https://cdn.example.com/audio/{}.mp3", id),
            id,
            title,
            artist,
            album,
        })
}

fn arbitrary_items(max: usize) -> impl Strategy<Value = Vec<PlaybackItem>> {
    prop::collection::vec(arbitrary_item(), 1..max)
}

/// Engine stub that only hands back the event sender of the latest load
#[derive(Clone, Default)]
struct ProbeEngine {
    sender: Arc<Mutex<Option<EngineEventSender>>>,
}

impl RenderEngine for ProbeEngine {
    fn load(&mut self, _item: &PlaybackItem, events: EngineEventSender) {
        *self.sender.lock().unwrap() = Some(events);
    }

    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn stop(&mut self) {}
    fn seek(&mut self, _position: Duration) {}
}

#[derive(Default)]
struct OrderingListener {
    events: Mutex<Vec<String>>,
}

impl PlayerListener for OrderingListener {
    fn on_audio_ready(&self, _duration: Duration) {
        self.events.lock().unwrap().push("ready".to_string());
    }

    fn on_player_playing(&self) {
        self.events.lock().unwrap().push("playing".to_string());
    }

    fn on_player_paused(&self) {
        self.events.lock().unwrap().push("paused".to_string());
    }
}

// ===== Queue Properties =====

proptest! {
    /// Property: resetting the queue always parks the cursor at 0
    #[test]
    fn reset_always_points_cursor_at_zero(items in arbitrary_items(50)) {
        let mut queue = Queue::new();
        queue.reset(items.clone());
        prop_assert_eq!(queue.index(), Some(0));
        prop_assert_eq!(queue.current().unwrap(), &items[0]);

        queue.reset(Vec::new());
        prop_assert_eq!(queue.index(), None);
    }

    /// Property: next then previous from any interior index returns to the
    /// original index and item
    #[test]
    fn round_trip_returns_to_origin(
        items in arbitrary_items(30),
        start in 0usize..29,
    ) {
        prop_assume!(items.len() >= 2);
        let start = start % (items.len() - 1); // interior: next must exist

        let mut queue = Queue::new();
        queue.reset(items.clone());
        queue.set_index(start).unwrap();
        let original = queue.current().unwrap().clone();

        queue.advance(Direction::Next).unwrap();
        queue.advance(Direction::Previous).unwrap();

        prop_assert_eq!(queue.index(), Some(start));
        prop_assert_eq!(queue.current().unwrap(), &original);
    }

    /// Property: stepping off either end always fails and never moves the
    /// cursor
    #[test]
    fn boundaries_never_wrap(items in arbitrary_items(30)) {
        let mut queue = Queue::new();
        queue.reset(items.clone());

        prop_assert!(queue.advance(Direction::Previous).is_err());
        prop_assert_eq!(queue.index(), Some(0));

        queue.set_index(items.len() - 1).unwrap();
        prop_assert!(queue.advance(Direction::Next).is_err());
        prop_assert_eq!(queue.index(), Some(items.len() - 1));
    }

    /// Property: set_index accepts exactly the valid indices
    #[test]
    fn set_index_accepts_exactly_valid_indices(
        items in arbitrary_items(30),
        index in 0usize..60,
    ) {
        let mut queue = Queue::new();
        queue.reset(items.clone());

        if index < items.len() {
            prop_assert!(queue.set_index(index).is_ok());
            prop_assert_eq!(queue.index(), Some(index));
        } else {
            prop_assert!(queue.set_index(index).is_err());
            prop_assert_eq!(queue.index(), Some(0));
        }
    }

    /// Property: the cursor is always valid after any sequence of
    /// navigation attempts, successful or not
    #[test]
    fn cursor_stays_valid_under_random_navigation(
        items in arbitrary_items(20),
        moves in prop::collection::vec(0u8..3, 1..40),
    ) {
        let mut queue = Queue::new();
        queue.reset(items.clone());

        for step in moves {
            match step {
                0 => { queue.advance(Direction::Next).ok(); }
                1 => { queue.advance(Direction::Previous).ok(); }
                _ => { queue.external_update(items.len() / 2).ok(); }
            }
            let index = queue.index().unwrap();
            prop_assert!(index < items.len());
        }
    }
}

// ===== Load Lifecycle Properties =====

proptest! {
    /// Property: regardless of how often play/pause is toggled during a
    /// load, exactly one ready notification is delivered and it precedes
    /// the single playing-or-paused notification that matches the final
    /// intent
    #[test]
    fn ready_ordering_survives_intent_toggles(
        items in arbitrary_items(5),
        toggles in 0usize..6,
    ) {
        let (sink, mut stream) = engine_events();
        let engine = ProbeEngine::default();
        let sender = engine.sender.clone();
        let mut manager =
            PlaybackManager::new(Box::new(engine), PlayerConfig::default(), sink);
        let listener = Arc::new(OrderingListener::default());
        manager.add_listener(listener.clone());

        manager.init_queue(items);
        for _ in 0..toggles {
            manager.play_pause().unwrap();
        }
        sender
            .lock()
            .unwrap()
            .as_ref()
            .unwrap()
            .send(EngineEvent::Ready { duration: Duration::from_secs(60) });
        while let Ok((session, event)) = stream.try_recv() {
            manager.handle_engine_event(session, event);
        }

        let events = listener.events.lock().unwrap().clone();
        let expect_playing = toggles % 2 == 0; // autoplay default, each toggle flips
        let expected = if expect_playing { "playing" } else { "paused" };
        prop_assert_eq!(events, ["ready".to_string(), expected.to_string()]);
        prop_assert_eq!(
            manager.phase(),
            if expect_playing { PlaybackPhase::Playing } else { PlaybackPhase::Paused }
        );
    }
}
