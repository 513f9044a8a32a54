//! Event fan-out: who hears what.
//!
//! Game logic emits [`ServerEvent`]s through the [`EventSink`] seam and
//! never touches a socket. The production [`Hub`] hands pre-serialized
//! frames to per-session writer tasks; tests use [`RecordingSink`] to
//! assert on the exact event stream.

use std::collections::HashMap;
use std::sync::Mutex;
use swarmclash_core::{PlayerId, ServerEvent};
use tokio::sync::mpsc;
use tracing::warn;

/// Where game logic sends its events.
pub trait EventSink: Send + Sync + 'static {
    /// Fire-and-forget delivery to one session.
    fn emit(&self, to: &PlayerId, event: &ServerEvent);

    /// Fire-and-forget delivery to every session.
    fn broadcast(&self, event: &ServerEvent);

    /// Delivery to every session but one (typically the originator).
    fn broadcast_except(&self, except: &PlayerId, event: &ServerEvent);
}

/// Registry of connected sessions and their outbound frame channels.
#[derive(Default)]
pub struct Hub {
    sessions: Mutex<HashMap<PlayerId, mpsc::UnboundedSender<String>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly connected session's outbound channel.
    pub fn register(&self, id: PlayerId, tx: mpsc::UnboundedSender<String>) {
        self.sessions.lock().expect("hub lock poisoned").insert(id, tx);
    }

    /// Drops a session; queued frames for it are discarded.
    pub fn unregister(&self, id: &PlayerId) {
        self.sessions.lock().expect("hub lock poisoned").remove(id);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("hub lock poisoned").len()
    }

    fn send_where(&self, event: &ServerEvent, mut include: impl FnMut(&PlayerId) -> bool) {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "failed to serialize event");
                return;
            }
        };
        let sessions = self.sessions.lock().expect("hub lock poisoned");
        for (id, tx) in sessions.iter() {
            if include(id) {
                // A closed channel just means the session is tearing
                // down; the disconnect path cleans it up.
                let _ = tx.send(frame.clone());
            }
        }
    }
}

impl EventSink for Hub {
    fn emit(&self, to: &PlayerId, event: &ServerEvent) {
        self.send_where(event, |id| id == to);
    }

    fn broadcast(&self, event: &ServerEvent) {
        self.send_where(event, |_| true);
    }

    fn broadcast_except(&self, except: &PlayerId, event: &ServerEvent) {
        self.send_where(event, |id| id != except);
    }
}

/// Addressing of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    To(PlayerId),
    Broadcast,
    BroadcastExcept(PlayerId),
}

/// Sink that records every event for assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(Target, ServerEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything recorded so far.
    pub fn take(&self) -> Vec<(Target, ServerEvent)> {
        std::mem::take(&mut self.events.lock().expect("sink lock poisoned"))
    }

    fn record(&self, target: Target, event: &ServerEvent) {
        self.events
            .lock()
            .expect("sink lock poisoned")
            .push((target, event.clone()));
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, to: &PlayerId, event: &ServerEvent) {
        self.record(Target::To(*to), event);
    }

    fn broadcast(&self, event: &ServerEvent) {
        self.record(Target::Broadcast, event);
    }

    fn broadcast_except(&self, except: &PlayerId, event: &ServerEvent) {
        self.record(Target::BroadcastExcept(*except), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_event() -> ServerEvent {
        ServerEvent::PlayerLeft {
            player_id: PlayerId::from_seed(9),
        }
    }

    #[test]
    fn test_hub_targets_sessions() {
        let hub = Hub::new();
        let (alice, bob) = (PlayerId::from_seed(1), PlayerId::from_seed(2));
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        hub.register(alice, tx_a);
        hub.register(bob, tx_b);

        hub.emit(&alice, &left_event());
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());

        hub.broadcast_except(&alice, &left_event());
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());

        hub.broadcast(&left_event());
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_hub_frames_are_wire_json() {
        let hub = Hub::new();
        let alice = PlayerId::from_seed(1);
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(alice, tx);

        hub.emit(&alice, &left_event());
        let frame = rx.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["event"], "player_left");
    }

    #[test]
    fn test_unregister_stops_delivery() {
        let hub = Hub::new();
        let alice = PlayerId::from_seed(1);
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register(alice, tx);
        hub.unregister(&alice);

        hub.broadcast(&left_event());
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.session_count(), 0);
    }
}
