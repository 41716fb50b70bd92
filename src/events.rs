//! Engine notifications.
//!
//! Operations return their results directly; anything other parties need to
//! observe (audit log, UI push, statistics) is also published here. Events of
//! one player are published while that player's state is locked, so every
//! subscriber sees them in the order they happened.

use crate::common::types::{Amount, Multiplier, PlayerId};
use crate::games::types::{GameParams, GameState};
use crate::ledger::BalanceView;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    GameStarted {
        game_id: String,
        player: PlayerId,
        params: GameParams,
        stake: Amount,
        server_seed_hash: String,
        nonce: u64,
    },
    TileRevealed {
        game_id: String,
        player: PlayerId,
        index: u32,
        is_mine: bool,
        current_multiplier: Multiplier,
    },
    GameEnded {
        game_id: String,
        player: PlayerId,
        state: GameState,
        won: bool,
        amount_won: Amount,
        /// Disclosed server seed for verification
        server_seed: String,
    },
    Deposited {
        player: PlayerId,
        amount: Amount,
        balance: BalanceView,
    },
    Withdrawn {
        player: PlayerId,
        amount: Amount,
        balance: BalanceView,
    },
}

impl GameEvent {
    pub fn player(&self) -> &PlayerId {
        match self {
            GameEvent::GameStarted { player, .. }
            | GameEvent::TileRevealed { player, .. }
            | GameEvent::GameEnded { player, .. }
            | GameEvent::Deposited { player, .. }
            | GameEvent::Withdrawn { player, .. } => player,
        }
    }
}

/// Sequenced envelope delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub sequence: u64,
    pub emitted_at: DateTime<Utc>,
    pub event: GameEvent,
}

/// Broadcast outbox
pub struct EventBus {
    sender: broadcast::Sender<EngineEvent>,
    next_sequence: Mutex<u64>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            next_sequence: Mutex::new(0),
        }
    }

    /// Publish an event; having no subscribers is not an error
    pub fn publish(&self, event: GameEvent, emitted_at: DateTime<Utc>) -> u64 {
        let mut next = self.next_sequence.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = *next;
        *next += 1;

        let envelope = EngineEvent {
            sequence,
            emitted_at,
            event,
        };
        if let Err(broadcast::error::SendError(unsent)) = self.sender.send(envelope) {
            tracing::trace!(sequence, player = %unsent.event.player(), "No event subscribers");
        }
        sequence
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }
}

/// Drain everything currently buffered in a receiver without waiting
pub fn drain_pending(receiver: &mut broadcast::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Event subscriber lagged; skipped {} events", skipped);
                continue;
            }
            Err(broadcast::error::TryRecvError::Empty) | Err(broadcast::error::TryRecvError::Closed) => break,
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deposit_event(player: &str) -> GameEvent {
        GameEvent::Deposited {
            player: PlayerId::from(player),
            amount: Amount::tokens(1),
            balance: BalanceView::default(),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        assert_eq!(bus.publish(deposit_event("a"), Utc::now()), 0);
        assert_eq!(bus.publish(deposit_event("a"), Utc::now()), 1);
    }

    #[test]
    fn test_subscribers_receive_in_order() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        for name in ["a", "b", "c"] {
            bus.publish(deposit_event(name), Utc::now());
        }

        let events = drain_pending(&mut rx);
        let sequences: Vec<u64> = events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(events[2].event.player().as_str(), "c");
    }

    #[test]
    fn test_lagged_subscriber_keeps_latest() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(deposit_event("a"), Utc::now());
        }
        let events = drain_pending(&mut rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].sequence, 4);
    }

    #[test]
    fn test_event_json_tag() {
        let json = serde_json::to_value(deposit_event("a")).unwrap();
        assert_eq!(json["type"], "deposited");
    }
}
