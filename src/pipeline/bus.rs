// src/pipeline/bus.rs
//
// Latest-value message bus. Publishers overwrite, readers copy. Nothing
// queues: a reader that falls behind only ever sees the newest message.

use crate::messages::Topic;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub value: Value,
    /// Per-topic sequence number, starting at 1
    pub seq: u64,
    pub recv_time_ms: u64,
    /// Publisher's own validity flag
    pub valid: bool,
}

pub trait MessageBus: Send + Sync {
    fn latest(&self, topic: Topic) -> Option<Envelope>;

    /// Publish `value` on `topic`, returning its sequence number.
    fn publish(&self, topic: Topic, value: Value, recv_time_ms: u64, valid: bool) -> u64;

    /// Latest envelope for each of `topics` in one pass.
    fn snapshot(&self, topics: &[Topic]) -> HashMap<Topic, Envelope> {
        topics
            .iter()
            .filter_map(|&t| self.latest(t).map(|e| (t, e)))
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBus {
    latest: Mutex<HashMap<Topic, Envelope>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageBus for InMemoryBus {
    fn latest(&self, topic: Topic) -> Option<Envelope> {
        self.latest.lock().get(&topic).cloned()
    }

    fn publish(&self, topic: Topic, value: Value, recv_time_ms: u64, valid: bool) -> u64 {
        let mut latest = self.latest.lock();
        let seq = latest.get(&topic).map(|e| e.seq + 1).unwrap_or(1);
        latest.insert(
            topic,
            Envelope {
                value,
                seq,
                recv_time_ms,
                valid,
            },
        );
        seq
    }

    // Whole map copied under a single lock
    fn snapshot(&self, topics: &[Topic]) -> HashMap<Topic, Envelope> {
        let latest = self.latest.lock();
        topics
            .iter()
            .filter_map(|t| latest.get(t).map(|e| (*t, e.clone())))
            .collect()
    }
}
