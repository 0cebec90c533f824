// src/pipeline/event_bus.rs
//
// Notable scene transitions, queued for whoever drives the pipeline.
// Reducers stay pure; the orchestrator publishes here.

use crate::calibration::CameraKind;
use crate::messages::Topic;
use crate::overlay::alert::{Alert, UiStatus};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::warn;

#[derive(Debug, Clone, Serialize)]
pub enum SceneEvent {
    AlertChanged {
        frame: u64,
        alert: Alert,
        background: UiStatus,
    },

    CameraSwitched {
        frame: u64,
        from: CameraKind,
        to: CameraKind,
        v_ego: f32,
    },

    SlowFrame {
        frame: u64,
        fps: f64,
    },

    /// Calibration became invalid; projection uses the default matrix
    CalibrationFallback {
        frame: u64,
    },

    DecodeFailed {
        frame: u64,
        topic: Topic,
    },
}

pub struct EventBus {
    events: VecDeque<SceneEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new(max_pending: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_pending),
            max_pending,
        }
    }

    pub fn publish(&mut self, event: SceneEvent) {
        if self.events.len() >= self.max_pending {
            warn!(
                "Event bus full ({} events), dropping oldest",
                self.max_pending
            );
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    pub fn drain(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_bus_drops_oldest() {
        let mut bus = EventBus::new(2);
        for frame in 1..=3 {
            bus.publish(SceneEvent::SlowFrame { frame, fps: 10.0 });
        }
        assert_eq!(bus.pending_count(), 2);
        let frames: Vec<u64> = bus
            .drain()
            .into_iter()
            .map(|e| match e {
                SceneEvent::SlowFrame { frame, .. } => frame,
                _ => 0,
            })
            .collect();
        assert_eq!(frames, vec![2, 3]);
        assert_eq!(bus.pending_count(), 0);
    }
}
