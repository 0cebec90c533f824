// src/pipeline/sampler.rs
//
// Fixed-rate input sampler. Once per tick it copies the latest message of
// every subscribed topic off the bus, decodes the ones that changed, and
// records per-topic liveness. It never waits for data.

use crate::error::SceneError;
use crate::messages::Topic;
use crate::pipeline::bus::MessageBus;
use crate::pipeline::snapshot::{SceneSnapshot, TopicStatus};
use crate::types::SamplerConfig;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

fn decode<T: DeserializeOwned>(topic: Topic, value: &Value) -> Result<T, SceneError> {
    T::deserialize(value).map_err(|source| SceneError::Decode { topic, source })
}

pub struct Sampler {
    topics: Vec<Topic>,
    liveness_factor: f32,
    frame: u64,
    started_frame: u64,
    last_seq: HashMap<Topic, u64>,
    rcv_frames: HashMap<Topic, u64>,
    /// Decoded payloads carried between ticks
    cache: SceneSnapshot,
}

impl Sampler {
    pub fn new(config: &SamplerConfig) -> Self {
        Self::with_topics(config, Topic::SUBSCRIBED.to_vec())
    }

    pub fn with_topics(config: &SamplerConfig, topics: Vec<Topic>) -> Self {
        Self {
            topics,
            liveness_factor: config.liveness_factor,
            frame: 0,
            started_frame: 0,
            last_seq: HashMap::new(),
            rcv_frames: HashMap::new(),
            cache: SceneSnapshot::default(),
        }
    }

    /// Start a new drive: messages received up to now count as stale.
    pub fn mark_started(&mut self) {
        self.started_frame = self.frame;
        debug!("Sampler started at frame {}", self.frame);
    }

    pub fn sample(&mut self, bus: &dyn MessageBus, now_ms: u64) -> SceneSnapshot {
        self.frame += 1;
        let latest = bus.snapshot(&self.topics);
        let mut status = BTreeMap::new();
        let mut decode_failures = Vec::new();

        for topic in self.topics.clone() {
            let Some(envelope) = latest.get(&topic) else {
                status.insert(topic, TopicStatus::default());
                continue;
            };

            let last_seq = self.last_seq.get(&topic).copied().unwrap_or(0);
            let updated = envelope.seq > last_seq;
            if updated {
                self.last_seq.insert(topic, envelope.seq);
                self.rcv_frames.insert(topic, self.frame);
                if let Err(e) = self.store(topic, &envelope.value) {
                    warn!("{}, treating as absent", e);
                    self.clear(topic);
                    decode_failures.push(topic);
                }
            }

            let window_ms = (self.liveness_factor / topic.frequency_hz() * 1000.0) as u64;
            status.insert(
                topic,
                TopicStatus {
                    alive: now_ms.saturating_sub(envelope.recv_time_ms) <= window_ms,
                    updated,
                    rcv_frame: self.rcv_frames.get(&topic).copied(),
                    rcv_time_ms: Some(envelope.recv_time_ms),
                    seq: envelope.seq,
                    valid: envelope.valid,
                },
            );
        }

        SceneSnapshot {
            frame: self.frame,
            started_frame: self.started_frame,
            now_ms,
            status,
            decode_failures,
            ..self.cache.clone()
        }
    }

    fn store(&mut self, topic: Topic, value: &Value) -> Result<(), SceneError> {
        let c = &mut self.cache;
        match topic {
            Topic::ModelV2 => c.model = Some(decode(topic, value)?),
            Topic::UiPlan => c.plan = Some(decode(topic, value)?),
            Topic::RadarState => c.radar = Some(decode(topic, value)?),
            Topic::DriverMonitoringState => c.dm_state = Some(decode(topic, value)?),
            Topic::DriverStateV2 => c.driver_state = Some(decode(topic, value)?),
            Topic::CarState => c.car_state = Some(decode(topic, value)?),
            Topic::ControlsState => c.controls = Some(decode(topic, value)?),
            Topic::LiveCalibration => c.calibration = Some(decode(topic, value)?),
            Topic::NavInstruction => c.nav = Some(decode(topic, value)?),
            Topic::CarParams => c.car_params = Some(decode(topic, value)?),
            Topic::UiDebug => {}
        }
        Ok(())
    }

    fn clear(&mut self, topic: Topic) {
        let c = &mut self.cache;
        match topic {
            Topic::ModelV2 => c.model = None,
            Topic::UiPlan => c.plan = None,
            Topic::RadarState => c.radar = None,
            Topic::DriverMonitoringState => c.dm_state = None,
            Topic::DriverStateV2 => c.driver_state = None,
            Topic::CarState => c.car_state = None,
            Topic::ControlsState => c.controls = None,
            Topic::LiveCalibration => c.calibration = None,
            Topic::NavInstruction => c.nav = None,
            Topic::CarParams => c.car_params = None,
            Topic::UiDebug => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bus::InMemoryBus;
    use serde_json::json;

    #[test]
    fn test_updated_only_once_per_message() {
        let bus = InMemoryBus::new();
        let mut sampler = Sampler::new(&SamplerConfig::default());

        let snap = sampler.sample(&bus, 0);
        assert!(!snap.alive(Topic::CarState));
        assert!(!snap.updated(Topic::CarState));
        assert!(snap.car_state.is_none());

        bus.publish(Topic::CarState, json!({"vEgo": 12.0}), 10, true);
        let snap = sampler.sample(&bus, 20);
        assert!(snap.updated(Topic::CarState));
        assert_eq!(snap.status(Topic::CarState).rcv_frame, Some(2));
        assert_eq!(snap.car_state.as_ref().map(|c| c.v_ego), Some(12.0));

        let snap = sampler.sample(&bus, 30);
        assert!(!snap.updated(Topic::CarState));
        assert!(snap.alive(Topic::CarState));
        // Last value is still visible
        assert_eq!(snap.car_state.as_ref().map(|c| c.v_ego), Some(12.0));
        assert_eq!(snap.status(Topic::CarState).rcv_frame, Some(2));
    }

    #[test]
    fn test_liveness_window_scales_with_frequency() {
        let bus = InMemoryBus::new();
        let mut sampler = Sampler::new(&SamplerConfig::default());
        bus.publish(Topic::CarState, json!({}), 0, true);
        bus.publish(Topic::LiveCalibration, json!({}), 0, true);

        // carState at 100 Hz: 100 ms window; liveCalibration at 4 Hz: 2.5 s
        let snap = sampler.sample(&bus, 150);
        assert!(!snap.alive(Topic::CarState));
        assert!(snap.alive(Topic::LiveCalibration));
        let snap = sampler.sample(&bus, 2_600);
        assert!(!snap.alive(Topic::LiveCalibration));
    }

    #[test]
    fn test_decode_failure_treated_as_absent() {
        let bus = InMemoryBus::new();
        let mut sampler = Sampler::new(&SamplerConfig::default());
        bus.publish(Topic::ModelV2, json!({"frameId": 3}), 0, true);
        let snap = sampler.sample(&bus, 0);
        assert_eq!(snap.model.as_ref().map(|m| m.frame_id), Some(3));

        bus.publish(Topic::ModelV2, json!("garbage"), 50, true);
        let snap = sampler.sample(&bus, 50);
        assert!(snap.model.is_none());
        assert_eq!(snap.decode_failures, vec![Topic::ModelV2]);

        let snap = sampler.sample(&bus, 60);
        assert!(snap.decode_failures.is_empty());
    }

    #[test]
    fn test_started_frame_gates_old_messages() {
        let bus = InMemoryBus::new();
        let mut sampler = Sampler::new(&SamplerConfig::default());
        bus.publish(Topic::DriverStateV2, json!({}), 0, true);
        sampler.sample(&bus, 0);
        sampler.mark_started();

        let snap = sampler.sample(&bus, 50);
        assert!(!snap.received_since_start(Topic::DriverStateV2));

        bus.publish(Topic::DriverStateV2, json!({}), 60, true);
        let snap = sampler.sample(&bus, 100);
        assert!(snap.received_since_start(Topic::DriverStateV2));
    }
}
