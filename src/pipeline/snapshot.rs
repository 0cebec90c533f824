// src/pipeline/snapshot.rs
//
// Everything the reducers may read on one tick. A snapshot is built once by
// the sampler and then only read; the next tick gets a new one.

use crate::messages::{
    CarParams, CarState, ControlsState, DriverMonitoringState, DriverStateV2, LiveCalibration,
    ModelV2, NavInstruction, RadarState, Topic, UiPlan,
};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TopicStatus {
    /// Received within the topic's liveness window
    pub alive: bool,
    /// A new message arrived since the previous tick
    pub updated: bool,
    /// Frame on which the latest message was first observed
    pub rcv_frame: Option<u64>,
    pub rcv_time_ms: Option<u64>,
    pub seq: u64,
    pub valid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SceneSnapshot {
    pub frame: u64,
    pub started_frame: u64,
    pub now_ms: u64,
    pub status: BTreeMap<Topic, TopicStatus>,

    pub model: Option<ModelV2>,
    pub plan: Option<UiPlan>,
    pub radar: Option<RadarState>,
    pub dm_state: Option<DriverMonitoringState>,
    pub driver_state: Option<DriverStateV2>,
    pub car_state: Option<CarState>,
    pub controls: Option<ControlsState>,
    pub calibration: Option<LiveCalibration>,
    pub nav: Option<NavInstruction>,
    pub car_params: Option<CarParams>,

    /// Payloads that failed to decode this tick
    pub decode_failures: Vec<Topic>,
}

impl SceneSnapshot {
    pub fn status(&self, topic: Topic) -> TopicStatus {
        self.status.get(&topic).copied().unwrap_or_default()
    }

    pub fn alive(&self, topic: Topic) -> bool {
        self.status(topic).alive
    }

    pub fn updated(&self, topic: Topic) -> bool {
        self.status(topic).updated
    }

    /// Strictly after the start frame; used to gate drawing.
    pub fn received_since_start(&self, topic: Topic) -> bool {
        self.status(topic)
            .rcv_frame
            .map(|f| f > self.started_frame)
            .unwrap_or(false)
    }
}
