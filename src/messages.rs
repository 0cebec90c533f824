// src/messages.rs
//
// Typed payloads for every topic the scene pipeline subscribes to.
// Payloads cross the bus as JSON; every field has a default so that partial
// or older messages still decode.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// TOPICS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "modelV2")]
    ModelV2,
    #[serde(rename = "uiPlan")]
    UiPlan,
    #[serde(rename = "radarState")]
    RadarState,
    #[serde(rename = "driverMonitoringState")]
    DriverMonitoringState,
    #[serde(rename = "driverStateV2")]
    DriverStateV2,
    #[serde(rename = "carState")]
    CarState,
    #[serde(rename = "controlsState")]
    ControlsState,
    #[serde(rename = "liveCalibration")]
    LiveCalibration,
    #[serde(rename = "navInstruction")]
    NavInstruction,
    #[serde(rename = "carParams")]
    CarParams,
    #[serde(rename = "uiDebug")]
    UiDebug,
}

impl Topic {
    /// Topics consumed by the scene pipeline (uiDebug is produced, not sampled).
    pub const SUBSCRIBED: [Topic; 10] = [
        Topic::ModelV2,
        Topic::UiPlan,
        Topic::RadarState,
        Topic::DriverMonitoringState,
        Topic::DriverStateV2,
        Topic::CarState,
        Topic::ControlsState,
        Topic::LiveCalibration,
        Topic::NavInstruction,
        Topic::CarParams,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Topic::ModelV2 => "modelV2",
            Topic::UiPlan => "uiPlan",
            Topic::RadarState => "radarState",
            Topic::DriverMonitoringState => "driverMonitoringState",
            Topic::DriverStateV2 => "driverStateV2",
            Topic::CarState => "carState",
            Topic::ControlsState => "controlsState",
            Topic::LiveCalibration => "liveCalibration",
            Topic::NavInstruction => "navInstruction",
            Topic::CarParams => "carParams",
            Topic::UiDebug => "uiDebug",
        }
    }

    /// Nominal publish rate in Hz, used for the liveness window.
    pub fn frequency_hz(&self) -> f32 {
        match self {
            Topic::ModelV2
            | Topic::UiPlan
            | Topic::RadarState
            | Topic::DriverMonitoringState
            | Topic::DriverStateV2
            | Topic::UiDebug => 20.0,
            Topic::CarState | Topic::ControlsState => 100.0,
            Topic::LiveCalibration => 4.0,
            Topic::NavInstruction => 1.0,
            Topic::CarParams => 0.02,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::SUBSCRIBED
            .iter()
            .chain(std::iter::once(&Topic::UiDebug))
            .find(|t| t.name() == s)
            .copied()
            .ok_or_else(|| format!("unknown topic '{}'", s))
    }
}

// ============================================================================
// MODEL / PLAN
// ============================================================================

/// A trajectory sampled at fixed time indices (x forward, y right, z down).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XyztData {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
    pub z: Vec<f32>,
}

impl XyztData {
    pub fn len(&self) -> usize {
        self.x.len().min(self.y.len()).min(self.z.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelV2 {
    pub frame_id: u32,
    pub position: XyztData,
    pub lane_lines: Vec<XyztData>,
    pub lane_line_probs: Vec<f32>,
    pub road_edges: Vec<XyztData>,
    pub road_edge_stds: Vec<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPlan {
    pub position: XyztData,
    /// Planned acceleration aligned with `position` indices
    pub accel: Vec<f32>,
}

// ============================================================================
// RADAR
// ============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadData {
    pub d_rel: f32,
    pub y_rel: f32,
    pub v_rel: f32,
    pub status: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadarState {
    pub lead_one: LeadData,
    pub lead_two: LeadData,
}

// ============================================================================
// DRIVER MONITORING
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverMonitoringState {
    pub is_active_mode: bool,
    #[serde(rename = "isRHD")]
    pub is_rhd: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverData {
    /// Pitch, yaw, roll in radians
    pub face_orientation: Vec<f32>,
    pub face_orientation_std: Vec<f32>,
    /// Normalised x, y of the face in the driver camera
    pub face_position: Vec<f32>,
    pub face_prob: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DriverStateV2 {
    pub wheel_on_right_prob: f32,
    pub left_driver_data: DriverData,
    pub right_driver_data: DriverData,
}

impl DriverStateV2 {
    pub fn driver(&self, is_rhd: bool) -> &DriverData {
        if is_rhd {
            &self.right_driver_data
        } else {
            &self.left_driver_data
        }
    }
}

// ============================================================================
// CAR / CONTROLS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarState {
    pub v_ego: f32,
    pub v_ego_cluster: f32,
    /// Distance reported by the stock radar; 255 when nothing is tracked
    pub radar_distance: f32,
    pub brake_pressed: bool,
    pub brake_lights: bool,
    pub gas_pressed: bool,
    pub standstill: bool,
}

impl Default for CarState {
    fn default() -> Self {
        Self {
            v_ego: 0.0,
            v_ego_cluster: 0.0,
            radar_distance: 255.0,
            brake_pressed: false,
            brake_lights: false,
            gas_pressed: false,
            standstill: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OpState {
    #[default]
    Disabled,
    PreEnabled,
    Enabled,
    SoftDisabling,
    Overriding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertSize {
    #[default]
    None,
    Small,
    Mid,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertStatus {
    #[default]
    Normal,
    UserPrompt,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlsState {
    pub enabled: bool,
    pub engageable: bool,
    pub experimental_mode: bool,
    pub state: OpState,
    pub v_cruise: f32,
    pub v_cruise_cluster: f32,
    pub alert_text1: String,
    pub alert_text2: String,
    pub alert_type: String,
    pub alert_size: AlertSize,
    pub alert_status: AlertStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarParams {
    pub experimental_longitudinal_available: bool,
    pub openpilot_longitudinal_control: bool,
}

// ============================================================================
// CALIBRATION / NAVIGATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalStatus {
    #[default]
    Uncalibrated,
    Calibrated,
    Invalid,
    Recalibrating,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiveCalibration {
    pub cal_status: CalStatus,
    /// Roll, pitch, yaw of the device relative to the road frame (radians)
    pub rpy_calib: Vec<f32>,
    /// Euler angles from device to wide camera; empty when not provided
    pub wide_from_device_euler: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpeedLimitSign {
    #[default]
    Mutcd,
    Vienna,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavInstruction {
    /// m/s
    pub speed_limit: f32,
    pub speed_limit_sign: SpeedLimitSign,
    /// Enforcement camera limit in display units, 0 when none ahead
    pub speed_camera_limit: f32,
    /// Map sign code of the camera; 20 and 21 are section-control signs
    pub map_sign: i32,
}

// ============================================================================
// PRODUCED
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiDebug {
    pub frame: u64,
    pub draw_time_millis: f64,
    pub fps: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_names_parse() {
        for topic in Topic::SUBSCRIBED {
            assert_eq!(topic.name().parse::<Topic>().unwrap(), topic);
        }
        assert!("bogus".parse::<Topic>().is_err());
    }

    #[test]
    fn test_partial_payload_uses_defaults() {
        let cs: ControlsState =
            serde_json::from_str(r#"{"enabled": true, "alertSize": "mid"}"#).unwrap();
        assert!(cs.enabled);
        assert_eq!(cs.alert_size, AlertSize::Mid);
        assert_eq!(cs.alert_status, AlertStatus::Normal);

        let car: CarState = serde_json::from_str(r#"{"vEgo": 3.5}"#).unwrap();
        assert_eq!(car.v_ego, 3.5);
        assert_eq!(car.radar_distance, 255.0);
    }
}
