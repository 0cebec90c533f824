// src/overlay/hud.rs
//
// Speed readouts, speed limit sign and button states for the header, plus
// the speed tint, enforcement-camera warning and standstill timer of the
// extended HUD.

use crate::messages::{
    AlertSize, CarParams, CarState, ControlsState, NavInstruction, SpeedLimitSign,
};
use crate::overlay::alert::UiStatus;
use crate::params::{keys, ParamStore};
use serde::Serialize;

pub const SET_SPEED_NA: f32 = 255.0;
pub const KM_TO_MILE: f32 = 0.621371;
pub const MS_TO_KPH: f32 = 3.6;
pub const MS_TO_MPH: f32 = 2.236936;

/// Camera limits at or below this are not enforcement cameras
const MIN_CAMERA_LIMIT: f32 = 21.0;
const CAMERA_LIMIT_MARGIN: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ExperimentalButton {
    pub visible: bool,
    pub checked: bool,
    pub enabled: bool,
}

/// Why the current speed is tinted. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SpeedTint {
    #[default]
    Plain,
    BrakePressed,
    /// Brake lights on with the readout at 0
    BrakeHold,
    GasPressed,
    Decelerating,
    Accelerating,
}

impl SpeedTint {
    pub fn classify(car: &CarState, speed: f32, a_req: f32) -> Self {
        if car.brake_pressed {
            SpeedTint::BrakePressed
        } else if car.brake_lights && speed.round() == 0.0 {
            SpeedTint::BrakeHold
        } else if car.gas_pressed {
            SpeedTint::GasPressed
        } else if a_req < 0.0 {
            SpeedTint::Decelerating
        } else if a_req > 0.0 {
            SpeedTint::Accelerating
        } else {
            SpeedTint::Plain
        }
    }

    /// RGBA of the speed readout. Acceleration tints scale with `a_req`.
    pub fn rgba(&self, a_req: f32) -> [u8; 4] {
        let channel = |v: f32| (255.0 - v).clamp(0.0, 255.0) as u8;
        match self {
            SpeedTint::Plain => [255, 255, 255, 255],
            SpeedTint::BrakePressed => [255, 0, 0, 255],
            SpeedTint::BrakeHold => [0xC9, 0x22, 0x31, 100],
            SpeedTint::GasPressed => [0, 240, 0, 255],
            SpeedTint::Decelerating => {
                let brake = (a_req * 175.0).abs().min(255.0);
                [channel((a_req * 8.0).abs()), channel(brake), channel(brake), 255]
            }
            SpeedTint::Accelerating => {
                let gas = (a_req * 255.0).min(255.0);
                [channel(gas), channel(a_req * 10.0), channel(gas), 255]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StandstillTimer {
    pub minutes: u32,
    pub seconds: u32,
}

impl StandstillTimer {
    pub fn from_millis(elapsed_ms: u64) -> Self {
        let total = (elapsed_ms / 1000) as u32;
        Self {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HudState {
    pub speed: f32,
    pub set_speed: f32,
    pub cruise_set: bool,
    pub is_metric: bool,
    pub speed_unit: &'static str,
    pub speed_limit: f32,
    pub has_us_speed_limit: bool,
    pub has_eu_speed_limit: bool,
    pub hide_dm: bool,
    pub status: UiStatus,
    pub dm_active: bool,
    pub right_hand_dm: bool,
    pub experimental_button: ExperimentalButton,
    pub over_camera_limit: bool,
    pub speed_tint: SpeedTint,
    pub speed_rgba: [u8; 4],
    /// Set while stopped, unless the stock layout is selected
    pub standstill: Option<StandstillTimer>,
}

/// HUD state carried between ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HudMemory {
    /// Latches once the cluster speed has been non-zero, so older logs
    /// without a cluster speed fall back to v_ego
    pub v_ego_cluster_seen: bool,
    pub standstill_since_ms: Option<u64>,
}

pub struct HudInputs<'a> {
    pub controls: &'a ControlsState,
    pub controls_alive: bool,
    pub car: &'a CarState,
    pub nav: Option<&'a NavInstruction>,
    /// Alive and flagged valid by its publisher
    pub nav_usable: bool,
    pub is_metric: bool,
    pub status: UiStatus,
    pub dm_active: bool,
    pub right_hand_dm: bool,
    pub experimental_button: ExperimentalButton,
    /// Requested acceleration, m/s²
    pub a_req: f32,
    pub navi_select: i64,
    /// Stock layout: no tint, no standstill timer
    pub stock_ui: bool,
    pub now_ms: u64,
}

/// True if the controller's own alert covers the DM icon.
pub fn hide_dm(controls: &ControlsState) -> bool {
    controls.alert_size != AlertSize::None
}

/// Driving faster than an enforcement camera ahead allows. Only trusted for
/// external navigation, or for the map app outside section control.
pub fn over_camera_limit(
    navi_select: i64,
    nav: &NavInstruction,
    speed: f32,
    ctrl_speed: f32,
) -> bool {
    let trusted = match navi_select {
        2 => true,
        1 => nav.map_sign != 20 && nav.map_sign != 21,
        _ => false,
    };
    trusted
        && nav.speed_camera_limit > MIN_CAMERA_LIMIT
        && speed > ctrl_speed + CAMERA_LIMIT_MARGIN
}

pub fn reduce_hud(inputs: &HudInputs<'_>, memory: &mut HudMemory) -> HudState {
    let cs = inputs.controls;
    let car = inputs.car;
    let to_display = if inputs.is_metric { MS_TO_KPH } else { MS_TO_MPH };

    let v_cruise = if cs.v_cruise_cluster == 0.0 {
        cs.v_cruise
    } else {
        cs.v_cruise_cluster
    };
    let mut set_speed = if inputs.controls_alive { v_cruise } else { SET_SPEED_NA };
    let cruise_set = set_speed > 0.0 && set_speed.trunc() != SET_SPEED_NA;
    if cruise_set && !inputs.is_metric {
        set_speed *= KM_TO_MILE;
    }

    let v_ego = if car.v_ego_cluster == 0.0 && !memory.v_ego_cluster_seen {
        car.v_ego
    } else {
        memory.v_ego_cluster_seen = true;
        car.v_ego_cluster
    };
    let speed = (if inputs.controls_alive { v_ego.max(0.0) } else { 0.0 }) * to_display;

    let nav = inputs.nav.filter(|_| inputs.nav_usable);
    let (speed_limit, sign) = match nav {
        Some(nav) => (nav.speed_limit * to_display, Some(nav.speed_limit_sign)),
        None => (0.0, None),
    };

    // Without cruise the camera limit itself is the reference
    let over_camera = nav
        .map(|nav| {
            let ctrl_speed = if cruise_set { set_speed } else { nav.speed_camera_limit };
            over_camera_limit(inputs.navi_select, nav, car.v_ego * to_display, ctrl_speed)
        })
        .unwrap_or(false);

    memory.standstill_since_ms = match (car.standstill, memory.standstill_since_ms) {
        (true, Some(since)) => Some(since),
        (true, None) => Some(inputs.now_ms),
        (false, _) => None,
    };
    let standstill = memory
        .standstill_since_ms
        .filter(|_| !inputs.stock_ui)
        .map(|since| StandstillTimer::from_millis(inputs.now_ms.saturating_sub(since)));

    let speed_tint = if inputs.stock_ui {
        SpeedTint::Plain
    } else {
        SpeedTint::classify(car, speed, inputs.a_req)
    };

    HudState {
        speed,
        set_speed,
        cruise_set,
        is_metric: inputs.is_metric,
        speed_unit: if inputs.is_metric { "km/h" } else { "mph" },
        speed_limit,
        has_us_speed_limit: sign == Some(SpeedLimitSign::Mutcd),
        has_eu_speed_limit: sign == Some(SpeedLimitSign::Vienna),
        hide_dm: hide_dm(cs),
        status: inputs.status,
        dm_active: inputs.dm_active,
        right_hand_dm: inputs.right_hand_dm,
        experimental_button: inputs.experimental_button,
        over_camera_limit: over_camera,
        speed_tint,
        speed_rgba: speed_tint.rgba(inputs.a_req),
        standstill,
    }
}

/// Experimental-mode toggle: shown while engageable or engaged, enabled only
/// once the user confirmed it and the car supports the planner.
pub fn experimental_button(
    cs: &ControlsState,
    car_params: Option<&CarParams>,
    params: &dyn ParamStore,
) -> ExperimentalButton {
    let available = match car_params {
        Some(cp) if cp.experimental_longitudinal_available => {
            params.get_bool(keys::EXPERIMENTAL_LONGITUDINAL_ENABLED)
        }
        Some(cp) => cp.openpilot_longitudinal_control,
        None => false,
    };
    ExperimentalButton {
        visible: cs.engageable || cs.enabled,
        checked: cs.experimental_mode,
        enabled: params.get_bool(keys::EXPERIMENTAL_MODE_CONFIRMED) && available,
    }
}
