// src/calibration.rs
//
// Camera → screen projection under live calibration.
//
// Two calibrations are tracked, one per road camera (narrow / wide). The
// active one is chosen by a speed-hysteretic selector: the wide camera is
// requested at low speed and released only once the car is clearly faster,
// so a car cruising inside the band never flips between streams.
//
// Frames:
//   calib frame  x forward, y right, z down (road-aligned)
//   device frame same axes, rotated by the mounting rpy
//   view frame   x right, y down, z forward (camera optical axis)

use crate::error::SceneError;
use crate::messages::{CalStatus, LiveCalibration};
use crate::params::{keys, ParamStore};
use crate::types::{CalibrationConfig, Point2, Viewport};
use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::Serialize;
use tracing::{debug, info, warn};

/// View frame from device frame: swaps axes so z points along the optical axis.
pub fn view_from_device() -> Matrix3<f32> {
    Matrix3::new(
        0.0, 1.0, 0.0, //
        0.0, 0.0, 1.0, //
        1.0, 0.0, 0.0,
    )
}

/// Rotation for roll/pitch/yaw applied in that order (R = Rz·Ry·Rx).
pub fn euler_to_rot(rpy: [f32; 3]) -> Matrix3<f32> {
    Rotation3::from_euler_angles(rpy[0], rpy[1], rpy[2]).into_inner()
}

fn euler_from_slice(values: &[f32]) -> Option<[f32; 3]> {
    match values {
        [r, p, y] => Some([*r, *p, *y]),
        _ => None,
    }
}

// ============================================================================
// CAMERA SELECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CameraKind {
    #[default]
    Narrow,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CameraSelect {
    #[default]
    Uninitialized,
    NarrowActive,
    WideActive,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraSelectInputs {
    pub v_ego: f32,
    pub has_wide_stream: bool,
    pub stream_count: usize,
    pub experimental_mode: bool,
    pub wide_valid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraSelector {
    state: CameraSelect,
    wide_requested: bool,
    wide_below_speed: f32,
    narrow_above_speed: f32,
}

impl CameraSelector {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            state: CameraSelect::Uninitialized,
            wide_requested: false,
            wide_below_speed: config.wide_below_speed,
            narrow_above_speed: config.narrow_above_speed,
        }
    }

    pub fn state(&self) -> CameraSelect {
        self.state
    }

    pub fn camera(&self) -> CameraKind {
        match self.state {
            CameraSelect::WideActive => CameraKind::Wide,
            _ => CameraKind::Narrow,
        }
    }

    /// Advance the selector by one tick and return the camera to draw.
    pub fn update(&mut self, inputs: CameraSelectInputs) -> CameraKind {
        if inputs.has_wide_stream {
            if inputs.v_ego < self.wide_below_speed || inputs.stream_count == 1 {
                self.wide_requested = true;
            } else if inputs.v_ego > self.narrow_above_speed {
                self.wide_requested = false;
            }
            // The request itself is gated, so a dropped gate must be
            // re-earned below the low threshold.
            self.wide_requested =
                self.wide_requested && inputs.experimental_mode && inputs.wide_valid;
        } else {
            self.wide_requested = false;
        }

        let next = if self.wide_requested {
            CameraSelect::WideActive
        } else {
            CameraSelect::NarrowActive
        };
        if next != self.state {
            if self.state != CameraSelect::Uninitialized {
                info!(
                    "Camera switch {:?} -> {:?} at v_ego={:.1}",
                    self.state, next, inputs.v_ego
                );
            }
            self.state = next;
        }
        self.camera()
    }
}

// ============================================================================
// CALIBRATION STATE
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationState {
    view_from_calib: Matrix3<f32>,
    view_from_wide_calib: Matrix3<f32>,
    pub valid: bool,
    pub wide_valid: bool,
    pub camera: CameraKind,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            view_from_calib: view_from_device(),
            view_from_wide_calib: view_from_device(),
            valid: false,
            wide_valid: false,
            camera: CameraKind::Narrow,
        }
    }
}

impl CalibrationState {
    /// Seed from the persisted calibration blob, if one is stored and parses.
    pub fn from_params(params: &dyn ParamStore) -> Self {
        let mut state = Self::default();
        match load_persisted(params) {
            Ok(Some(calib)) => {
                state.apply(&calib);
                debug!("Seeded calibration from persisted params (valid={})", state.valid);
            }
            Ok(None) => {}
            Err(e) => warn!("{}, ignoring", e),
        }
        state
    }

    /// Apply a liveCalibration message.
    pub fn apply(&mut self, calib: &LiveCalibration) {
        let device_from_calib = euler_from_slice(&calib.rpy_calib)
            .map(euler_to_rot)
            .unwrap_or_else(Matrix3::identity);
        let wide_euler = euler_from_slice(&calib.wide_from_device_euler);
        let wide_from_device = wide_euler.map(euler_to_rot).unwrap_or_else(Matrix3::identity);

        self.view_from_calib = view_from_device() * device_from_calib;
        self.view_from_wide_calib = view_from_device() * wide_from_device * device_from_calib;
        self.valid = calib.cal_status == CalStatus::Calibrated && calib.rpy_calib.len() == 3;
        self.wide_valid = wide_euler.is_some();
    }

    /// Matrix used for projection: the selected camera's calibration, or the
    /// fixed default when calibration is invalid.
    pub fn active_view(&self) -> Matrix3<f32> {
        if !self.valid {
            return view_from_device();
        }
        match self.camera {
            CameraKind::Narrow => self.view_from_calib,
            CameraKind::Wide => self.view_from_wide_calib,
        }
    }

    pub fn projector(&self, config: &CalibrationConfig, viewport: Viewport) -> Projector {
        Projector::new(self.active_view(), self.camera, config, viewport)
    }
}

/// Read the `CalibrationParams` blob. A missing key is `Ok(None)`.
pub fn load_persisted(params: &dyn ParamStore) -> Result<Option<LiveCalibration>, SceneError> {
    let Some(raw) = params.get(keys::CALIBRATION_PARAMS) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| SceneError::MalformedPersistedState {
            key: keys::CALIBRATION_PARAMS.to_string(),
            source,
        })
}

const MOUNTING_TEXT: &str = "The device must be mounted within 4° left or right and within 5° up \
    or 8° down. Calibration runs continuously; resetting is rarely required.";

/// `%g` with precision 1: one significant digit, scientific notation
/// outside [1e-4, 10).
fn one_significant_digit(x: f32) -> String {
    if x == 0.0 || !x.is_finite() {
        return format!("{}", x);
    }
    let mut exp = x.abs().log10().floor() as i32;
    let mut mantissa = (x / 10f32.powi(exp)).round();
    if mantissa.abs() >= 10.0 {
        mantissa /= 10.0;
        exp += 1;
    }
    if !(-4..1).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exp.abs())
    } else {
        format!("{:.*}", (-exp) as usize, mantissa * 10f32.powi(exp))
    }
}

/// Human-readable mounting summary. Falls back to the base text when the
/// persisted calibration is absent, uncalibrated or malformed.
pub fn mounting_description(params: &dyn ParamStore) -> String {
    let mut desc = MOUNTING_TEXT.to_string();
    match load_persisted(params) {
        Ok(Some(calib)) if calib.cal_status != CalStatus::Uncalibrated => {
            if let Some([_, pitch, yaw]) = euler_from_slice(&calib.rpy_calib) {
                let pitch = pitch.to_degrees();
                let yaw = yaw.to_degrees();
                desc.push_str(&format!(
                    " Your device is pointed {}° {} and {}° {}.",
                    one_significant_digit(pitch.abs()),
                    if pitch > 0.0 { "down" } else { "up" },
                    one_significant_digit(yaw.abs()),
                    if yaw > 0.0 { "left" } else { "right" },
                ));
            }
        }
        Ok(_) => {}
        Err(e) => info!("{}", e),
    }
    desc
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Projection for one tick: calibration, intrinsics and the car-space
/// transform that fits the camera image to the viewport.
#[derive(Debug, Clone)]
pub struct Projector {
    view: Matrix3<f32>,
    intrinsics: Matrix3<f32>,
    zoom: f32,
    offset: Point2,
    viewport: Viewport,
    clip_margin: f32,
}

impl Projector {
    pub fn new(
        view: Matrix3<f32>,
        camera: CameraKind,
        config: &CalibrationConfig,
        viewport: Viewport,
    ) -> Self {
        let (focal, zoom) = match camera {
            CameraKind::Narrow => (config.narrow_focal_length, config.narrow_zoom),
            CameraKind::Wide => (config.wide_focal_length, config.wide_zoom),
        };
        let [cx, cy] = config.principal_point;
        let intrinsics = Matrix3::new(
            focal, 0.0, cx, //
            0.0, focal, cy, //
            0.0, 0.0, 1.0,
        );

        // Centre the vanishing point, without letting the frame leave the screen
        let inf = intrinsics * view * Vector3::new(1000.0, 0.0, 0.0);
        let (raw_x, raw_y) = if inf.z.abs() > f32::EPSILON {
            ((inf.x / inf.z - cx) * zoom, (inf.y / inf.z - cy) * zoom)
        } else {
            (0.0, 0.0)
        };
        let center = viewport.center();
        let max_x = (cx * zoom - center.x - 5.0).max(0.0);
        let max_y = (cy * zoom - center.y - 5.0).max(0.0);

        Self {
            view,
            intrinsics,
            zoom,
            offset: Point2::new(raw_x.clamp(-max_x, max_x), raw_y.clamp(-max_y, max_y)),
            viewport,
            clip_margin: config.clip_margin,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Project a calib-frame point to screen space. `None` if the point is
    /// behind the camera or lands outside the clip region.
    pub fn project(&self, p: Vector3<f32>) -> Option<Point2> {
        let kep = self.intrinsics * (self.view * p);
        if kep.z <= 1e-6 {
            return None;
        }
        let [cx, cy] = [self.intrinsics[(0, 2)], self.intrinsics[(1, 2)]];
        let u = kep.x / kep.z;
        let v = kep.y / kep.z;
        let center = self.viewport.center();
        let point = Point2::new(
            center.x - self.offset.x + self.zoom * (u - cx),
            center.y - self.offset.y + self.zoom * (v - cy),
        );
        if self.viewport.contains_with_margin(point, self.clip_margin) {
            Some(point)
        } else {
            None
        }
    }

    pub fn project_xyz(&self, x: f32, y: f32, z: f32) -> Option<Point2> {
        self.project(Vector3::new(x, y, z))
    }
}
