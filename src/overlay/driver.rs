// src/overlay/driver.rs
//
// Driver-monitoring icon: a face outline turned to follow the driver's head
// pose, plus two tracking arcs. The pose flattens out and the icon dims as
// the monitoring system goes passive. Also the driver camera preview with
// its detected face box.

use crate::messages::{DriverMonitoringState, DriverStateV2};
use crate::smoother::{FadeFilter, PoseSmoother};
use crate::types::{DisplayConfig, DriverConfig, Point2, Viewport};
use nalgebra::{Matrix3, Vector3};
use serde::Serialize;

/// Depth of the neutral face plane
const FACE_DEPTH: f32 = 8.0;

/// Closed face outline in icon space.
const DEFAULT_FACE_KPTS: [[f32; 2]; 33] = [
    [-5.98, -51.20], [-17.64, -49.14], [-23.81, -46.40], [-29.98, -40.91], [-32.04, -37.49],
    [-34.10, -32.00], [-36.16, -21.03], [-36.16, 6.40], [-35.47, 10.51], [-32.73, 19.43],
    [-29.30, 26.29], [-24.50, 33.83], [-19.01, 41.37], [-14.21, 46.17], [-12.16, 47.54],
    [-4.61, 49.60], [4.99, 49.60], [12.53, 47.54], [14.59, 46.17], [19.39, 41.37],
    [24.87, 33.83], [29.67, 26.29], [33.10, 19.43], [35.84, 10.51], [36.53, 6.40],
    [36.53, -21.03], [34.47, -32.00], [32.42, -37.49], [30.36, -40.91], [24.19, -46.40],
    [18.02, -49.14], [6.36, -51.20], [-5.98, -51.20],
];

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RectF {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Half-ellipse drawn inside `rect`, starting at `start_deg` (counter-clockwise
/// from 3 o'clock) and sweeping `span_deg`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PoseArc {
    pub rect: RectF,
    pub start_deg: f32,
    pub span_deg: f32,
    pub thickness: f32,
    pub alpha: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FaceState {
    pub keypoints: Vec<Point2>,
    pub anchor: Point2,
    pub fade: f32,
    pub icon_opacity: f32,
    pub is_rhd: bool,
    pub active: bool,
    pub sins: [f32; 3],
    pub diffs: [f32; 3],
    /// Yaw arc then pitch arc
    pub arcs: [PoseArc; 2],
}

/// Advance the fade scalar. Runs every tick, whether or not the icon is drawn.
pub fn update_fade(fade: &mut FadeFilter, dm_state: Option<&DriverMonitoringState>) -> f32 {
    fade.update(dm_state.map(|s| s.is_active_mode).unwrap_or(false))
}

/// Icon centre, bottom-left or bottom-right depending on the driver's side.
pub fn icon_anchor(display: &DisplayConfig, viewport: Viewport, is_rhd: bool) -> Point2 {
    let inset = (display.button_size - 24.0) / 2.0 + display.border * 2.0;
    let x = if is_rhd {
        (viewport.width - 1.0) - inset
    } else {
        inset
    };
    Point2::new(x, (viewport.height - 1.0) - display.footer_height / 2.0)
}

fn face_rotation(sins: &[f32; 3], coss: &[f32; 3]) -> Matrix3<f32> {
    let (s0, s1, s2) = (sins[0], sins[1], sins[2]);
    let (c0, c1, c2) = (coss[0], coss[1], coss[2]);
    Matrix3::new(
        c1 * c2, c1 * s2, -s1, //
        -s0 * s1 * c2 - c0 * s2, -s0 * s1 * s2 + c0 * c2, -s0 * c1, //
        c0 * s1 * c2 - s0 * s2, c0 * s1 * s2 + s0 * c2, c0 * c1,
    )
}

pub fn reduce_driver(
    pose: &mut PoseSmoother,
    fade: f32,
    dm_state: &DriverMonitoringState,
    driver_state: &DriverStateV2,
    config: &DriverConfig,
    display: &DisplayConfig,
    viewport: Viewport,
) -> FaceState {
    let is_rhd = dm_state.is_rhd;
    let raw = &driver_state.driver(is_rhd).face_orientation;
    let orientation = [0usize, 1, 2].map(|i| raw.get(i).copied().unwrap_or(0.0));
    pose.update(orientation, fade, config.pose_alpha);

    let anchor = icon_anchor(display, viewport, is_rhd);
    let rotation = face_rotation(&pose.sins, &pose.coss);
    let keypoints = DEFAULT_FACE_KPTS
        .iter()
        .map(|&[x, y]| {
            let p = rotation * Vector3::new(x, y, FACE_DEPTH);
            let z = p.z * (1.0 - fade) + FACE_DEPTH * fade;
            let kp = (z - FACE_DEPTH) / 120.0 + 1.0;
            Point2::new(p.x * kp + anchor.x, p.y * kp + anchor.y)
        })
        .collect();

    let arc_l = config.arc_length;
    let alpha = 0.4 * (1.0 - fade);
    let thickness =
        |diff: f32| config.arc_thickness + config.arc_thickness_extend * (5.0 * diff).min(1.0);
    let delta_x = -pose.sins[1] * arc_l / 2.0;
    let delta_y = -pose.sins[0] * arc_l / 2.0;
    let yaw_arc = PoseArc {
        rect: RectF {
            x: (anchor.x + delta_x).min(anchor.x),
            y: anchor.y - arc_l / 2.0,
            width: delta_x.abs(),
            height: arc_l,
        },
        start_deg: if pose.sins[1] > 0.0 { 90.0 } else { -90.0 },
        span_deg: 180.0,
        thickness: thickness(pose.diffs[1]),
        alpha,
    };
    let pitch_arc = PoseArc {
        rect: RectF {
            x: anchor.x - arc_l / 2.0,
            y: (anchor.y + delta_y).min(anchor.y),
            width: arc_l,
            height: delta_y.abs(),
        },
        start_deg: if pose.sins[0] > 0.0 { 0.0 } else { 180.0 },
        span_deg: 180.0,
        thickness: thickness(pose.diffs[0]),
        alpha,
    };

    FaceState {
        keypoints,
        anchor,
        fade,
        icon_opacity: if dm_state.is_active_mode { 0.65 } else { 0.2 },
        is_rhd,
        active: dm_state.is_active_mode,
        sins: pose.sins,
        diffs: pose.diffs,
        arcs: [yaw_arc, pitch_arc],
    }
}

// ============================================================================
// DRIVER CAMERA VIEW
// ============================================================================

const FACE_BOX_SIZE: f32 = 220.0;
const FACE_IMG_SIZE: f32 = 130.0;
const FACE_IMG_OFFSET: f32 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FaceBox {
    pub center: Point2,
    pub size: f32,
    pub alpha: f32,
}

/// Driver camera preview: detected face box plus the static face icon.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DriverView {
    pub is_rhd: bool,
    pub face_detected: bool,
    pub face_box: Option<FaceBox>,
    /// Top-left corner of the icon
    pub icon_origin: Point2,
    pub icon_opacity: f32,
}

/// Box alpha, ramping down once the orientation std passes 0.15.
pub fn face_box_alpha(face_std: f32) -> f32 {
    if face_std > 0.15 {
        (0.7 - (face_std - 0.15) * 3.5).max(0.0)
    } else {
        0.7
    }
}

pub fn reduce_driver_view(driver_state: &DriverStateV2, viewport: Viewport) -> DriverView {
    let is_rhd = driver_state.wheel_on_right_prob > 0.5;
    let data = driver_state.driver(is_rhd);
    let face_detected = data.face_prob > 0.7;

    let face_box = face_detected.then(|| {
        let fx = data.face_position.first().copied().unwrap_or(0.0);
        let fy = data.face_position.get(1).copied().unwrap_or(0.0);
        let face_std = data
            .face_orientation_std
            .iter()
            .take(2)
            .fold(0.0f32, |acc, &s| acc.max(s));
        // Approximates the driver camera distortion
        let x = 1080.0 - 1714.0 * fx;
        let y = -135.0 + (504.0 + fx.abs() * 112.0) + (1205.0 - fx.abs() * 724.0) * fy;
        FaceBox {
            center: Point2::new(x.trunc(), y.trunc()),
            size: FACE_BOX_SIZE,
            alpha: face_box_alpha(face_std),
        }
    });

    let icon_x = if is_rhd {
        (viewport.width - 1.0) - FACE_IMG_SIZE - FACE_IMG_OFFSET
    } else {
        FACE_IMG_OFFSET
    };
    DriverView {
        is_rhd,
        face_detected,
        face_box,
        icon_origin: Point2::new(icon_x, (viewport.height - 1.0) - FACE_IMG_SIZE - FACE_IMG_OFFSET),
        icon_opacity: if face_detected { 1.0 } else { 0.2 },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::DriverData;

    fn driver_state(orientation: [f32; 3]) -> DriverStateV2 {
        DriverStateV2 {
            left_driver_data: DriverData {
                face_orientation: orientation.to_vec(),
                face_prob: 1.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn viewport() -> Viewport {
        Viewport::new(2160.0, 1080.0)
    }

    #[test]
    fn test_icon_anchor_sides() {
        let display = DisplayConfig::default();
        let left = icon_anchor(&display, viewport(), false);
        assert_eq!(left, Point2::new(144.0, 939.0));
        let right = icon_anchor(&display, viewport(), true);
        assert_eq!(right, Point2::new(2159.0 - 144.0, 939.0));
    }

    #[test]
    fn test_neutral_pose_keeps_default_outline() {
        let mut pose = PoseSmoother::default();
        let dm = DriverMonitoringState {
            is_active_mode: true,
            is_rhd: false,
        };
        let face = reduce_driver(
            &mut pose,
            0.0,
            &dm,
            &driver_state([0.0; 3]),
            &DriverConfig::default(),
            &DisplayConfig::default(),
            viewport(),
        );
        assert_eq!(face.keypoints.len(), 33);
        assert_eq!(face.keypoints.first(), face.keypoints.last());
        let p = face.keypoints[7];
        assert!((p.x - (face.anchor.x - 36.16)).abs() < 1e-3);
        assert!((p.y - (face.anchor.y + 6.40)).abs() < 1e-3);
        assert_eq!(face.icon_opacity, 0.65);
        assert!((face.arcs[0].alpha - 0.4).abs() < 1e-6);
        assert!((face.arcs[0].thickness - 6.7).abs() < 1e-6);
        assert_eq!(face.arcs[0].rect.width, 0.0);
    }

    #[test]
    fn test_turned_head_moves_arcs() {
        let mut pose = PoseSmoother::default();
        let dm = DriverMonitoringState::default();
        let face = reduce_driver(
            &mut pose,
            0.0,
            &dm,
            &driver_state([0.3, 0.5, 0.0]),
            &DriverConfig::default(),
            &DisplayConfig::default(),
            viewport(),
        );
        // Yaw to the positive side opens the arc leftward
        assert!(face.sins[1] > 0.0);
        assert_eq!(face.arcs[0].start_deg, 90.0);
        assert!(face.arcs[0].rect.x < face.anchor.x);
        assert!((face.arcs[0].rect.width - face.sins[1] * 133.0 / 2.0).abs() < 1e-3);
        // Pitch diff 0.27 saturates the extension
        assert!((face.arcs[1].thickness - 18.7).abs() < 1e-4);
        assert_eq!(face.arcs[1].start_deg, 0.0);
        assert_eq!(face.icon_opacity, 0.2);
    }

    #[test]
    fn test_full_fade_flattens_face() {
        let mut pose = PoseSmoother::default();
        let dm = DriverMonitoringState::default();
        let face = reduce_driver(
            &mut pose,
            1.0,
            &dm,
            &driver_state([0.4, -0.6, 0.2]),
            &DriverConfig::default(),
            &DisplayConfig::default(),
            viewport(),
        );
        assert_eq!(face.arcs[0].alpha, 0.0);
        let p = face.keypoints[0];
        assert!((p.x - (face.anchor.x - 5.98)).abs() < 1e-3);
        assert!((p.y - (face.anchor.y - 51.20)).abs() < 1e-3);
    }

    #[test]
    fn test_fade_follows_dm_activity() {
        let mut fade = FadeFilter::new(0.2);
        let active = DriverMonitoringState {
            is_active_mode: true,
            is_rhd: false,
        };
        assert_eq!(update_fade(&mut fade, None), 0.1);
        assert_eq!(update_fade(&mut fade, Some(&active)), 0.0);
    }

    fn camera_view(prob: f32, position: [f32; 2], std: [f32; 2]) -> DriverStateV2 {
        DriverStateV2 {
            left_driver_data: DriverData {
                face_prob: prob,
                face_position: position.to_vec(),
                face_orientation_std: std.to_vec(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_driver_view_face_threshold() {
        let view = reduce_driver_view(&camera_view(0.7, [0.0, 0.0], [0.0, 0.0]), viewport());
        assert!(!view.face_detected);
        assert!(view.face_box.is_none());
        assert_eq!(view.icon_opacity, 0.2);

        let view = reduce_driver_view(&camera_view(0.71, [0.0, 0.0], [0.0, 0.0]), viewport());
        assert!(view.face_detected);
        assert_eq!(view.icon_opacity, 1.0);
        let face_box = view.face_box.unwrap();
        assert_eq!(face_box.center, Point2::new(1080.0, 369.0));
        assert_eq!(face_box.alpha, 0.7);
        assert_eq!(view.icon_origin, Point2::new(60.0, 889.0));
    }

    #[test]
    fn test_driver_view_box_position() {
        let view = reduce_driver_view(&camera_view(0.9, [0.1, 0.2], [0.0, 0.0]), viewport());
        let face_box = view.face_box.unwrap();
        // 908.6 and 606.72 truncate toward zero
        assert_eq!(face_box.center, Point2::new(908.0, 606.0));
        assert_eq!(face_box.size, 220.0);
    }

    #[test]
    fn test_face_box_alpha_ramp() {
        assert_eq!(face_box_alpha(0.1), 0.7);
        assert_eq!(face_box_alpha(0.15), 0.7);
        assert!((face_box_alpha(0.25) - 0.35).abs() < 1e-5);
        assert_eq!(face_box_alpha(0.5), 0.0);

        // Larger of the pitch and yaw std wins
        let view = reduce_driver_view(&camera_view(0.9, [0.0, 0.0], [0.05, 0.25]), viewport());
        assert!((view.face_box.unwrap().alpha - 0.35).abs() < 1e-5);
    }

    #[test]
    fn test_driver_view_right_hand_drive() {
        let state = DriverStateV2 {
            wheel_on_right_prob: 0.6,
            right_driver_data: DriverData {
                face_prob: 0.9,
                ..Default::default()
            },
            ..Default::default()
        };
        let view = reduce_driver_view(&state, viewport());
        assert!(view.is_rhd);
        assert!(view.face_detected);
        assert_eq!(view.icon_origin, Point2::new(2159.0 - 190.0, 889.0));
    }
}
