// src/overlay/path.rs
//
// Lane lines, road edges and the driving path as screen-space polygons.
// Every polygon is rebuilt from the current model/plan each tick.

use super::{GeometrySource, Polygon};
use crate::calibration::Projector;
use crate::messages::{LeadData, ModelV2, UiPlan, XyztData};
use crate::types::{map_val, PathConfig, Point2};
use serde::Serialize;
use tracing::debug;

/// One colour stop of the path fill, bottom of the screen at position 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GradientStop {
    pub position: f32,
    /// Degrees
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl GradientStop {
    const fn new(position: f32, hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        Self {
            position,
            hue,
            saturation,
            lightness,
            alpha,
        }
    }
}

pub const FIXED_PATH_GRADIENT: [GradientStop; 3] = [
    GradientStop::new(0.0, 148.0, 0.94, 0.51, 0.4),
    GradientStop::new(0.5, 112.0, 1.0, 0.68, 0.35),
    GradientStop::new(1.0, 112.0, 1.0, 0.68, 0.0),
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct PathGeometry {
    pub lane_lines: Vec<Polygon>,
    pub road_edges: Vec<Polygon>,
    pub path: Polygon,
    pub gradient: Vec<GradientStop>,
    /// Furthest longitudinal distance drawn for the path (m)
    pub max_distance: f32,
}

pub struct PathInputs<'a> {
    pub model: &'a ModelV2,
    pub plan: Option<&'a UiPlan>,
    pub lead_one: Option<LeadData>,
    pub experimental_mode: bool,
}

/// Largest index in `[1, len)` whose x does not exceed `distance`; 0 if none.
pub fn path_length_idx(line: &XyztData, distance: f32) -> usize {
    let mut max_idx = 0;
    for i in 1..line.len() {
        if line.x[i] > distance {
            break;
        }
        max_idx = i;
    }
    max_idx
}

/// Offset a 3D polyline sideways by `half_width` and project both edges.
/// A vertex is kept only if both of its edge points project.
fn line_polygon(
    line: &XyztData,
    half_width: f32,
    z_offset: f32,
    max_idx: usize,
    allow_invert: bool,
    projector: &Projector,
) -> Vec<Point2> {
    let end = (max_idx + 1).min(line.len());
    let mut left: Vec<Point2> = Vec::with_capacity(end);
    let mut right: Vec<Point2> = Vec::with_capacity(end);

    for i in 0..end {
        let (x, y, z) = (line.x[i], line.y[i], line.z[i] + z_offset);
        if x < 0.0 {
            continue;
        }
        let (Some(l), Some(r)) = (
            projector.project_xyz(x, y - half_width, z),
            projector.project_xyz(x, y + half_width, z),
        ) else {
            continue;
        };
        // Moving forward must never move down the screen
        if !allow_invert {
            if let Some(prev) = left.last() {
                if l.y > prev.y {
                    continue;
                }
            }
        }
        left.push(l);
        right.push(r);
    }

    left.extend(right.into_iter().rev());
    left
}

pub fn reduce_path(
    inputs: &PathInputs<'_>,
    projector: &Projector,
    config: &PathConfig,
) -> PathGeometry {
    let model = inputs.model;
    let plan_position = match inputs.plan {
        Some(plan) if plan.position.len() >= config.trajectory_size => &plan.position,
        _ => &model.position,
    };
    let last_x = plan_position.x.last().copied().unwrap_or(0.0);
    let mut max_distance = last_x.clamp(config.min_draw_distance, config.max_draw_distance);

    let lane_max_idx = model
        .lane_lines
        .first()
        .map(|line| path_length_idx(line, max_distance))
        .unwrap_or(0);

    let lane_lines = model
        .lane_lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let prob = model.lane_line_probs.get(i).copied().unwrap_or(0.0);
            Polygon {
                source: GeometrySource::LaneLine(i),
                points: line_polygon(
                    line,
                    config.lane_line_width * prob,
                    0.0,
                    lane_max_idx,
                    true,
                    projector,
                ),
                opacity: prob.clamp(0.0, config.lane_line_max_alpha),
            }
        })
        .collect();

    let road_edges = model
        .road_edges
        .iter()
        .enumerate()
        .map(|(i, edge)| {
            let std = model.road_edge_stds.get(i).copied().unwrap_or(1.0);
            Polygon {
                source: GeometrySource::RoadEdge(i),
                points: line_polygon(
                    edge,
                    config.road_edge_width,
                    0.0,
                    lane_max_idx,
                    true,
                    projector,
                ),
                opacity: (1.0 - std).clamp(0.0, 1.0),
            }
        })
        .collect();

    // Stop the path short of the lead car
    if let Some(lead) = inputs.lead_one.filter(|l| l.status) {
        let lead_d = lead.d_rel * 2.0;
        max_distance = (lead_d - (lead_d * 0.35).min(10.0)).clamp(0.0, max_distance);
    }
    let path_max_idx = path_length_idx(plan_position, max_distance);
    let path = Polygon {
        source: GeometrySource::Path,
        points: line_polygon(
            plan_position,
            config.path_half_width,
            config.path_height,
            path_max_idx,
            false,
            projector,
        ),
        opacity: 1.0,
    };

    let gradient = match inputs.plan {
        Some(plan) if inputs.experimental_mode => {
            acceleration_gradient(&path.points, &plan.accel, projector.viewport().height)
        }
        _ => FIXED_PATH_GRADIENT.to_vec(),
    };

    debug!(
        "Path: {} vertices to {:.1} m, {} lane lines, {} road edges",
        path.points.len(),
        max_distance,
        model.lane_lines.len(),
        model.road_edges.len()
    );

    PathGeometry {
        lane_lines,
        road_edges,
        path,
        gradient,
        max_distance,
    }
}

/// Colour the path by planned acceleration: green when speeding up, yellow
/// when coasting, red when braking. Stops walk the left edge of the path.
fn acceleration_gradient(track: &[Point2], accel: &[f32], height: f32) -> Vec<GradientStop> {
    let max_len = (track.len() / 2).min(accel.len());
    let mut stops = Vec::with_capacity(max_len);

    let mut i = 0;
    while i < max_len {
        let y = track[i].y;
        if y < 0.0 || y > height {
            i += 1;
            continue;
        }
        let position = (height - y) / height;
        let hue = (60.0 + accel[i] * 35.0).clamp(0.0, 120.0);
        let hue = (hue * 100.0).round() / 100.0;
        let saturation = (accel[i] * 1.5).abs().min(1.0);
        let lightness = map_val(saturation, 0.0, 1.0, 0.95, 0.62);
        let alpha = map_val(position, 0.375, 0.75, 0.4, 0.0);
        stops.push(GradientStop::new(position, hue, saturation, lightness, alpha));

        // Every other point, but always reach the last one
        i += if i + 2 < max_len { 2 } else { 1 };
    }
    stops
}
