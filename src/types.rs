// src/types.rs

use serde::{Deserialize, Serialize};

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display: DisplayConfig,
    pub sampler: SamplerConfig,
    pub calibration: CalibrationConfig,
    pub path: PathConfig,
    pub lead: LeadConfig,
    pub driver: DriverConfig,
    pub alert: AlertConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: f32,
    pub height: f32,
    /// Border inset around the camera view
    pub border: f32,
    pub footer_height: f32,
    /// Diameter of round HUD buttons (DM icon, experimental button)
    pub button_size: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 2160.0,
            height: 1080.0,
            border: 30.0,
            footer_height: 280.0,
            button_size: 192.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Render/update rate of the UI loop
    pub ui_freq_hz: f32,
    /// A topic is alive if received within `liveness_factor / freq` seconds
    pub liveness_factor: f32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            ui_freq_hz: 20.0,
            liveness_factor: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Wide camera is requested below this ego speed (m/s)
    pub wide_below_speed: f32,
    /// Wide camera is released above this ego speed (m/s)
    pub narrow_above_speed: f32,
    /// Projected points this far outside the viewport are rejected
    pub clip_margin: f32,
    pub narrow_zoom: f32,
    pub wide_zoom: f32,
    pub narrow_focal_length: f32,
    pub wide_focal_length: f32,
    pub principal_point: [f32; 2],
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            wide_below_speed: 10.0,
            narrow_above_speed: 15.0,
            clip_margin: 500.0,
            narrow_zoom: 1.1,
            wide_zoom: 2.0,
            narrow_focal_length: 2648.0,
            wide_focal_length: 567.0,
            principal_point: [964.0, 604.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    pub min_draw_distance: f32,
    pub max_draw_distance: f32,
    /// Number of points in every model trajectory
    pub trajectory_size: usize,
    /// Lane line half-width per unit of probability
    pub lane_line_width: f32,
    pub road_edge_width: f32,
    pub path_half_width: f32,
    /// Height of the path above the road plane
    pub path_height: f32,
    pub lane_line_max_alpha: f32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            min_draw_distance: 10.0,
            max_draw_distance: 100.0,
            trajectory_size: 33,
            lane_line_width: 0.025,
            road_edge_width: 0.025,
            path_half_width: 0.9,
            path_height: 1.22,
            lane_line_max_alpha: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadConfig {
    /// Second lead is hidden unless it is at least this far from the first
    pub min_separation: f32,
    /// Leads beyond this distance have zero alert intensity
    pub alert_distance: f32,
    /// Closing speed that alone saturates the alert intensity
    pub closing_speed_scale: f32,
    /// Radar distances below this mark the lead as radar-sourced
    pub radar_distance_limit: f32,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            min_separation: 3.0,
            alert_distance: 40.0,
            closing_speed_scale: 10.0,
            radar_distance_limit: 149.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Step applied to the engagement fade scalar every tick
    pub fade_rate: f32,
    /// EWMA weight of the newest head pose sample
    pub pose_alpha: f32,
    pub arc_length: f32,
    pub arc_thickness: f32,
    pub arc_thickness_extend: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            fade_rate: 0.2,
            pose_alpha: 0.8,
            arc_length: 133.0,
            arc_thickness: 6.7,
            arc_thickness_extend: 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Seconds without controlsState before it counts as unresponsive
    pub controls_timeout_s: f32,
    /// Seconds past the timeout after which unresponsive becomes permanent
    pub permanent_after_s: f32,
    /// Seconds after start before missing controls raises an alert
    pub startup_grace_s: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            controls_timeout_s: 5.0,
            permanent_after_s: 10.0,
            startup_grace_s: 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Ticks skipped while waiting for a camera frame before drawing anyway
    pub skip_frame_retries: u32,
    /// Filtered frame rate below which a slow-frame warning is logged
    pub min_fps: f32,
    /// Time constant (s) of the frame-rate filter
    pub fps_filter_tc: f32,
    pub max_pending_events: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            skip_frame_retries: 5,
            min_fps: 15.0,
            fps_filter_tc: 3.0,
            max_pending_events: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "onroad_scene=info".to_string(),
        }
    }
}

// ============================================================================
// SCREEN PRIMITIVES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point2 {
        Point2::new(self.width / 2.0, self.height / 2.0)
    }

    /// True if `p` lies inside the viewport grown by `margin` on every side.
    pub fn contains_with_margin(&self, p: Point2, margin: f32) -> bool {
        p.x >= -margin
            && p.x <= self.width + margin
            && p.y >= -margin
            && p.y <= self.height + margin
    }
}

impl From<&DisplayConfig> for Viewport {
    fn from(display: &DisplayConfig) -> Self {
        Self::new(display.width, display.height)
    }
}

/// Linear remap of `x` from [in_min, in_max] to [out_min, out_max], clamped
/// to the output range.
pub fn map_val(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let x = x.clamp(in_min.min(in_max), in_min.max(in_max));
    out_min + (x - in_min) * (out_max - out_min) / (in_max - in_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_val_clamps_to_output_range() {
        assert!((map_val(0.5, 0.0, 1.0, 0.95, 0.62) - 0.785).abs() < 1e-5);
        assert!((map_val(2.0, 0.0, 1.0, 0.95, 0.62) - 0.62).abs() < 1e-6);
        assert!((map_val(-1.0, 0.0, 1.0, 0.95, 0.62) - 0.95).abs() < 1e-6);
        // Descending input range
        assert!((map_val(0.9, 0.75, 0.375, 0.0, 0.4) - 0.0).abs() < 1e-6);
    }

    #[test]
    fn test_viewport_margin() {
        let vp = Viewport::new(100.0, 50.0);
        assert!(vp.contains_with_margin(Point2::new(-10.0, 60.0), 10.0));
        assert!(!vp.contains_with_margin(Point2::new(-10.1, 0.0), 10.0));
        assert_eq!(vp.center(), Point2::new(50.0, 25.0));
    }
}
