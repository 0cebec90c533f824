// src/overlay/mod.rs
//
// Reducers from a scene snapshot to drawable geometry. None of them touch a
// painter; the presentation layer consumes their outputs as-is.

pub mod alert;
pub mod driver;
pub mod hud;
pub mod lead;
pub mod path;

use crate::types::Point2;
use serde::Serialize;

pub use alert::{Alert, AlertChangeDetector, AlertKey, BackgroundColor, UiStatus};
pub use driver::{DriverView, FaceBox, FaceState};
pub use hud::{HudMemory, HudState, SpeedTint, StandstillTimer};
pub use lead::{LeadDescriptor, LeadSource};
pub use path::{GradientStop, PathGeometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GeometrySource {
    LaneLine(usize),
    RoadEdge(usize),
    #[default]
    Path,
}

/// Closed polygon: left edge front-to-back, then right edge back-to-front.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Polygon {
    pub source: GeometrySource,
    pub points: Vec<Point2>,
    pub opacity: f32,
}

impl Polygon {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
