// src/lib.rs
//
// Scene reducer for a driver-assistance on-screen display: turns the latest
// perception, control and calibration messages into screen-space geometry,
// smoothed driver-monitoring state and a single prioritised alert.

pub mod calibration;
mod config;
pub mod error;
pub mod messages;
pub mod overlay;
pub mod params;
pub mod pipeline;
pub mod smoother;
pub mod types;

pub use calibration::{CalibrationState, CameraKind, Projector};
pub use error::{SceneError, SceneResult};
pub use messages::Topic;
pub use params::{DirParams, MemoryParams, ParamStore};
pub use pipeline::{CameraFeed, InMemoryBus, MessageBus, SceneContext, SceneFrame, ScenePipeline};
pub use types::{Config, Point2, Viewport};
