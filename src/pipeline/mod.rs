// src/pipeline/mod.rs

pub mod bus;
pub mod event_bus;
pub mod metrics;
pub mod orchestrator;
pub mod sampler;
pub mod snapshot;

pub use bus::{Envelope, InMemoryBus, MessageBus};
pub use event_bus::{EventBus, SceneEvent};
pub use metrics::PipelineMetrics;
pub use orchestrator::{CameraFeed, PersistentState, SceneContext, SceneFrame, ScenePipeline};
pub use sampler::Sampler;
pub use snapshot::{SceneSnapshot, TopicStatus};
