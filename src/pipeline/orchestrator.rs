// src/pipeline/orchestrator.rs
//
// One tick of the scene pipeline:
//
//   1. sample the bus into an immutable snapshot
//   2. update state that advances every tick (calibration, status, fade,
//      HUD, alert selection)
//   3. if a camera frame is ready (or the skip budget is spent): select the
//      camera, project path/lane/lead geometry and the driver face
//   4. filter the frame rate and publish uiDebug
//
// All state that survives a tick lives in `PersistentState`.

use crate::calibration::{
    CalibrationState, CameraKind, CameraSelect, CameraSelectInputs, CameraSelector,
};
use crate::error::SceneError;
use crate::messages::{CarState, ControlsState, DriverMonitoringState, Topic, UiDebug};
use crate::overlay::alert::{
    background_tier, select_alert, Alert, AlertChangeDetector, AlertInputs, BackgroundColor,
    UiStatus,
};
use crate::overlay::driver::{reduce_driver, reduce_driver_view, update_fade, DriverView, FaceState};
use crate::overlay::hud::{experimental_button, reduce_hud, HudInputs, HudMemory, HudState};
use crate::overlay::lead::{reduce_leads, LeadDescriptor};
use crate::overlay::path::{reduce_path, PathGeometry, PathInputs};
use crate::params::{keys, ParamStore};
use crate::pipeline::bus::MessageBus;
use crate::pipeline::event_bus::{EventBus, SceneEvent};
use crate::pipeline::metrics::PipelineMetrics;
use crate::pipeline::sampler::Sampler;
use crate::pipeline::snapshot::SceneSnapshot;
use crate::smoother::{FadeFilter, FirstOrderFilter, PoseSmoother};
use crate::types::{Config, Viewport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything a tick may consult that is not part of the snapshot.
pub struct SceneContext {
    pub config: Config,
    pub viewport: Viewport,
    pub params: Arc<dyn ParamStore>,
}

impl SceneContext {
    pub fn new(config: Config, params: Arc<dyn ParamStore>) -> Self {
        let viewport = Viewport::from(&config.display);
        Self {
            config,
            viewport,
            params,
        }
    }
}

/// Camera stream availability for this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraFeed {
    pub frame_ready: bool,
    pub stream_count: usize,
    pub has_wide_stream: bool,
}

impl CameraFeed {
    pub fn narrow_only() -> Self {
        Self {
            frame_ready: true,
            stream_count: 1,
            has_wide_stream: false,
        }
    }

    pub fn dual() -> Self {
        Self {
            frame_ready: true,
            stream_count: 2,
            has_wide_stream: true,
        }
    }
}

pub struct PersistentState {
    pub calibration: CalibrationState,
    pub camera: CameraSelector,
    pub fade: FadeFilter,
    pub pose: PoseSmoother,
    pub status: UiStatus,
    pub alerts: AlertChangeDetector,
    pub hud: HudMemory,
    pub skip_frames: u32,
    pub fps_filter: FirstOrderFilter,
    pub prev_draw_ms: Option<u64>,
}

impl PersistentState {
    pub fn new(ctx: &SceneContext) -> Self {
        let config = &ctx.config;
        let ui_freq = config.sampler.ui_freq_hz as f64;
        Self {
            calibration: CalibrationState::from_params(ctx.params.as_ref()),
            camera: CameraSelector::new(&config.calibration),
            fade: FadeFilter::new(config.driver.fade_rate),
            pose: PoseSmoother::default(),
            status: UiStatus::Disengaged,
            alerts: AlertChangeDetector::new(),
            hud: HudMemory::default(),
            skip_frames: 0,
            fps_filter: FirstOrderFilter::new(
                ui_freq,
                config.pipeline.fps_filter_tc as f64,
                1.0 / ui_freq,
            ),
            prev_draw_ms: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneFrame {
    pub frame: u64,
    pub camera: CameraKind,
    pub calibration_valid: bool,
    /// None until the model (and calibration) has been received since start
    pub path: Option<PathGeometry>,
    pub leads: Vec<LeadDescriptor>,
    pub face: Option<FaceState>,
    /// Driver camera preview, whenever driverStateV2 has been seen
    pub driver_view: Option<DriverView>,
    pub alert: Alert,
    pub background: UiStatus,
    pub background_color: BackgroundColor,
    pub alert_changed: bool,
    pub hud: HudState,
    pub fps: f64,
}

/// Per-tick results that do not depend on a camera frame.
struct TickState {
    hud: HudState,
    alert: Alert,
    background: UiStatus,
    alert_changed: bool,
}

pub struct ScenePipeline {
    ctx: SceneContext,
    state: PersistentState,
    sampler: Sampler,
    metrics: PipelineMetrics,
    events: EventBus,
}

impl ScenePipeline {
    pub fn new(ctx: SceneContext) -> Self {
        let state = PersistentState::new(&ctx);
        let sampler = Sampler::new(&ctx.config.sampler);
        let events = EventBus::new(ctx.config.pipeline.max_pending_events);
        info!(
            "Scene pipeline ready: {}x{} viewport, {} Hz, calibration {}",
            ctx.viewport.width,
            ctx.viewport.height,
            ctx.config.sampler.ui_freq_hz,
            if state.calibration.valid { "seeded" } else { "default" }
        );
        Self {
            ctx,
            state,
            sampler,
            metrics: PipelineMetrics::new(),
            events,
        }
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain()
    }

    /// Begin a drive. Messages that arrived before this point are ignored
    /// by the start-gated reducers.
    pub fn mark_started(&mut self) {
        self.sampler.mark_started();
        self.state.status = UiStatus::Disengaged;
    }

    /// Sample, tick and publish telemetry. Returns `None` for a skipped frame.
    pub fn step(
        &mut self,
        bus: &dyn MessageBus,
        feed: CameraFeed,
        now_ms: u64,
    ) -> Option<SceneFrame> {
        let snapshot = self.sampler.sample(bus, now_ms);
        let start = Instant::now();
        let frame = self.tick(&snapshot, feed)?;
        let draw_time = start.elapsed();
        self.metrics
            .set_timing(&self.metrics.draw_time_us, draw_time.as_micros() as u64);

        let debug_msg = UiDebug {
            frame: frame.frame,
            draw_time_millis: draw_time.as_secs_f64() * 1000.0,
            fps: frame.fps,
        };
        match serde_json::to_value(&debug_msg) {
            Ok(value) => {
                bus.publish(Topic::UiDebug, value, now_ms, true);
            }
            Err(e) => warn!("Failed to encode uiDebug: {}", e),
        }
        Some(frame)
    }

    pub fn tick(&mut self, snapshot: &SceneSnapshot, feed: CameraFeed) -> Option<SceneFrame> {
        self.metrics.inc(&self.metrics.ticks);
        for &topic in &snapshot.decode_failures {
            self.metrics.inc(&self.metrics.decode_failures);
            self.events.publish(SceneEvent::DecodeFailed {
                frame: snapshot.frame,
                topic,
            });
        }

        let tick_state = self.update_state(snapshot);

        if !feed.frame_ready {
            if self.state.skip_frames > 0 {
                self.state.skip_frames -= 1;
                debug!("Skipping frame {}, camera not ready", snapshot.frame);
                self.metrics.inc(&self.metrics.frames_skipped);
                return None;
            }
        } else {
            self.state.skip_frames = self.ctx.config.pipeline.skip_frame_retries;
        }

        let frame = self.draw(snapshot, feed, tick_state);
        self.metrics.inc(&self.metrics.frames_drawn);
        Some(frame)
    }

    fn update_state(&mut self, snapshot: &SceneSnapshot) -> TickState {
        let config = &self.ctx.config;
        let default_controls = ControlsState::default();
        let default_car = CarState::default();
        let controls = snapshot.controls.as_ref().unwrap_or(&default_controls);
        let car = snapshot.car_state.as_ref().unwrap_or(&default_car);

        if snapshot.updated(Topic::LiveCalibration) {
            if let Some(calib) = &snapshot.calibration {
                let was_valid = self.state.calibration.valid;
                self.state.calibration.apply(calib);
                if was_valid && !self.state.calibration.valid {
                    warn!("{}", SceneError::InvalidCalibration);
                    self.metrics.inc(&self.metrics.calibration_fallbacks);
                    self.events.publish(SceneEvent::CalibrationFallback {
                        frame: snapshot.frame,
                    });
                }
            }
        }

        if snapshot.updated(Topic::ControlsState) {
            self.state.status = UiStatus::from_controls(controls);
        }

        let dm_state = snapshot.dm_state.as_ref();
        update_fade(&mut self.state.fade, dm_state);

        let params = self.ctx.params.as_ref();
        let nav_status = snapshot.status(Topic::NavInstruction);
        let hud = reduce_hud(
            &HudInputs {
                controls,
                controls_alive: snapshot.alive(Topic::ControlsState),
                car,
                nav: snapshot.nav.as_ref(),
                nav_usable: nav_status.alive && nav_status.valid,
                is_metric: params.get_bool(keys::IS_METRIC),
                status: self.state.status,
                dm_active: dm_state.map(|d| d.is_active_mode).unwrap_or(false),
                right_hand_dm: dm_state.map(|d| d.is_rhd).unwrap_or(false),
                experimental_button: experimental_button(
                    controls,
                    snapshot.car_params.as_ref(),
                    params,
                ),
                a_req: snapshot
                    .plan
                    .as_ref()
                    .and_then(|plan| plan.accel.first().copied())
                    .unwrap_or(0.0),
                navi_select: params.get_int(keys::NAVI_SELECT),
                stock_ui: params.get_bool(keys::COMMA_STOCK_UI),
                now_ms: snapshot.now_ms,
            },
            &mut self.state.hud,
        );

        let controls_status = snapshot.status(Topic::ControlsState);
        let alert = select_alert(
            &AlertInputs {
                controls,
                controls_rcv_frame: controls_status.rcv_frame,
                controls_rcv_time_ms: controls_status.rcv_time_ms,
                controls_updated: controls_status.updated,
                frame: snapshot.frame,
                started_frame: snapshot.started_frame,
                now_ms: snapshot.now_ms,
                ui_freq_hz: config.sampler.ui_freq_hz,
            },
            &config.alert,
        );
        let background = background_tier(self.state.status, &alert);

        let mut alert_changed = false;
        if controls_status.updated || !alert.is_none() {
            alert_changed = self.state.alerts.observe(&alert, background);
        }
        if alert_changed {
            self.metrics.inc(&self.metrics.alert_changes);
            self.events.publish(SceneEvent::AlertChanged {
                frame: snapshot.frame,
                alert: alert.clone(),
                background,
            });
        }

        TickState {
            hud,
            alert,
            background,
            alert_changed,
        }
    }

    fn draw(
        &mut self,
        snapshot: &SceneSnapshot,
        feed: CameraFeed,
        tick_state: TickState,
    ) -> SceneFrame {
        let config = &self.ctx.config;
        let default_controls = ControlsState::default();
        let default_car = CarState::default();
        let controls = snapshot.controls.as_ref().unwrap_or(&default_controls);
        let car = snapshot.car_state.as_ref().unwrap_or(&default_car);

        // Camera selection
        let prev_select = self.state.camera.state();
        let prev_camera = self.state.camera.camera();
        let camera = self.state.camera.update(CameraSelectInputs {
            v_ego: car.v_ego,
            has_wide_stream: feed.has_wide_stream,
            stream_count: feed.stream_count,
            experimental_mode: controls.experimental_mode,
            wide_valid: self.state.calibration.wide_valid,
        });
        if prev_select != CameraSelect::Uninitialized && prev_camera != camera {
            self.metrics.inc(&self.metrics.camera_switches);
            self.events.publish(SceneEvent::CameraSwitched {
                frame: snapshot.frame,
                from: prev_camera,
                to: camera,
                v_ego: car.v_ego,
            });
        }
        self.state.calibration.camera = camera;
        let projector = self
            .state
            .calibration
            .projector(&config.calibration, self.ctx.viewport);

        // World objects
        let world_visible = snapshot.received_since_start(Topic::LiveCalibration);
        let mut path = None;
        let mut leads = Vec::new();
        if let (true, true, Some(model)) = (
            world_visible,
            snapshot.received_since_start(Topic::ModelV2),
            snapshot.model.as_ref(),
        ) {
            path = Some(reduce_path(
                &PathInputs {
                    model,
                    plan: snapshot.plan.as_ref(),
                    lead_one: snapshot.radar.as_ref().map(|r| r.lead_one),
                    experimental_mode: controls.experimental_mode,
                },
                &projector,
                &config.path,
            ));
            if let (true, Some(radar)) = (
                snapshot.received_since_start(Topic::RadarState),
                snapshot.radar.as_ref(),
            ) {
                leads = reduce_leads(
                    radar,
                    &model.position,
                    car.radar_distance,
                    &projector,
                    &config.lead,
                    &config.path,
                );
            }
        } else if snapshot.model.is_none() {
            debug!("{}", SceneError::MissingData(Topic::ModelV2));
        }

        // Driver monitoring
        let default_dm = DriverMonitoringState::default();
        let face = match snapshot.driver_state.as_ref() {
            Some(driver_state)
                if !tick_state.hud.hide_dm && snapshot.received_since_start(Topic::DriverStateV2) =>
            {
                Some(reduce_driver(
                    &mut self.state.pose,
                    self.state.fade.value(),
                    snapshot.dm_state.as_ref().unwrap_or(&default_dm),
                    driver_state,
                    &config.driver,
                    &config.display,
                    self.ctx.viewport,
                ))
            }
            _ => None,
        };
        let driver_view = snapshot
            .driver_state
            .as_ref()
            .map(|driver_state| reduce_driver_view(driver_state, self.ctx.viewport));

        let fps = self.update_fps(snapshot);

        SceneFrame {
            frame: snapshot.frame,
            camera,
            calibration_valid: self.state.calibration.valid,
            path,
            leads,
            face,
            driver_view,
            background_color: tick_state.background.background(),
            background: tick_state.background,
            alert: tick_state.alert,
            alert_changed: tick_state.alert_changed,
            hud: tick_state.hud,
            fps,
        }
    }

    fn update_fps(&mut self, snapshot: &SceneSnapshot) -> f64 {
        let fps = match self.state.prev_draw_ms {
            Some(prev) if snapshot.now_ms > prev => {
                let dt_ms = (snapshot.now_ms - prev) as f64;
                self.state.fps_filter.update(1000.0 / dt_ms)
            }
            _ => self.state.fps_filter.value(),
        };
        self.state.prev_draw_ms = Some(snapshot.now_ms);

        if fps < self.ctx.config.pipeline.min_fps as f64 {
            warn!("Slow frame rate: {:.2} fps", fps);
            self.metrics.inc(&self.metrics.slow_frames);
            self.events.publish(SceneEvent::SlowFrame {
                frame: snapshot.frame,
                fps,
            });
        }
        fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{CalStatus, LeadData, LiveCalibration, ModelV2, RadarState, XyztData};
    use crate::overlay::alert::AlertKey;
    use crate::params::MemoryParams;
    use crate::pipeline::bus::InMemoryBus;
    use serde_json::json;

    fn pipeline() -> ScenePipeline {
        ScenePipeline::new(SceneContext::new(Config::default(), Arc::new(MemoryParams::new())))
    }

    fn straight(y: f32, z: f32) -> XyztData {
        XyztData {
            x: (0..33).map(|i| i as f32 * 3.0).collect(),
            y: vec![y; 33],
            z: vec![z; 33],
        }
    }

    fn publish<T: Serialize>(bus: &InMemoryBus, topic: Topic, value: &T, t_ms: u64) {
        bus.publish(topic, serde_json::to_value(value).unwrap(), t_ms, true);
    }

    fn calibration(wide: bool) -> LiveCalibration {
        LiveCalibration {
            cal_status: CalStatus::Calibrated,
            rpy_calib: vec![0.0, 0.0, 0.0],
            wide_from_device_euler: if wide { vec![0.0, 0.0, 0.0] } else { vec![] },
        }
    }

    fn publish_scene(bus: &InMemoryBus, t_ms: u64) {
        publish(bus, Topic::LiveCalibration, &calibration(false), t_ms);
        publish(
            bus,
            Topic::ModelV2,
            &ModelV2 {
                position: straight(0.0, 0.0),
                lane_lines: vec![straight(-1.8, 1.22), straight(1.8, 1.22)],
                lane_line_probs: vec![0.8, 0.8],
                ..Default::default()
            },
            t_ms,
        );
        publish(
            bus,
            Topic::RadarState,
            &RadarState {
                lead_one: LeadData {
                    d_rel: 20.0,
                    y_rel: 0.0,
                    v_rel: -8.0,
                    status: true,
                },
                ..Default::default()
            },
            t_ms,
        );
        bus.publish(Topic::CarState, json!({"vEgo": 20.0, "radarDistance": 20.0}), t_ms, true);
        bus.publish(Topic::ControlsState, json!({"enabled": true}), t_ms, true);
        bus.publish(Topic::DriverMonitoringState, json!({"isActiveMode": true}), t_ms, true);
        bus.publish(
            Topic::DriverStateV2,
            json!({"leftDriverData": {"faceOrientation": [0.1, 0.2, 0.0]}}),
            t_ms,
            true,
        );
    }

    #[test]
    fn test_full_scene_tick() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        publish_scene(&bus, 0);

        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 0).unwrap();
        assert!(frame.calibration_valid);
        assert_eq!(frame.camera, CameraKind::Narrow);
        let path = frame.path.as_ref().unwrap();
        assert!(!path.path.is_empty());
        assert_eq!(path.lane_lines.len(), 2);
        assert_eq!(frame.leads.len(), 1);
        assert_eq!(frame.leads[0].intensity, 255.0);
        assert!(frame.face.is_some());
        let driver_view = frame.driver_view.unwrap();
        assert!(!driver_view.face_detected);
        assert!(frame.alert.is_none());
        assert_eq!(frame.background, UiStatus::Engaged);
        assert!(!frame.hud.cruise_set);

        let debug = bus.latest(Topic::UiDebug).unwrap();
        assert_eq!(debug.value["frame"], 1);
    }

    #[test]
    fn test_nothing_drawn_before_start_gated_topics() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        publish_scene(&bus, 0);
        pipeline.step(&bus, CameraFeed::narrow_only(), 0);
        pipeline.mark_started();

        // Old messages are still on the bus but predate the start
        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 50).unwrap();
        assert!(frame.path.is_none());
        assert!(frame.leads.is_empty());
        assert!(frame.face.is_none());
    }

    #[test]
    fn test_start_resets_status() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        bus.publish(Topic::ControlsState, json!({"enabled": true}), 0, true);
        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 0).unwrap();
        assert_eq!(frame.background, UiStatus::Engaged);

        pipeline.mark_started();
        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 50).unwrap();
        assert_eq!(pipeline.state().status, UiStatus::Disengaged);
        assert_eq!(frame.background, UiStatus::Disengaged);

        bus.publish(Topic::ControlsState, json!({"enabled": true}), 100, true);
        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 100).unwrap();
        assert_eq!(frame.background, UiStatus::Engaged);
    }

    #[test]
    fn test_alert_hides_driver_face() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        publish_scene(&bus, 0);
        bus.publish(
            Topic::ControlsState,
            json!({
                "enabled": true,
                "alertType": "promptDriverDistracted",
                "alertSize": "small",
                "alertStatus": "userPrompt"
            }),
            0,
            true,
        );
        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 0).unwrap();
        assert!(frame.hud.hide_dm);
        assert!(frame.face.is_none());
        assert_eq!(frame.background, UiStatus::Warning);
        assert!(frame.alert_changed);
    }

    #[test]
    fn test_frame_skip_budget() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        let not_ready = CameraFeed {
            frame_ready: false,
            ..CameraFeed::narrow_only()
        };

        // No budget before the first camera frame
        assert!(pipeline.step(&bus, not_ready, 0).is_some());
        assert!(pipeline.step(&bus, CameraFeed::narrow_only(), 50).is_some());
        for i in 0..5 {
            assert!(pipeline.step(&bus, not_ready, 100 + i * 50).is_none());
        }
        assert!(pipeline.step(&bus, not_ready, 400).is_some());
        assert_eq!(pipeline.metrics().summary().frames_skipped, 5);
    }

    #[test]
    fn test_controls_unresponsive_forces_alert_tier() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        bus.publish(Topic::ControlsState, json!({"enabled": true}), 0, true);

        let mut last = None;
        for frame in 0..130u64 {
            last = pipeline.step(&bus, CameraFeed::narrow_only(), frame * 50);
        }
        let frame = last.unwrap();
        assert_eq!(frame.alert.key(), Some(AlertKey::ControlsUnresponsive));
        assert_eq!(frame.background, UiStatus::Alert);
        assert_eq!(frame.hud.set_speed, crate::overlay::hud::SET_SPEED_NA);

        let changed: Vec<_> = pipeline
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                SceneEvent::AlertChanged {
                    alert, background, ..
                } => Some((alert.key(), background)),
                _ => None,
            })
            .collect();
        assert_eq!(
            changed.last(),
            Some(&(Some(AlertKey::ControlsUnresponsive), UiStatus::Alert))
        );
    }

    #[test]
    fn test_camera_switch_event() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        publish(&bus, Topic::LiveCalibration, &calibration(true), 0);
        bus.publish(Topic::ControlsState, json!({"experimentalMode": true}), 0, true);
        bus.publish(Topic::CarState, json!({"vEgo": 5.0}), 0, true);

        let frame = pipeline.step(&bus, CameraFeed::dual(), 0).unwrap();
        assert_eq!(frame.camera, CameraKind::Wide);

        bus.publish(Topic::CarState, json!({"vEgo": 12.0}), 50, true);
        let frame = pipeline.step(&bus, CameraFeed::dual(), 50).unwrap();
        assert_eq!(frame.camera, CameraKind::Wide);

        bus.publish(Topic::CarState, json!({"vEgo": 16.0}), 100, true);
        let frame = pipeline.step(&bus, CameraFeed::dual(), 100).unwrap();
        assert_eq!(frame.camera, CameraKind::Narrow);

        let switches = pipeline
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SceneEvent::CameraSwitched { .. }))
            .count();
        assert_eq!(switches, 1);
        assert_eq!(pipeline.metrics().summary().camera_switches, 1);
    }

    #[test]
    fn test_calibration_fallback_event() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        publish(&bus, Topic::LiveCalibration, &calibration(false), 0);
        assert!(pipeline.step(&bus, CameraFeed::narrow_only(), 0).unwrap().calibration_valid);

        bus.publish(
            Topic::LiveCalibration,
            json!({"calStatus": "recalibrating", "rpyCalib": [0.0, 0.1, 0.0]}),
            50,
            true,
        );
        let frame = pipeline.step(&bus, CameraFeed::narrow_only(), 50).unwrap();
        assert!(!frame.calibration_valid);
        assert!(pipeline
            .drain_events()
            .iter()
            .any(|e| matches!(e, SceneEvent::CalibrationFallback { frame: 2 })));
    }

    #[test]
    fn test_slow_frames_are_counted() {
        let bus = InMemoryBus::new();
        let mut pipeline = pipeline();
        // One frame per second drags the filtered rate below 15 fps
        for i in 0..40u64 {
            pipeline.step(&bus, CameraFeed::narrow_only(), i * 1000);
        }
        assert!(pipeline.metrics().summary().slow_frames > 0);
        assert!(pipeline.state().fps_filter.value() < 15.0);
    }
}
