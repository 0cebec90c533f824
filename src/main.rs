// src/main.rs
//
// Replays a JSON-lines bus log through the scene pipeline at the UI rate.
//
//   onroad-scene <log.jsonl> [config.yaml]
//
// Each log line is `{"t_ms": 1200, "topic": "carState", "value": {...}}`,
// optionally with `"valid": false`. Lines are replayed in `t_ms` order.
// Parameters are read from $ONROAD_PARAMS_DIR when set, else kept in memory.

use anyhow::{bail, Context, Result};
use onroad_scene::calibration::mounting_description;
use onroad_scene::pipeline::SceneEvent;
use onroad_scene::{
    CameraFeed, Config, DirParams, InMemoryBus, MemoryParams, MessageBus, ParamStore, SceneContext,
    ScenePipeline, Topic,
};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct LogLine {
    t_ms: u64,
    topic: String,
    value: Value,
    #[serde(default = "default_valid")]
    valid: bool,
}

fn default_valid() -> bool {
    true
}

type LogMessage = (u64, Topic, Value, bool);

fn read_log(path: &str) -> Result<Vec<LogMessage>> {
    let file = File::open(path).with_context(|| format!("opening log {}", path))?;
    parse_log(BufReader::new(file), path)
}

fn parse_log(reader: impl BufRead, path: &str) -> Result<Vec<LogMessage>> {
    let mut messages = Vec::new();
    let mut skipped = 0usize;

    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {} line {}", path, lineno + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: LogLine = match serde_json::from_str(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Skipping malformed line {}: {}", lineno + 1, e);
                skipped += 1;
                continue;
            }
        };
        match parsed.topic.parse::<Topic>() {
            Ok(topic) => messages.push((parsed.t_ms, topic, parsed.value, parsed.valid)),
            Err(e) => {
                debug!("Line {}: {}", lineno + 1, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} log line(s)", skipped);
    }
    // Stable, so same-timestamp lines keep file order
    messages.sort_by_key(|m| m.0);
    Ok(messages)
}

fn log_event(event: &SceneEvent) {
    match event {
        SceneEvent::AlertChanged {
            frame,
            alert,
            background,
        } => info!(
            "[{}] alert '{}' ({:?}) on {:?}",
            frame, alert.alert_type, alert.size, background
        ),
        SceneEvent::CameraSwitched { frame, from, to, v_ego } => {
            info!("[{}] camera {:?} -> {:?} at {:.1} m/s", frame, from, to, v_ego)
        }
        SceneEvent::SlowFrame { frame, fps } => debug!("[{}] slow frame, {:.1} fps", frame, fps),
        SceneEvent::CalibrationFallback { frame } => {
            warn!("[{}] calibration invalid, default projection", frame)
        }
        SceneEvent::DecodeFailed { frame, topic } => warn!("[{}] bad {} payload", frame, topic),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let Some(log_path) = args.get(1) else {
        let program = args.first().map(String::as_str).unwrap_or("onroad-scene");
        bail!("usage: {} <log.jsonl> [config.yaml]", program);
    };
    let config_path = args.get(2).map(String::as_str).unwrap_or("config.yaml");
    let config = Config::load_or_default(config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.level))
        .init();

    info!("Onroad scene replay starting");

    let params: Arc<dyn ParamStore> = match env::var("ONROAD_PARAMS_DIR") {
        Ok(dir) => {
            info!("Params from {}", dir);
            Arc::new(DirParams::new(dir))
        }
        Err(_) => Arc::new(MemoryParams::new()),
    };
    info!("{}", mounting_description(params.as_ref()));

    let messages = read_log(log_path)?;
    let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
        warn!("No messages in {}", log_path);
        return Ok(());
    };
    let (start_ms, end_ms) = (first.0, last.0);
    info!(
        "Loaded {} messages spanning {:.1} s",
        messages.len(),
        (end_ms - start_ms) as f64 / 1000.0
    );

    let bus = InMemoryBus::new();
    let mut pipeline = ScenePipeline::new(SceneContext::new(config.clone(), params));
    let tick_ms = (1000.0 / config.sampler.ui_freq_hz).max(1.0) as u64;

    let mut pending = messages.into_iter().peekable();
    let mut now = start_ms;
    while now <= end_ms {
        while let Some((t_ms, topic, value, valid)) = pending.next_if(|m| m.0 <= now) {
            bus.publish(topic, value, t_ms, valid);
        }
        if let Some(frame) = pipeline.step(&bus, CameraFeed::dual(), now) {
            debug!(
                "frame {}: {:?} cam, {} lead(s), alert '{}'",
                frame.frame,
                frame.camera,
                frame.leads.len(),
                frame.alert.alert_type
            );
        }
        for event in pipeline.drain_events() {
            log_event(&event);
        }
        now += tick_ms;
    }

    let summary = pipeline.metrics().summary();
    info!(
        "Replay finished: {} ticks, {} drawn, {} skipped, {} alert changes, {} camera switches",
        summary.ticks,
        summary.frames_drawn,
        summary.frames_skipped,
        summary.alert_changes,
        summary.camera_switches
    );
    info!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
