// src/overlay/alert.rs
//
// Picks the single alert to show and the severity tier behind it. The
// controller's own alert passes through; when the controller goes quiet the
// display substitutes its own timeout alerts.

use crate::messages::{AlertSize, AlertStatus, ControlsState, OpState};
use crate::types::AlertConfig;
use serde::Serialize;
use tracing::{info, warn};

// ============================================================================
// ALERTS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKey {
    ControlsWaiting,
    ControlsUnresponsive,
    ControlsUnresponsivePermanent,
}

impl AlertKey {
    pub fn type_name(&self) -> &'static str {
        match self {
            AlertKey::ControlsWaiting => "controlsWaiting",
            AlertKey::ControlsUnresponsive => "controlsUnresponsive",
            AlertKey::ControlsUnresponsivePermanent => "controlsUnresponsivePermanent",
        }
    }

    pub fn from_type_name(name: &str) -> Option<Self> {
        [
            AlertKey::ControlsWaiting,
            AlertKey::ControlsUnresponsive,
            AlertKey::ControlsUnresponsivePermanent,
        ]
        .into_iter()
        .find(|k| k.type_name() == name)
    }

    pub fn alert(&self) -> Alert {
        let (text1, text2, size, status) = match self {
            AlertKey::ControlsWaiting => (
                "Driver Assistance Unavailable",
                "Waiting for controls to start",
                AlertSize::Mid,
                AlertStatus::Normal,
            ),
            AlertKey::ControlsUnresponsive => (
                "TAKE CONTROL IMMEDIATELY",
                "Controls Unresponsive",
                AlertSize::Full,
                AlertStatus::Critical,
            ),
            AlertKey::ControlsUnresponsivePermanent => (
                "Controls Unresponsive",
                "Reboot Device",
                AlertSize::Mid,
                AlertStatus::Normal,
            ),
        };
        Alert {
            alert_type: self.type_name().to_string(),
            text1: text1.to_string(),
            text2: text2.to_string(),
            size,
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Alert {
    pub alert_type: String,
    pub text1: String,
    pub text2: String,
    pub size: AlertSize,
    pub status: AlertStatus,
}

impl Alert {
    /// The no-alert sentinel.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }

    pub fn from_controls(cs: &ControlsState) -> Self {
        Self {
            alert_type: cs.alert_type.clone(),
            text1: cs.alert_text1.clone(),
            text2: cs.alert_text2.clone(),
            size: cs.alert_size,
            status: cs.alert_status,
        }
    }

    pub fn key(&self) -> Option<AlertKey> {
        AlertKey::from_type_name(&self.alert_type)
    }
}

/// What the selector needs to know about the controlsState topic this tick.
#[derive(Debug, Clone, Copy)]
pub struct AlertInputs<'a> {
    pub controls: &'a ControlsState,
    /// Frame at which controlsState was last received, if ever
    pub controls_rcv_frame: Option<u64>,
    pub controls_rcv_time_ms: Option<u64>,
    pub controls_updated: bool,
    pub frame: u64,
    pub started_frame: u64,
    pub now_ms: u64,
    pub ui_freq_hz: f32,
}

pub fn select_alert(inputs: &AlertInputs<'_>, config: &AlertConfig) -> Alert {
    let seen_since_start = inputs
        .controls_rcv_frame
        .map(|f| f >= inputs.started_frame)
        .unwrap_or(false);

    // Never surface an alert left over from before start
    let mut alert = if seen_since_start {
        Alert::from_controls(inputs.controls)
    } else {
        Alert::none()
    };

    let grace_frames = (config.startup_grace_s * inputs.ui_freq_hz) as u64;
    let since_start = inputs.frame.saturating_sub(inputs.started_frame);
    if inputs.controls_updated || since_start <= grace_frames {
        return alert;
    }

    if !seen_since_start {
        alert = AlertKey::ControlsWaiting.alert();
    } else {
        let last_ms = inputs.controls_rcv_time_ms.unwrap_or(0);
        // Whole seconds
        let missing_s = (inputs.now_ms.saturating_sub(last_ms) / 1000) as f32;
        if missing_s > config.controls_timeout_s {
            alert = if inputs.controls.enabled
                && missing_s - config.controls_timeout_s < config.permanent_after_s
            {
                AlertKey::ControlsUnresponsive.alert()
            } else {
                AlertKey::ControlsUnresponsivePermanent.alert()
            };
        }
    }
    alert
}

// ============================================================================
// STATUS / BACKGROUND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum UiStatus {
    #[default]
    Disengaged,
    Override,
    Engaged,
    Warning,
    Alert,
}

impl UiStatus {
    /// Status derived from a fresh controlsState.
    pub fn from_controls(cs: &ControlsState) -> Self {
        match cs.alert_status {
            AlertStatus::UserPrompt => UiStatus::Warning,
            AlertStatus::Critical => UiStatus::Alert,
            AlertStatus::Normal => match cs.state {
                OpState::PreEnabled | OpState::Overriding => UiStatus::Override,
                _ if cs.enabled => UiStatus::Engaged,
                _ => UiStatus::Disengaged,
            },
        }
    }

    pub fn background(&self) -> BackgroundColor {
        let (r, g, b) = match self {
            UiStatus::Disengaged => (0x17, 0x33, 0x49),
            UiStatus::Override => (0x91, 0x9b, 0x95),
            UiStatus::Engaged => (0x17, 0x86, 0x44),
            UiStatus::Warning => (0xDA, 0x6F, 0x25),
            UiStatus::Alert => (0xC9, 0x22, 0x31),
        };
        BackgroundColor { r, g, b }
    }
}

/// Background tier behind `alert`. Controller timeouts override the status.
pub fn background_tier(status: UiStatus, alert: &Alert) -> UiStatus {
    match alert.key() {
        Some(AlertKey::ControlsUnresponsive) => UiStatus::Alert,
        Some(AlertKey::ControlsUnresponsivePermanent) => UiStatus::Disengaged,
        _ => status,
    }
}

// ============================================================================
// CHANGE DETECTION
// ============================================================================

/// Remembers the last surfaced (alert, tier) pair.
#[derive(Debug, Default)]
pub struct AlertChangeDetector {
    last: Option<(Alert, UiStatus)>,
}

impl AlertChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the pair differs from the previous one.
    pub fn observe(&mut self, alert: &Alert, tier: UiStatus) -> bool {
        if let Some((last_alert, last_tier)) = &self.last {
            if last_alert == alert && *last_tier == tier {
                return false;
            }
        }
        match alert.key() {
            Some(AlertKey::ControlsUnresponsive) => warn!("Controls unresponsive: {}", alert.text2),
            Some(_) => info!("Alert: {} / {}", alert.text1, alert.text2),
            None if !alert.is_none() => info!("Alert {}: {}", alert.alert_type, alert.text1),
            None => info!("Alert cleared"),
        }
        self.last = Some((alert.clone(), tier));
        true
    }
}
