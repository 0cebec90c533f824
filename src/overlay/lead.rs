// src/overlay/lead.rs
//
// Up to two lead-vehicle markers placed on the path, sized by distance and
// tinted by how urgently the gap is closing.

use crate::calibration::Projector;
use crate::messages::{LeadData, RadarState, XyztData};
use crate::overlay::path::path_length_idx;
use crate::types::{LeadConfig, PathConfig, Point2};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LeadSource {
    Radar,
    Vision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadDescriptor {
    /// 0 for the closest lead, 1 for the second
    pub slot: usize,
    pub d_rel: f32,
    pub v_rel: f32,
    /// Marker apex after clamping to the viewport
    pub position: Point2,
    pub size: f32,
    /// Fill alpha, 0..=255
    pub intensity: f32,
    pub source: LeadSource,
    pub chevron: [Point2; 3],
    pub glow: [Point2; 3],
}

/// Fill alpha for a lead at `d_rel` metres closing at `v_rel` m/s.
pub fn lead_intensity(d_rel: f32, v_rel: f32, config: &LeadConfig) -> f32 {
    if d_rel >= config.alert_distance {
        return 0.0;
    }
    let mut alpha = 255.0 * (1.0 - d_rel / config.alert_distance);
    if v_rel < 0.0 {
        alpha += 255.0 * (-v_rel / config.closing_speed_scale);
    }
    alpha.clamp(0.0, 255.0).trunc()
}

pub fn marker_size(d_rel: f32) -> f32 {
    (750.0 / (d_rel / 3.0 + 30.0)).clamp(15.0, 30.0) * 2.35
}

/// Which of the two radar leads are drawn this tick.
pub fn visible_leads(radar: &RadarState, config: &LeadConfig) -> Vec<(usize, LeadData)> {
    let one = radar.lead_one;
    let two = radar.lead_two;
    let mut leads = Vec::with_capacity(2);
    if one.status {
        leads.push((0, one));
    }
    if two.status && (one.d_rel - two.d_rel).abs() > config.min_separation {
        leads.push((1, two));
    }
    leads
}

pub fn reduce_leads(
    radar: &RadarState,
    model_position: &XyztData,
    radar_distance: f32,
    projector: &Projector,
    config: &LeadConfig,
    path_config: &PathConfig,
) -> Vec<LeadDescriptor> {
    let viewport = projector.viewport();
    let source = if radar_distance < config.radar_distance_limit {
        LeadSource::Radar
    } else {
        LeadSource::Vision
    };

    visible_leads(radar, config)
        .into_iter()
        .filter_map(|(slot, lead)| {
            let z = model_position
                .z
                .get(path_length_idx(model_position, lead.d_rel))
                .copied()
                .unwrap_or(0.0);
            let height = z + path_config.path_height;
            let Some(vd) = projector.project_xyz(lead.d_rel, -lead.y_rel, height) else {
                debug!("Lead {} at {:.1} m does not project, dropped", slot, lead.d_rel);
                return None;
            };

            let size = marker_size(lead.d_rel);
            let x = vd.x.clamp(0.0, (viewport.width - size / 2.0).max(0.0));
            let y = vd.y.min(viewport.height - size * 0.6);
            let g_xo = size / 5.0;
            let g_yo = size / 10.0;

            Some(LeadDescriptor {
                slot,
                d_rel: lead.d_rel,
                v_rel: lead.v_rel,
                position: Point2::new(x, y),
                size,
                intensity: lead_intensity(lead.d_rel, lead.v_rel, config),
                source,
                chevron: [
                    Point2::new(x + size * 1.25, y + size),
                    Point2::new(x, y),
                    Point2::new(x - size * 1.25, y + size),
                ],
                glow: [
                    Point2::new(x + size * 1.35 + g_xo, y + size + g_yo),
                    Point2::new(x, y - g_xo),
                    Point2::new(x - size * 1.35 - g_xo, y + size + g_yo),
                ],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationState;
    use crate::types::{CalibrationConfig, Viewport};

    fn lead(d_rel: f32, v_rel: f32) -> LeadData {
        LeadData {
            d_rel,
            y_rel: 0.0,
            v_rel,
            status: true,
        }
    }

    fn flat_road() -> XyztData {
        XyztData {
            x: (0..33).map(|i| i as f32 * 3.0).collect(),
            y: vec![0.0; 33],
            z: vec![0.0; 33],
        }
    }

    #[test]
    fn test_second_lead_separation_boundary() {
        let config = LeadConfig::default();
        let radar = RadarState {
            lead_one: lead(20.0, 0.0),
            lead_two: lead(23.0, 0.0),
        };
        assert_eq!(visible_leads(&radar, &config).len(), 1);

        let radar = RadarState {
            lead_one: lead(20.0, 0.0),
            lead_two: lead(23.0001, 0.0),
        };
        let leads = visible_leads(&radar, &config);
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[1].0, 1);

        let mut radar = radar;
        radar.lead_two.status = false;
        assert_eq!(visible_leads(&radar, &config).len(), 1);
    }

    #[test]
    fn test_intensity_scenarios() {
        let config = LeadConfig::default();
        assert_eq!(lead_intensity(2.0, -8.0, &config), 255.0);
        assert_eq!(lead_intensity(50.0, -8.0, &config), 0.0);
        assert_eq!(lead_intensity(50.0, 8.0, &config), 0.0);
        assert_eq!(lead_intensity(40.0, -30.0, &config), 0.0);
        assert_eq!(lead_intensity(20.0, 0.0, &config), 127.0);
    }

    #[test]
    fn test_intensity_non_increasing_in_distance() {
        let config = LeadConfig::default();
        for v in [-12.0, -3.0, 0.0, 4.0] {
            let mut prev = f32::MAX;
            for step in 0..120 {
                let d = step as f32 * 0.5;
                let alpha = lead_intensity(d, v, &config);
                assert!((0.0..=255.0).contains(&alpha));
                assert!(alpha <= prev, "d={} v={} alpha={} prev={}", d, v, alpha, prev);
                prev = alpha;
            }
        }
    }

    #[test]
    fn test_marker_size_clamped() {
        assert!((marker_size(0.0) - 25.0 * 2.35).abs() < 1e-4);
        assert!((marker_size(-80.0) - 30.0 * 2.35).abs() < 1e-4);
        assert!((marker_size(500.0) - 15.0 * 2.35).abs() < 1e-4);
    }

    #[test]
    fn test_reduce_leads_geometry() {
        let projector = CalibrationState::default()
            .projector(&CalibrationConfig::default(), Viewport::new(2160.0, 1080.0));
        let radar = RadarState {
            lead_one: lead(30.0, -2.0),
            lead_two: lead(60.0, 0.0),
        };
        let leads = reduce_leads(
            &radar,
            &flat_road(),
            80.0,
            &projector,
            &LeadConfig::default(),
            &PathConfig::default(),
        );
        assert_eq!(leads.len(), 2);

        let near = &leads[0];
        assert_eq!(near.source, LeadSource::Radar);
        assert!((near.position.x - 1080.0).abs() < 1e-3);
        assert!(near.position.y > 540.0);
        assert_eq!(near.chevron[1], near.position);
        assert!(near.glow[1].y < near.position.y);
        // Further leads sit higher on screen and draw smaller
        assert!(leads[1].position.y < near.position.y);
        assert!(leads[1].size < near.size);
        assert_eq!(leads[1].intensity, 0.0);

        let vision = reduce_leads(
            &radar,
            &flat_road(),
            255.0,
            &projector,
            &LeadConfig::default(),
            &PathConfig::default(),
        );
        assert!(vision.iter().all(|l| l.source == LeadSource::Vision));
    }
}
