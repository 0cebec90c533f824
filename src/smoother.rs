// src/smoother.rs
//
// Temporal filters that carry state from one tick to the next. These are the
// only pieces of the pipeline that are not recomputed from the snapshot.

use serde::Serialize;

/// Discrete first-order low-pass filter.
///
/// `k = (dt/tc) / (1 + dt/tc)`, `x ← (1 − k)·x + k·input`.
#[derive(Debug, Clone, Copy)]
pub struct FirstOrderFilter {
    x: f64,
    k: f64,
}

impl FirstOrderFilter {
    /// # Arguments
    /// * `x0` - Initial output
    /// * `time_constant` - Filter time constant in seconds
    /// * `dt` - Nominal update period in seconds
    pub fn new(x0: f64, time_constant: f64, dt: f64) -> Self {
        let ratio = dt / time_constant;
        Self {
            x: x0,
            k: ratio / (1.0 + ratio),
        }
    }

    pub fn update(&mut self, input: f64) -> f64 {
        self.x = (1.0 - self.k) * self.x + self.k * input;
        self.x
    }

    pub fn value(&self) -> f64 {
        self.x
    }
}

/// Engagement fade scalar: moves toward 1 while the driver-monitoring system
/// is passive and toward 0 while it is active, one `rate / 2` step per tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FadeFilter {
    value: f32,
    rate: f32,
}

impl FadeFilter {
    pub fn new(rate: f32) -> Self {
        Self { value: 0.0, rate }
    }

    pub fn update(&mut self, active: bool) -> f32 {
        let active = if active { 1.0 } else { 0.0 };
        self.value = (self.value + self.rate * (0.5 - active)).clamp(0.0, 1.0);
        self.value
    }

    pub fn value(&self) -> f32 {
        self.value
    }
}

/// Head pose smoothing for pitch, yaw and roll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PoseSmoother {
    /// Smoothed pose per axis
    pub vals: [f32; 3],
    /// Absolute change of the (scaled) raw sample from the previous smoothed value
    pub diffs: [f32; 3],
    pub sins: [f32; 3],
    pub coss: [f32; 3],
}

impl PoseSmoother {
    /// Feed one face orientation sample. `fade` flattens the pose toward zero
    /// as the monitoring icon fades out.
    pub fn update(&mut self, orientation: [f32; 3], fade: f32, alpha: f32) {
        for i in 0..3 {
            // Looking down reads stronger than looking up
            let gain = match i {
                0 if orientation[i] < 0.0 => 0.7,
                0 => 0.9,
                _ => 0.4,
            };
            let v_this = gain * orientation[i];
            self.diffs[i] = (self.vals[i] - v_this).abs();
            self.vals[i] = alpha * v_this + (1.0 - alpha) * self.vals[i];
            let angle = self.vals[i] * (1.0 - fade);
            self.sins[i] = angle.sin();
            self.coss[i] = angle.cos();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_stays_in_unit_interval() {
        let mut fade = FadeFilter::new(0.2);
        let pattern = [false, false, true, false, true, true, true, false];
        for _ in 0..50 {
            for &active in &pattern {
                let v = fade.update(active);
                assert!((0.0..=1.0).contains(&v), "fade escaped [0,1]: {}", v);
            }
        }
    }

    #[test]
    fn test_fade_rises_toward_one_without_overshoot() {
        let mut fade = FadeFilter::new(0.2);
        let mut prev = fade.value();
        for _ in 0..3 {
            let v = fade.update(false);
            assert!(v > prev);
            prev = v;
        }
        assert!((prev - 0.3).abs() < 1e-6);

        for _ in 0..100 {
            fade.update(false);
        }
        assert_eq!(fade.value(), 1.0);
    }

    #[test]
    fn test_first_order_filter_converges() {
        let mut filter = FirstOrderFilter::new(20.0, 3.0, 0.05);
        for _ in 0..2000 {
            filter.update(10.0);
        }
        assert!((filter.value() - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_pose_smoother_zero_fade() {
        let mut pose = PoseSmoother::default();
        pose.update([-0.5, 0.5, 0.0], 0.0, 0.8);
        // pitch: 0.7 * -0.5 = -0.35, smoothed 0.8 * -0.35
        assert!((pose.vals[0] + 0.28).abs() < 1e-6);
        assert!((pose.diffs[0] - 0.35).abs() < 1e-6);
        assert!((pose.vals[1] - 0.16).abs() < 1e-6);
        assert!((pose.sins[1] - 0.16f32.sin()).abs() < 1e-6);

        // Fully faded out: angles collapse to zero
        pose.update([-0.5, 0.5, 0.0], 1.0, 0.8);
        assert_eq!(pose.sins, [0.0; 3]);
        assert_eq!(pose.coss, [1.0; 3]);
    }
}
