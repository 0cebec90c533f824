use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::warn;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate();
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            warn!("Config {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) {
        if self.calibration.wide_below_speed >= self.calibration.narrow_above_speed {
            warn!(
                "Camera hysteresis band is empty (wide below {:.1}, narrow above {:.1})",
                self.calibration.wide_below_speed, self.calibration.narrow_above_speed
            );
        }
        if self.sampler.ui_freq_hz <= 0.0 {
            warn!("ui_freq_hz must be positive, got {}", self.sampler.ui_freq_hz);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "lead:\n  min_separation: 4.5\ndriver:\n  fade_rate: 0.1\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.lead.min_separation, 4.5);
        assert_eq!(config.lead.alert_distance, 40.0);
        assert_eq!(config.driver.fade_rate, 0.1);
        assert_eq!(config.calibration.wide_below_speed, 10.0);
        assert_eq!(config.path.trajectory_size, 33);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = Config::load_or_default("/nonexistent/onroad-scene.yaml").unwrap();
        assert_eq!(config.pipeline.skip_frame_retries, 5);
    }
}
