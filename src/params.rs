// src/params.rs
//
// Read-mostly key/value feature flags shared with the rest of the system.
// The store is external state; the pipeline only reads it.

use crate::error::{SceneError, SceneResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::warn;

pub mod keys {
    pub const EXPERIMENTAL_MODE_CONFIRMED: &str = "ExperimentalModeConfirmed";
    pub const EXPERIMENTAL_LONGITUDINAL_ENABLED: &str = "ExperimentalLongitudinalEnabled";
    pub const IS_METRIC: &str = "IsMetric";
    pub const CALIBRATION_PARAMS: &str = "CalibrationParams";
    /// 0 off, 1 map app, 2 external navigation
    pub const NAVI_SELECT: &str = "OpkrNaviSelect";
    pub const COMMA_STOCK_UI: &str = "CommaStockUI";
}

pub trait ParamStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&self, key: &str, value: &str) -> SceneResult<()>;
    fn remove(&self, key: &str) -> SceneResult<()>;

    fn get_bool(&self, key: &str) -> bool {
        self.get(key).map(|v| v.trim() == "1").unwrap_or(false)
    }

    /// Unset or unparsable values read as 0.
    fn get_int(&self, key: &str) -> i64 {
        self.get(key).and_then(|v| v.trim().parse().ok()).unwrap_or(0)
    }

    fn put_bool(&self, key: &str, value: bool) -> SceneResult<()> {
        self.put(key, if value { "1" } else { "0" })
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryParams {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryParams {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParamStore for MemoryParams {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> SceneResult<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SceneResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

// ============================================================================
// DIRECTORY STORE
// ============================================================================

/// One file per key under `root`, the layout used by the device param daemon.
#[derive(Debug, Clone)]
pub struct DirParams {
    root: PathBuf,
}

impl DirParams {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ParamStore for DirParams {
    fn get(&self, key: &str) -> Option<String> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read param {}: {}", key, e);
                None
            }
        }
    }

    fn put(&self, key: &str, value: &str) -> SceneResult<()> {
        let io_err = |source| SceneError::ParamIo {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.root).map_err(io_err)?;
        // Readers never observe a half-written value
        let tmp = self.root.join(format!(".{}.tmp", key));
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, self.key_path(key)).map_err(io_err)
    }

    fn remove(&self, key: &str) -> SceneResult<()> {
        match fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SceneError::ParamIo {
                key: key.to_string(),
                source,
            }),
        }
    }
}
