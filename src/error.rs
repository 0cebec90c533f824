// src/error.rs
//
// Every variant is recovered inside the pipeline. Callers log and fall back;
// nothing here is meant to abort a tick.

use crate::messages::Topic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("topic {0} has not been received since start")]
    MissingData(Topic),

    #[error("calibration invalid, using default projection")]
    InvalidCalibration,

    #[error("persisted {key} is malformed: {source}")]
    MalformedPersistedState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode {topic} payload: {source}")]
    Decode {
        topic: Topic,
        #[source]
        source: serde_json::Error,
    },

    #[error("parameter store I/O on {key}: {source}")]
    ParamIo {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

pub type SceneResult<T> = std::result::Result<T, SceneError>;
