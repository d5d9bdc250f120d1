use crate::auth::SessionId;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Thresholds handed to the detection service on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub iou: f32,
    pub confidence: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            iou: 0.4,
            confidence: 0.6,
        }
    }
}

/// One object instance reported by the detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    #[serde(default)]
    pub confidence: f32,
}

impl Detection {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Common error type for the dashboard core.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("cannot read {path}: {reason}")]
    StorageRead { path: PathBuf, reason: String },
    #[error("cannot write {path}: {reason}")]
    StorageWrite { path: PathBuf, reason: String },
    #[error("user {0} already exists")]
    AlreadyExists(String),
    #[error("detection service failure: {0}")]
    DetectionService(String),
    #[error("cannot scan image directory {path}: {reason}")]
    Scan { path: PathBuf, reason: String },
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Object-detection model consumed as an opaque service.
///
/// Implementations run on the dashboard state thread.
pub trait DetectionService: Send {
    fn detect(&self, image: &DynamicImage, thresholds: Thresholds) -> CoreResult<Vec<Detection>>;
}
