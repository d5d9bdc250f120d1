use anyhow::Context;
use dashcore::detection::DEFAULT_ENDPOINT;
use dashcore::TriggerMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const SYNTHETIC_DETECTOR: &str = "synthetic";

/// Where detections come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorKind {
    Synthetic,
    Http(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub image_dir: PathBuf,
    pub users_file: PathBuf,
    /// Detection endpoint URL, or `synthetic`.
    pub detector: String,
    pub synthetic_seed: u64,
    /// Label palette for the synthetic detector; empty keeps its defaults.
    pub synthetic_labels: Vec<String>,
    pub synthetic_max_per_image: usize,
    pub bind: SocketAddr,
    pub trigger_mode: TriggerMode,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            image_dir: PathBuf::from("images"),
            users_file: PathBuf::from("users.json"),
            detector: DEFAULT_ENDPOINT.to_string(),
            synthetic_seed: 0,
            synthetic_labels: Vec::new(),
            synthetic_max_per_image: 5,
            bind: SocketAddr::from(([127, 0, 0, 1], 9000)),
            trigger_mode: TriggerMode::Edge,
        }
    }
}

impl DashboardConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading dashboard config {}", path_ref.display()))?;
        let config: DashboardConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing dashboard config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line flags win over file values.
    pub fn apply_overrides(
        &mut self,
        image_dir: Option<PathBuf>,
        users_file: Option<PathBuf>,
        detector: Option<String>,
        legacy_triggers: bool,
    ) {
        if let Some(dir) = image_dir {
            self.image_dir = dir;
        }
        if let Some(file) = users_file {
            self.users_file = file;
        }
        if let Some(detector) = detector {
            self.detector = detector;
        }
        if legacy_triggers {
            self.trigger_mode = TriggerMode::Level;
        }
    }

    pub fn detector_kind(&self) -> DetectorKind {
        if self.detector.trim() == SYNTHETIC_DETECTOR {
            DetectorKind::Synthetic
        } else {
            DetectorKind::Http(self.detector.trim().to_string())
        }
    }
}
