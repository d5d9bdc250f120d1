//! Fixtures shared by the unit tests.

use crate::prelude::{CoreError, CoreResult, Detection, DetectionService, Thresholds};
use image::{DynamicImage, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Emits one label per image chosen by the image width, counting calls.
pub(crate) struct WidthLabelDetector {
    pub calls: Arc<AtomicUsize>,
}

impl WidthLabelDetector {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl DetectionService for WidthLabelDetector {
    fn detect(&self, image: &DynamicImage, thresholds: Thresholds) -> CoreResult<Vec<Detection>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let label = match image.width() {
            1 => "cat",
            2 => "dog",
            3 => "bird",
            _ => return Ok(Vec::new()),
        };
        Ok(vec![Detection::new(label, thresholds.confidence)])
    }
}

/// Records the thresholds of every call and reports nothing.
#[derive(Default)]
pub(crate) struct RecordingDetector {
    pub seen: Arc<Mutex<Vec<Thresholds>>>,
}

impl DetectionService for RecordingDetector {
    fn detect(&self, _image: &DynamicImage, thresholds: Thresholds) -> CoreResult<Vec<Detection>> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(thresholds);
        }
        Ok(Vec::new())
    }
}

pub(crate) struct FailingDetector;

impl DetectionService for FailingDetector {
    fn detect(&self, _image: &DynamicImage, _thresholds: Thresholds) -> CoreResult<Vec<Detection>> {
        Err(CoreError::DetectionService("model unavailable".into()))
    }
}

/// Writes a `width` x 1 PNG into `dir`.
pub(crate) fn write_png(dir: &Path, name: &str, width: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::new(width, 1)
        .save_with_format(&path, image::ImageFormat::Png)
        .unwrap();
    path
}
