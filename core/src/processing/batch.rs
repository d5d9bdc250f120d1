use crate::prelude::{CoreError, CoreResult, DetectionService, Thresholds};
use crate::processing::scanner::scan_directory;
use crate::telemetry::log::LogManager;
use image::DynamicImage;
use log::debug;
use std::path::{Path, PathBuf};

/// Labels from one directory pass plus how the files fared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub labels: Vec<String>,
    pub scanned: usize,
    pub decoded: usize,
    pub skipped: usize,
}

/// Runs the detection service over every image in a directory.
pub struct BatchProcessor {
    image_dir: PathBuf,
    detector: Box<dyn DetectionService>,
    thresholds: Thresholds,
    logger: LogManager,
}

impl BatchProcessor {
    pub fn new<P: AsRef<Path>>(image_dir: P, detector: Box<dyn DetectionService>) -> Self {
        Self {
            image_dir: image_dir.as_ref().to_path_buf(),
            detector,
            thresholds: Thresholds::default(),
            logger: LogManager::new("batch"),
        }
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Scans, decodes and detects every image, concatenating all labels.
    ///
    /// Undecodable files are skipped. Any detection failure aborts the whole
    /// batch with [`CoreError::DetectionService`].
    pub fn run_batch(&self) -> CoreResult<BatchReport> {
        let files = scan_directory(&self.image_dir)?;
        let mut report = BatchReport {
            scanned: files.len(),
            ..Default::default()
        };

        for path in &files {
            let Some(image) = decode_image(path) else {
                report.skipped += 1;
                continue;
            };
            report.decoded += 1;

            let detections = self
                .detector
                .detect(&image, self.thresholds)
                .map_err(|err| match err {
                    CoreError::DetectionService(reason) => {
                        CoreError::DetectionService(format!("{}: {reason}", path.display()))
                    }
                    other => other,
                })?;
            report
                .labels
                .extend(detections.into_iter().map(|detection| detection.label));
        }

        self.logger.record(&format!(
            "{}: {} scanned, {} decoded, {} skipped, {} objects",
            self.image_dir.display(),
            report.scanned,
            report.decoded,
            report.skipped,
            report.labels.len()
        ));
        Ok(report)
    }
}

/// Decodes one image; failures are logged at debug level and yield `None`.
pub fn decode_image(path: &Path) -> Option<DynamicImage> {
    match image::open(path) {
        Ok(image) => Some(image),
        Err(err) => {
            debug!("skipping {}: {}", path.display(), err);
            None
        }
    }
}
