use dashcore::{CoreResult, Detection, DetectionService, Thresholds};
use image::DynamicImage;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Labels handed out when no palette is configured.
pub const DEFAULT_LABELS: [&str; 8] = [
    "person",
    "car",
    "bicycle",
    "dog",
    "cat",
    "bird",
    "truck",
    "traffic light",
];

/// Offline stand-in for the detection service.
///
/// Detections are drawn from a PRNG seeded with the configured seed and a
/// fingerprint of the frame, so the same image always yields the same labels.
#[derive(Debug, Clone)]
pub struct SyntheticDetector {
    seed: u64,
    labels: Vec<String>,
    max_per_image: usize,
}

impl SyntheticDetector {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            labels: DEFAULT_LABELS.iter().map(|label| label.to_string()).collect(),
            max_per_image: 5,
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        if !labels.is_empty() {
            self.labels = labels;
        }
        self
    }

    pub fn with_max_per_image(mut self, max_per_image: usize) -> Self {
        self.max_per_image = max_per_image;
        self
    }

    fn fingerprint(&self, image: &DynamicImage) -> u64 {
        let dims = ((image.width() as u64) << 32) | image.height() as u64;
        image
            .to_rgb8()
            .as_raw()
            .iter()
            .step_by(97)
            .fold(self.seed ^ dims, |acc, &byte| {
                acc.rotate_left(5) ^ byte as u64
            })
    }
}

impl DetectionService for SyntheticDetector {
    fn detect(&self, image: &DynamicImage, thresholds: Thresholds) -> CoreResult<Vec<Detection>> {
        let mut rng = StdRng::seed_from_u64(self.fingerprint(image));
        let count = rng.gen_range(0..=self.max_per_image);
        let floor = thresholds.confidence.clamp(0.0, 0.99);

        let detections = (0..count)
            .map(|_| {
                let label = &self.labels[rng.gen_range(0..self.labels.len())];
                Detection::new(label.clone(), rng.gen_range(floor..1.0))
            })
            .collect();
        Ok(detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frame(shade: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([shade, 0, 255 - shade])))
    }

    #[test]
    fn same_frame_yields_same_detections() {
        let detector = SyntheticDetector::new(42);
        let first = detector.detect(&frame(10), Thresholds::default()).unwrap();
        let second = detector.detect(&frame(10), Thresholds::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn detections_respect_palette_limit_and_confidence_floor() {
        let detector = SyntheticDetector::new(3)
            .with_labels(vec!["cat".into(), "dog".into()])
            .with_max_per_image(4);
        for shade in 0..32u8 {
            let detections = detector.detect(&frame(shade * 8), Thresholds::default()).unwrap();
            assert!(detections.len() <= 4);
            for detection in detections {
                assert!(detection.label == "cat" || detection.label == "dog");
                assert!(detection.confidence >= 0.6);
            }
        }
    }
}
