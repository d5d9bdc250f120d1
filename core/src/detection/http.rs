use crate::prelude::{CoreError, CoreResult, Detection, DetectionService, Thresholds};
use image::{DynamicImage, ImageFormat};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::io::Cursor;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8500/detect";

#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<Detection>,
}

/// Detection service reached over HTTP.
///
/// Each frame is posted as PNG with the thresholds as `iou` / `conf` query
/// parameters; the reply is `{"detections": [{"label": .., "confidence": ..}]}`.
pub struct HttpDetectionService {
    client: Client,
    endpoint: String,
}

impl HttpDetectionService {
    pub fn new(endpoint: impl Into<String>) -> CoreResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| CoreError::DetectionService(format!("building HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DetectionService for HttpDetectionService {
    fn detect(&self, image: &DynamicImage, thresholds: Thresholds) -> CoreResult<Vec<Detection>> {
        let mut body = Cursor::new(Vec::new());
        image
            .write_to(&mut body, ImageFormat::Png)
            .map_err(|e| CoreError::DetectionService(format!("encoding frame: {e}")))?;

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("iou", thresholds.iou), ("conf", thresholds.confidence)])
            .header(CONTENT_TYPE, "image/png")
            .body(body.into_inner())
            .send()
            .map_err(|e| CoreError::DetectionService(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::DetectionService(format!(
                "{} answered {}",
                self.endpoint, status
            )));
        }

        let parsed: DetectResponse = response
            .json()
            .map_err(|e| CoreError::DetectionService(format!("malformed reply: {e}")))?;
        Ok(parsed.detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_without_detections_parses_as_empty() {
        let parsed: DetectResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.detections.is_empty());
    }

    #[test]
    fn reply_detections_default_missing_confidence() {
        let parsed: DetectResponse =
            serde_json::from_str(r#"{"detections":[{"label":"cat"},{"label":"dog","confidence":0.9}]}"#)
                .unwrap();
        assert_eq!(parsed.detections[0], Detection::new("cat", 0.0));
        assert_eq!(parsed.detections[1].label, "dog");
    }

    #[test]
    fn unreachable_endpoint_is_a_detection_service_error() {
        let service = HttpDetectionService::new("http://127.0.0.1:1/detect").unwrap();
        let frame = DynamicImage::new_rgb8(2, 2);
        let err = service.detect(&frame, Thresholds::default()).unwrap_err();
        assert!(matches!(err, CoreError::DetectionService(_)));
    }
}
