pub mod http;

pub use http::{HttpDetectionService, DEFAULT_ENDPOINT};
