pub mod aggregate;
pub mod batch;
pub mod charts;
pub mod scanner;

pub use aggregate::LabelDistribution;
pub use batch::{BatchProcessor, BatchReport};
pub use charts::{build_area_chart, build_heatmap_chart, ChartSpec};
pub use scanner::scan_directory;
