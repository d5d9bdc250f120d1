use crate::processing::aggregate::LabelDistribution;
use serde::{Deserialize, Serialize};

pub const AREA_TITLE: &str = "Object distribution (area)";
pub const HEATMAP_TITLE: &str = "Object distribution heatmap";
pub const X_AXIS_TITLE: &str = "Object types";
pub const AREA_Y_AXIS_TITLE: &str = "Count";
pub const HEATMAP_ROW: &str = "Objects";
pub const HEATMAP_COLORSCALE: &str = "Viridis";
pub const HEATMAP_HEIGHT: u32 = 300;

/// Renderable figure description: series plus layout.
///
/// The default value is the empty chart and serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Trace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter {
        x: Vec<String>,
        y: Vec<usize>,
        mode: String,
        name: String,
        fill: String,
    },
    Heatmap {
        z: Vec<Vec<usize>>,
        x: Vec<String>,
        y: Vec<String>,
        colorscale: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: String,
    pub xaxis: Axis,
    pub yaxis: Axis,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
}

impl Axis {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
        }
    }
}

impl ChartSpec {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.layout.is_none()
    }
}

/// Filled line chart: x = labels, y = counts.
pub fn build_area_chart(distribution: &LabelDistribution) -> ChartSpec {
    ChartSpec {
        data: vec![Trace::Scatter {
            x: distribution.labels(),
            y: distribution.counts(),
            mode: "lines".into(),
            name: "Object type distribution".into(),
            fill: "tozeroy".into(),
        }],
        layout: Some(Layout {
            title: AREA_TITLE.into(),
            xaxis: Axis::titled(X_AXIS_TITLE),
            yaxis: Axis::titled(AREA_Y_AXIS_TITLE),
            height: None,
        }),
    }
}

/// Single-row heatmap: one column per label.
pub fn build_heatmap_chart(distribution: &LabelDistribution) -> ChartSpec {
    ChartSpec {
        data: vec![Trace::Heatmap {
            z: vec![distribution.counts()],
            x: distribution.labels(),
            y: vec![HEATMAP_ROW.into()],
            colorscale: HEATMAP_COLORSCALE.into(),
        }],
        layout: Some(Layout {
            title: HEATMAP_TITLE.into(),
            xaxis: Axis::titled(X_AXIS_TITLE),
            yaxis: Axis::titled(HEATMAP_ROW),
            height: Some(HEATMAP_HEIGHT),
        }),
    }
}
