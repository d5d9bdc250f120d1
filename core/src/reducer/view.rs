use crate::processing::charts::ChartSpec;
use serde::{Deserialize, Serialize};

pub const LOGIN_REQUIRED: &str = "login required to process images";
pub const ACCESS_GRANTED: &str = "access granted";
pub const INVALID_CREDENTIALS: &str = "invalid credentials, try again";
pub const USER_EXISTS: &str = "user already exists";
pub const REGISTERED: &str = "registration successful, you may now log in";

pub fn processed_message(total: usize) -> String {
    format!("Processed objects: {total}")
}

pub fn processing_failed_message(reason: &str) -> String {
    format!("processing failed: {reason}")
}

/// Full output of one reducer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub area_chart: ChartSpec,
    pub heatmap_chart: ChartSpec,
    pub processing_message: String,
    pub access_message: String,
    pub dashboard_visible: bool,
    pub auth_panel_visible: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            area_chart: ChartSpec::empty(),
            heatmap_chart: ChartSpec::empty(),
            processing_message: String::new(),
            access_message: String::new(),
            dashboard_visible: false,
            auth_panel_visible: true,
        }
    }
}

impl ViewState {
    /// Auth panel shown, everything else empty.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Dashboard shown, auth panel hidden, everything else empty.
    pub fn dashboard() -> Self {
        Self {
            dashboard_visible: true,
            auth_panel_visible: false,
            ..Self::default()
        }
    }
}
