//! Core of the vision dashboard.
//!
//! The modules cover credential storage, per-caller sessions, the batch
//! detection pipeline with its aggregation and chart specs, and the reducer
//! that turns dashboard triggers into one consistent view state.

pub mod auth;
pub mod detection;
pub mod prelude;
pub mod processing;
pub mod reducer;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use prelude::{CoreError, CoreResult, Detection, DetectionService, Thresholds};
pub use reducer::{Dashboard, Event, Outcome, Signals, TriggerMode, ViewState};
