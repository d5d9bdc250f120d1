pub mod dashboard;
pub mod event;
pub mod view;

pub use dashboard::{Dashboard, Outcome, ProcessOutcome, RegisterOutcome};
pub use event::{Event, Signals, TriggerMode};
pub use view::ViewState;
