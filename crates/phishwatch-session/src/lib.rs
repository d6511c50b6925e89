//! Client-side orchestration: per-operation lifecycles and the primary-view/selection coordinator.

pub mod operation;
mod session;

pub use operation::{OperationController, OperationState, Outcome, Status, Ticket, TriggerPolicy};
pub use session::{PrimarySource, SelectedScan, Session, SessionLimits};
