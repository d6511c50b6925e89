//! Per-operation request lifecycle: `idle → loading → succeeded | failed`.
//!
//! Each independently triggerable operation owns one [`OperationController`].
//! Controllers share no state, so one operation failing or being in flight
//! never affects another. Interior mutability is `Cell`/`RefCell` only: the
//! controllers are driven from a single cooperative thread and no borrow is
//! held across an `.await`.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;

use phishwatch_client::ApiError;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one operation.
///
/// `data` is present only when `succeeded`, `error` only when `failed`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationState<T> {
    status: Status,
    data: Option<T>,
    error: Option<String>,
}

impl<T> OperationState<T> {
    fn idle() -> Self {
        Self {
            status: Status::Idle,
            data: None,
            error: None,
        }
    }

    fn loading() -> Self {
        Self {
            status: Status::Loading,
            data: None,
            error: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }
}

/// What to do with a trigger that arrives while a call is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TriggerPolicy {
    /// Drop the trigger. At most one call per controller is ever in flight.
    #[default]
    IgnoreWhileLoading,
    /// Start a new call; the earlier one's response is discarded when it lands.
    Supersede,
}

/// Proof that a call was dispatched, carrying its sequence number.
///
/// Only [`OperationController::begin`] hands these out, so a controller can
/// never complete without first entering `loading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Result of one trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The controller was loading; nothing was dispatched.
    Ignored,
    /// A newer call was issued before this one finished; its result was dropped.
    Stale,
    Succeeded(T),
    Failed(ApiError),
}

impl<T> Outcome<T> {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

pub struct OperationController<T> {
    name: &'static str,
    policy: TriggerPolicy,
    state: RefCell<OperationState<T>>,
    issued: Cell<u64>,
}

impl<T: Clone> OperationController<T> {
    pub fn new(name: &'static str) -> Self {
        Self::with_policy(name, TriggerPolicy::default())
    }

    pub fn with_policy(name: &'static str, policy: TriggerPolicy) -> Self {
        Self {
            name,
            policy,
            state: RefCell::new(OperationState::idle()),
            issued: Cell::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> OperationState<T> {
        self.state.borrow().clone()
    }

    pub fn status(&self) -> Status {
        self.state.borrow().status
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.borrow().data.clone()
    }

    /// Enter `loading` and issue a ticket, unless the policy drops the trigger.
    pub fn begin(&self) -> Option<Ticket> {
        let mut state = self.state.borrow_mut();
        if state.status == Status::Loading && self.policy == TriggerPolicy::IgnoreWhileLoading {
            warn!(op = self.name, "trigger ignored while loading");
            return None;
        }
        let seq = self.issued.get() + 1;
        self.issued.set(seq);
        *state = OperationState::loading();
        debug!(op = self.name, seq, "loading");
        Some(Ticket(seq))
    }

    /// Apply a call's result if `ticket` is the latest one issued.
    pub fn complete(&self, ticket: Ticket, result: Result<T, ApiError>) -> Outcome<T> {
        if ticket.0 != self.issued.get() {
            warn!(
                op = self.name,
                seq = ticket.0,
                latest = self.issued.get(),
                "discarding stale response"
            );
            return Outcome::Stale;
        }

        let mut state = self.state.borrow_mut();
        match result {
            Ok(data) => {
                debug!(op = self.name, seq = ticket.0, "succeeded");
                *state = OperationState {
                    status: Status::Succeeded,
                    data: Some(data.clone()),
                    error: None,
                };
                Outcome::Succeeded(data)
            }
            Err(err) => {
                debug!(op = self.name, seq = ticket.0, kind = err.kind(), error = %err, "failed");
                *state = OperationState {
                    status: Status::Failed,
                    data: None,
                    error: Some(err.to_string()),
                };
                Outcome::Failed(err)
            }
        }
    }

    /// Trigger the operation: `call` is only invoked when the trigger is accepted.
    pub async fn run<F, Fut>(&self, call: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Some(ticket) = self.begin() else {
            return Outcome::Ignored;
        };
        let result = call().await;
        self.complete(ticket, result)
    }
}
