//! Pointer sampling and synthetic input

use parking_lot::Mutex;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("pointer position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("input injection rejected: {0}")]
    Injection(String),
    #[error("input backend unavailable: {0}")]
    Backend(String),
}

pub type DriverResult<T> = Result<T, DriverError>;

/// Reads the pointer and injects moves and primary clicks.
pub trait PointerDriver: Send + Sync {
    fn position(&self) -> DriverResult<(i32, i32)>;
    fn move_to(&self, x: i32, y: i32) -> DriverResult<()>;
    /// Primary-button click at the current pointer position.
    fn click(&self) -> DriverResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move { x: i32, y: i32 },
    Click { x: i32, y: i32 },
}

#[derive(Default)]
struct RecordingState {
    pointer: Option<(i32, i32)>,
    actions: Vec<Action>,
    failing: HashSet<(i32, i32)>,
}

/// Driver that injects nothing and records what it was asked to do.
///
/// Used for dry runs. A move to a coordinate registered with
/// [`fail_at`](Self::fail_at) is rejected, and so is `position()` while no
/// pointer position is set.
#[derive(Default)]
pub struct RecordingDriver {
    state: Mutex<RecordingState>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pointer(x: i32, y: i32) -> Self {
        let driver = Self::default();
        driver.set_pointer(Some((x, y)));
        driver
    }

    pub fn set_pointer(&self, pointer: Option<(i32, i32)>) {
        self.state.lock().pointer = pointer;
    }

    pub fn fail_at(&self, x: i32, y: i32) {
        self.state.lock().failing.insert((x, y));
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().actions.clone()
    }

    /// Coordinates of every click, in order.
    pub fn clicks(&self) -> Vec<(i32, i32)> {
        self.state
            .lock()
            .actions
            .iter()
            .filter_map(|a| match a {
                Action::Click { x, y } => Some((*x, *y)),
                Action::Move { .. } => None,
            })
            .collect()
    }

    pub fn click_count(&self) -> usize {
        self.clicks().len()
    }
}

impl PointerDriver for RecordingDriver {
    fn position(&self) -> DriverResult<(i32, i32)> {
        self.state
            .lock()
            .pointer
            .ok_or_else(|| DriverError::PositionUnavailable("no pointer".into()))
    }

    fn move_to(&self, x: i32, y: i32) -> DriverResult<()> {
        let mut state = self.state.lock();
        if state.failing.contains(&(x, y)) {
            return Err(DriverError::Injection(format!("move to ({}, {}) refused", x, y)));
        }
        state.pointer = Some((x, y));
        state.actions.push(Action::Move { x, y });
        tracing::trace!(x, y, "move");
        Ok(())
    }

    fn click(&self) -> DriverResult<()> {
        let mut state = self.state.lock();
        let (x, y) = state
            .pointer
            .ok_or_else(|| DriverError::Injection("click without pointer".into()))?;
        state.actions.push(Action::Click { x, y });
        tracing::trace!(x, y, "click");
        Ok(())
    }
}
