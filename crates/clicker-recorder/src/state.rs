//! Run state shared by the controller, the engine and the cancel listener

use crate::cancel::CancelToken;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Where the engine is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    RunningPre,
    RunningMain,
    RunningPost,
}

impl PlaybackState {
    fn to_u8(self) -> u8 {
        match self {
            PlaybackState::Idle => 0,
            PlaybackState::RunningPre => 1,
            PlaybackState::RunningMain => 2,
            PlaybackState::RunningPost => 3,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => PlaybackState::RunningPre,
            2 => PlaybackState::RunningMain,
            3 => PlaybackState::RunningPost,
            _ => PlaybackState::Idle,
        }
    }
}

/// `{ running, cancel_requested }` for the single active run, plus the
/// engine's current state. Owned by one controller, never global.
#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    state: AtomicU8,
    token: Mutex<Option<CancelToken>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn set_playback_state(&self, state: PlaybackState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    pub fn cancel_requested(&self) -> bool {
        self.token
            .lock()
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }

    /// Cancel the active run. Returns false when nothing is running.
    pub fn request_cancel(&self) -> bool {
        match self.token.lock().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Atomically claim the single run slot.
    pub(crate) fn try_begin(&self, token: CancelToken) -> bool {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        *self.token.lock() = Some(token);
        true
    }

    /// Back to `{ running: false, cancel_requested: false }`, state `Idle`.
    pub(crate) fn finish(&self) {
        self.token.lock().take();
        self.set_playback_state(PlaybackState::Idle);
        self.running.store(false, Ordering::SeqCst);
    }
}
