//! Run controller - one playback run at a time
//!
//! `start` claims the run slot, snapshots the store, attaches a fresh
//! cancel listener and plays on a background thread. A guard owned by that
//! thread tears the listener down and resets the run state when the run
//! ends, including when the engine panics.

use crate::cancel::{CancelListener, CancelToken};
use crate::driver::PointerDriver;
use crate::engine::{PlaybackEngine, RunReport};
use crate::input::{Button, InputHub};
use crate::state::{PlaybackState, RunState};
use clicker_core::{Error, Result, SequenceStore, Settings};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Returned by a successful [`RunController::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Started {
    /// Steps in the snapshot the run plays.
    pub steps: usize,
    pub looped: bool,
}

pub struct RunController {
    store: SequenceStore,
    settings: Arc<RwLock<Settings>>,
    driver: Arc<dyn PointerDriver>,
    hub: InputHub,
    cancel_button: Button,
    state: Arc<RunState>,
    worker: Mutex<Option<JoinHandle<RunReport>>>,
}

impl RunController {
    pub fn new(
        store: SequenceStore,
        settings: Arc<RwLock<Settings>>,
        driver: Arc<dyn PointerDriver>,
        hub: InputHub,
    ) -> Self {
        Self {
            store,
            settings,
            driver,
            hub,
            cancel_button: Button::Right,
            state: Arc::new(RunState::new()),
            worker: Mutex::new(None),
        }
    }

    pub fn cancel_button(mut self, button: Button) -> Self {
        self.cancel_button = button;
        self
    }

    /// Start a run, or `Err(Error::Busy)` if one is active.
    pub fn start(&self) -> Result<Started> {
        let token = CancelToken::new();
        if !self.state.try_begin(token.clone()) {
            tracing::info!("start ignored, run already in progress");
            return Err(Error::Busy);
        }
        let mut worker = self.worker.lock();

        let snapshot = self.store.snapshot();
        let looped = self.settings.read().loop_enabled;
        let started = Started {
            steps: snapshot.total_steps(),
            looped,
        };

        let guard = RunGuard {
            state: self.state.clone(),
            listener: Some(CancelListener::start(
                &self.hub,
                self.cancel_button,
                token.clone(),
            )),
        };
        let engine = PlaybackEngine::new(self.driver.clone())
            .looped(looped)
            .observe(self.state.clone());

        tracing::info!(steps = started.steps, looped, "run started");
        let handle = thread::Builder::new()
            .name("clicker-playback".into())
            .spawn(move || {
                let _guard = guard;
                let report = engine.run(&snapshot, &token);
                tracing::info!(
                    clicks = report.total_clicks(),
                    failed = report.failed_steps,
                    cancelled = report.cancelled,
                    "run finished"
                );
                report
            })?;

        *worker = Some(handle);
        Ok(started)
    }

    /// Cancel PRE/MAIN of the active run. No-op when idle.
    pub fn request_cancel(&self) {
        if self.state.request_cancel() {
            tracing::info!("cancel requested");
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn state(&self) -> PlaybackState {
        self.state.playback_state()
    }

    pub fn run_state(&self) -> Arc<RunState> {
        self.state.clone()
    }

    /// Block until the most recent run ends. `None` if there is no run to
    /// wait for or the run panicked.
    pub fn wait(&self) -> Option<RunReport> {
        let handle = self.worker.lock().take()?;
        match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                tracing::error!("playback thread panicked");
                None
            }
        }
    }
}

/// Run-scoped cleanup, dropped when the playback thread exits.
struct RunGuard {
    state: Arc<RunState>,
    listener: Option<CancelListener>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.stop();
        }
        self.state.finish();
    }
}
