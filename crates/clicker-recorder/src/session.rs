//! Session - everything an interactive front-end needs in one place
//!
//! Owns the sequence store, the armed phase, the shared settings, the
//! capture listener and the run controller. Editing and file operations go
//! through here so the front-end never touches the pieces directly.

use crate::capture::{CaptureContext, CaptureHandle, CaptureListener, CaptureObserver};
use crate::controller::{RunController, Started};
use crate::driver::PointerDriver;
use crate::engine::RunReport;
use crate::input::{Button, InputHub, Key};
use crate::state::PlaybackState;
use clicker_core::{format, ArmedPhase, Error, Phase, Result, SequenceStore, Sequences, Settings};
use parking_lot::RwLock;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub trigger: Key,
    pub cancel_button: Button,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            trigger: Key::F12,
            cancel_button: Button::Right,
        }
    }
}

pub struct Session {
    store: SequenceStore,
    armed: Arc<ArmedPhase>,
    settings: Arc<RwLock<Settings>>,
    driver: Arc<dyn PointerDriver>,
    controller: RunController,
    capture: Option<CaptureHandle>,
}

impl Session {
    /// Build a session and start listening for the trigger key on `hub`.
    pub fn new(
        config: SessionConfig,
        settings: Settings,
        driver: Arc<dyn PointerDriver>,
        hub: InputHub,
        observer: Arc<dyn CaptureObserver>,
    ) -> Result<Self> {
        let store = SequenceStore::new();
        let armed = Arc::new(ArmedPhase::default());
        let settings = Arc::new(RwLock::new(settings));

        let ctx = CaptureContext {
            store: store.clone(),
            armed: armed.clone(),
            settings: settings.clone(),
            driver: driver.clone(),
        };
        let capture = CaptureListener::spawn(&hub, config.trigger, ctx, observer)?;
        let controller = RunController::new(store.clone(), settings.clone(), driver.clone(), hub)
            .cancel_button(config.cancel_button);

        tracing::info!(trigger = ?config.trigger, cancel = ?config.cancel_button, "session ready");
        Ok(Self {
            store,
            armed,
            settings,
            driver,
            controller,
            capture: Some(capture),
        })
    }

    pub fn armed_phase(&self) -> Phase {
        self.armed.get()
    }

    pub fn set_armed_phase(&self, phase: Phase) {
        self.armed.set(phase);
        tracing::debug!(%phase, "armed");
    }

    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    pub fn replace_store(&self, sequences: Sequences) {
        self.store.replace(sequences);
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Steps captured by the trigger key since the session started.
    pub fn captured(&self) -> usize {
        self.capture.as_ref().map_or(0, CaptureHandle::captured)
    }

    /// Replace the store with the file's contents. On any error the store
    /// is left as it was.
    pub fn load_file(&self, path: &Path) -> Result<Sequences> {
        let file = File::open(path)?;
        let sequences = format::read(BufReader::new(file))?;
        self.store.replace(sequences.clone());
        self.settings.write().last_file = path.to_path_buf();
        tracing::info!(path = %path.display(), steps = sequences.total_steps(), "sequences loaded");
        Ok(sequences)
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let snapshot = self.store.snapshot();
        let mut writer = BufWriter::new(File::create(path)?);
        format::write(&mut writer, &snapshot)?;
        writer.flush()?;
        self.settings.write().last_file = path.to_path_buf();
        tracing::info!(path = %path.display(), steps = snapshot.total_steps(), "sequences saved");
        Ok(())
    }

    /// Move the pointer to a recorded step without clicking.
    pub fn goto(&self, phase: Phase, index: usize) -> Result<()> {
        let step = self.store.get(phase, index)?;
        self.driver.move_to(step.x, step.y).map_err(|e| Error::PlaybackStep {
            phase,
            index,
            reason: e.to_string(),
        })
    }

    pub fn start(&self) -> Result<Started> {
        self.controller.start()
    }

    pub fn request_cancel(&self) {
        self.controller.request_cancel();
    }

    pub fn is_running(&self) -> bool {
        self.controller.is_running()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn wait(&self) -> Option<RunReport> {
        self.controller.wait()
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn update_settings(&self, f: impl FnOnce(&mut Settings)) -> Settings {
        let mut settings = self.settings.write();
        f(&mut settings);
        settings.clone()
    }

    pub fn settings_handle(&self) -> Arc<RwLock<Settings>> {
        self.settings.clone()
    }

    /// Stop capturing and wait for any active run to finish.
    pub fn shutdown(mut self) -> Settings {
        if let Some(capture) = self.capture.take() {
            capture.stop();
        }
        self.controller.request_cancel();
        self.controller.wait();
        self.settings()
    }
}
