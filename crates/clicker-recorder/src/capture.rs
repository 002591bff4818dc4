//! Capture listener - the trigger key appends the pointer position as a step
//!
//! Each trigger occurrence yields exactly one step in the armed phase. The
//! step's delay is the default delay configured at capture time, so later
//! changes to the setting do not touch steps already captured.

use crate::driver::PointerDriver;
use crate::input::{InputEvent, InputHub, Key, Subscription};
use clicker_core::{ArmedPhase, Error, Phase, Result, SequenceStore, Settings, Step};
use parking_lot::RwLock;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Notified synchronously after each appended step.
pub trait CaptureObserver: Send + Sync {
    fn on_step_captured(&self, phase: Phase, index: usize, step: &Step);
}

impl<F> CaptureObserver for F
where
    F: Fn(Phase, usize, &Step) + Send + Sync,
{
    fn on_step_captured(&self, phase: Phase, index: usize, step: &Step) {
        self(phase, index, step)
    }
}

/// Everything a capture needs: where to sample, where to append.
#[derive(Clone)]
pub struct CaptureContext {
    pub store: SequenceStore,
    pub armed: Arc<ArmedPhase>,
    pub settings: Arc<RwLock<Settings>>,
    pub driver: Arc<dyn PointerDriver>,
}

impl CaptureContext {
    /// Sample the pointer and append a step to the armed phase.
    pub fn capture_once(&self) -> Result<(Phase, usize, Step)> {
        let (x, y) = self
            .driver
            .position()
            .map_err(|e| Error::CaptureSample(e.to_string()))?;
        let step = Step::new(x, y, self.settings.read().default_delay_ms);
        let phase = self.armed.get();
        let index = self.store.push(phase, step);
        Ok((phase, index, step))
    }
}

pub struct CaptureListener;

impl CaptureListener {
    pub fn spawn(
        hub: &InputHub,
        trigger: Key,
        ctx: CaptureContext,
        observer: Arc<dyn CaptureObserver>,
    ) -> io::Result<CaptureHandle> {
        let sub = hub.subscribe();
        let rx = sub.receiver();
        let captured = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicUsize::new(0));
        let count = captured.clone();
        let failures = dropped.clone();

        let thread = thread::Builder::new()
            .name("clicker-capture".into())
            .spawn(move || {
                tracing::info!(?trigger, "capture listener started");
                for event in rx {
                    if event != InputEvent::KeyPress(trigger) {
                        continue;
                    }
                    match ctx.capture_once() {
                        Ok((phase, index, step)) => {
                            count.fetch_add(1, Ordering::SeqCst);
                            tracing::debug!(%phase, index, x = step.x, y = step.y, delay_ms = step.delay_ms, "step captured");
                            observer.on_step_captured(phase, index, &step);
                        }
                        Err(e) => {
                            failures.fetch_add(1, Ordering::SeqCst);
                            tracing::warn!(error = %e, "trigger dropped");
                        }
                    }
                }
                tracing::info!("capture listener stopped");
            })?;

        Ok(CaptureHandle {
            subscription: Some(sub),
            thread: Some(thread),
            captured,
            dropped,
        })
    }
}

/// Owns the running capture listener.
pub struct CaptureHandle {
    subscription: Option<Subscription>,
    thread: Option<JoinHandle<()>>,
    captured: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl CaptureHandle {
    /// Steps appended so far.
    pub fn captured(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }

    /// Triggers whose pointer sample failed.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.subscription.take();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
