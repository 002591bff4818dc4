//! Per-run cancellation: the token the engine polls and the listener that
//! trips it on the cancel button.

use crate::input::{Button, InputEvent, InputHub, Subscription};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Cooperative cancellation flag. Clones share the same flag; every run
/// gets a fresh token.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One-shot listener for the cancel button, scoped to a single run.
pub struct CancelListener {
    subscription: Arc<Mutex<Option<Subscription>>>,
    thread: Option<JoinHandle<()>>,
}

impl CancelListener {
    /// Subscribes before returning, so a press right after `start` is seen.
    pub fn start(hub: &InputHub, button: Button, token: CancelToken) -> Self {
        let sub = hub.subscribe();
        let rx = sub.receiver();
        let subscription = Arc::new(Mutex::new(Some(sub)));
        let slot = subscription.clone();

        let thread = thread::Builder::new()
            .name("clicker-cancel".into())
            .spawn(move || {
                for event in rx {
                    if event == InputEvent::ButtonPress(button) {
                        tracing::info!(?button, "cancel requested");
                        token.cancel();
                        // Unregister from the hub before the run finishes.
                        slot.lock().take();
                        break;
                    }
                }
            });

        let thread = match thread {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::warn!(error = %e, "could not start cancel listener");
                None
            }
        };

        Self {
            subscription,
            thread,
        }
    }

    /// Unsubscribe and wait for the listener thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the subscription disconnects the receiver the thread iterates.
        self.subscription.lock().take();
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for CancelListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}
