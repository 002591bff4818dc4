//! Global input events and the hub that fans them out to listeners
//!
//! The OS hook (see `platform`) publishes into an [`InputHub`]. Listeners
//! hold a [`Subscription`]; stopping or dropping it unregisters the
//! listener and disconnects its receiver.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Escape,
    Pause,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Right,
    Middle,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyPress(Key),
    ButtonPress(Button),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseInputError(String);

impl fmt::Display for ParseInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key or button: {}", self.0)
    }
}

impl std::error::Error for ParseInputError {}

impl FromStr for Key {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "f1" => Key::F1,
            "f2" => Key::F2,
            "f3" => Key::F3,
            "f4" => Key::F4,
            "f5" => Key::F5,
            "f6" => Key::F6,
            "f7" => Key::F7,
            "f8" => Key::F8,
            "f9" => Key::F9,
            "f10" => Key::F10,
            "f11" => Key::F11,
            "f12" => Key::F12,
            "esc" | "escape" => Key::Escape,
            "pause" => Key::Pause,
            _ => return Err(ParseInputError(s.to_string())),
        })
    }
}

impl FromStr for Button {
    type Err = ParseInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "left" => Button::Left,
            "right" => Button::Right,
            "middle" => Button::Middle,
            _ => return Err(ParseInputError(s.to_string())),
        })
    }
}

#[derive(Default)]
struct HubInner {
    next_id: u64,
    subscribers: Vec<(u64, Sender<InputEvent>)>,
}

/// Fan-out point between the OS hook and the listeners.
#[derive(Clone, Default)]
pub struct InputHub {
    inner: Arc<Mutex<HubInner>>,
}

impl InputHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Events published after this call are delivered.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = unbounded();
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        Subscription {
            id,
            hub: self.clone(),
            rx,
        }
    }

    pub fn publish(&self, event: InputEvent) {
        let mut inner = self.inner.lock();
        inner.subscribers.retain(|(_, tx)| tx.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    fn unsubscribe(&self, id: u64) {
        self.inner.lock().subscribers.retain(|(sid, _)| *sid != id);
    }
}

/// One listener's registration on an [`InputHub`].
pub struct Subscription {
    id: u64,
    hub: InputHub,
    rx: Receiver<InputEvent>,
}

impl Subscription {
    pub fn try_recv(&self) -> Option<InputEvent> {
        self.rx.try_recv().ok()
    }

    /// A receiver that disconnects once this subscription is stopped.
    pub fn receiver(&self) -> Receiver<InputEvent> {
        self.rx.clone()
    }

    pub fn stop(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
