use crate::driver::{DriverError, DriverResult, PointerDriver};
use crate::input::{Button, InputEvent, InputHub, Key};
use crossbeam_channel::{bounded, unbounded, Sender};
use std::io;
use std::thread::{self, JoinHandle};

/// Start the global hook on its own thread. It runs for the life of the
/// process; rdev offers no way to stop it.
pub fn spawn_global_hook(hub: InputHub) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("clicker-hook".into())
        .spawn(move || {
            tracing::info!("global input hook started");
            let result = rdev::listen(move |event: rdev::Event| {
                if let Some(e) = convert(&event.event_type) {
                    hub.publish(e);
                }
            });
            if let Err(e) = result {
                tracing::error!(error = ?e, "global input hook failed");
            }
        })
}

fn convert(event: &rdev::EventType) -> Option<InputEvent> {
    match event {
        rdev::EventType::KeyPress(key) => Some(InputEvent::KeyPress(convert_key(key))),
        rdev::EventType::ButtonPress(button) => {
            Some(InputEvent::ButtonPress(convert_button(button)))
        }
        _ => None,
    }
}

fn convert_key(key: &rdev::Key) -> Key {
    match key {
        rdev::Key::F1 => Key::F1,
        rdev::Key::F2 => Key::F2,
        rdev::Key::F3 => Key::F3,
        rdev::Key::F4 => Key::F4,
        rdev::Key::F5 => Key::F5,
        rdev::Key::F6 => Key::F6,
        rdev::Key::F7 => Key::F7,
        rdev::Key::F8 => Key::F8,
        rdev::Key::F9 => Key::F9,
        rdev::Key::F10 => Key::F10,
        rdev::Key::F11 => Key::F11,
        rdev::Key::F12 => Key::F12,
        rdev::Key::Escape => Key::Escape,
        rdev::Key::Pause => Key::Pause,
        _ => Key::Other,
    }
}

fn convert_button(button: &rdev::Button) -> Button {
    match button {
        rdev::Button::Left => Button::Left,
        rdev::Button::Right => Button::Right,
        rdev::Button::Middle => Button::Middle,
        _ => Button::Other,
    }
}

enum Command {
    Position(Sender<DriverResult<(i32, i32)>>),
    Move(i32, i32, Sender<DriverResult<()>>),
    Click(Sender<DriverResult<()>>),
}

/// Pointer driver backed by enigo.
///
/// The enigo handle lives on a dedicated thread and is driven over a
/// channel, so the driver can be shared across threads on every platform.
pub struct EnigoDriver {
    tx: Sender<Command>,
}

impl EnigoDriver {
    pub fn new() -> DriverResult<Self> {
        let (tx, rx) = unbounded::<Command>();
        let (ready_tx, ready_rx) = bounded::<DriverResult<()>>(1);

        thread::Builder::new()
            .name("clicker-input".into())
            .spawn(move || {
                use enigo::{Coordinate, Direction, Enigo, Mouse, Settings};

                let mut input = match Enigo::new(&Settings::default()) {
                    Ok(e) => {
                        let _ = ready_tx.send(Ok(()));
                        e
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(DriverError::Backend(e.to_string())));
                        return;
                    }
                };

                for cmd in rx {
                    match cmd {
                        Command::Position(reply) => {
                            let r = input
                                .location()
                                .map_err(|e| DriverError::PositionUnavailable(e.to_string()));
                            let _ = reply.send(r);
                        }
                        Command::Move(x, y, reply) => {
                            let r = input
                                .move_mouse(x, y, Coordinate::Abs)
                                .map_err(|e| DriverError::Injection(e.to_string()));
                            let _ = reply.send(r);
                        }
                        Command::Click(reply) => {
                            let r = input
                                .button(enigo::Button::Left, Direction::Click)
                                .map_err(|e| DriverError::Injection(e.to_string()));
                            let _ = reply.send(r);
                        }
                    }
                }
            })
            .map_err(|e| DriverError::Backend(e.to_string()))?;

        ready_rx
            .recv()
            .map_err(|_| DriverError::Backend("input thread exited".into()))??;
        Ok(Self { tx })
    }

    fn call<T>(&self, make: impl FnOnce(Sender<DriverResult<T>>) -> Command) -> DriverResult<T> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx
            .send(make(reply_tx))
            .map_err(|_| DriverError::Backend("input thread exited".into()))?;
        reply_rx
            .recv()
            .map_err(|_| DriverError::Backend("input thread exited".into()))?
    }
}

impl PointerDriver for EnigoDriver {
    fn position(&self) -> DriverResult<(i32, i32)> {
        self.call(Command::Position)
    }

    fn move_to(&self, x: i32, y: i32) -> DriverResult<()> {
        self.call(|reply| Command::Move(x, y, reply))
    }

    fn click(&self) -> DriverResult<()> {
        self.call(Command::Click)
    }
}
