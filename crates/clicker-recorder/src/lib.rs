//! clicker-recorder - hotkey capture and phased click playback
//!
//! Records pointer positions on a trigger key and replays them as clicks,
//! PRE then MAIN then POST, with right-click cancellation of PRE and MAIN.
//!
//! ## Platform Support
//!
//! - With the `native` feature (default): global input via rdev, synthetic
//!   pointer input via enigo (X11, macOS, Windows)
//! - Without it: `RecordingDriver` and a manually fed `InputHub` only

pub mod cancel;
pub mod capture;
pub mod controller;
pub mod driver;
pub mod engine;
pub mod input;
pub mod platform;
pub mod session;
pub mod state;

pub use cancel::{CancelListener, CancelToken};
pub use capture::{CaptureContext, CaptureHandle, CaptureListener, CaptureObserver};
pub use controller::{RunController, Started};
pub use driver::{Action, DriverError, DriverResult, PointerDriver, RecordingDriver};
pub use engine::{PlaybackEngine, RunReport};
pub use input::{Button, InputEvent, InputHub, Key, Subscription};
pub use session::{Session, SessionConfig};
pub use state::{PlaybackState, RunState};

#[cfg(feature = "native")]
pub use platform::{spawn_global_hook, EnigoDriver};

pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::capture::CaptureObserver;
    pub use crate::controller::{RunController, Started};
    pub use crate::driver::{PointerDriver, RecordingDriver};
    pub use crate::engine::{PlaybackEngine, RunReport};
    pub use crate::input::{Button, InputEvent, InputHub, Key};
    pub use crate::session::{Session, SessionConfig};
    pub use crate::state::PlaybackState;

    #[cfg(feature = "native")]
    pub use crate::platform::{spawn_global_hook, EnigoDriver};
}
