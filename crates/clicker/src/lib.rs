//! # clicker
//!
//! Record pointer positions on a hotkey, replay them as clicks.
//!
//! ## Features
//!
//! - **Phases**: PRE runs once, MAIN once or in a loop, POST always
//! - **Capture**: the trigger key appends the pointer position to the armed phase
//! - **Cancel**: right-click stops PRE and MAIN, POST still runs to completion
//! - **Files**: `{"pre", "clicks", "post"}` JSON snapshots
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clicker::prelude::*;
//! use std::sync::Arc;
//!
//! let hub = InputHub::new();
//! let driver = Arc::new(RecordingDriver::new());
//! let session = Session::new(
//!     SessionConfig::default(),
//!     Settings::default(),
//!     driver,
//!     hub,
//!     Arc::new(|phase: Phase, index: usize, step: &Step| {
//!         println!("{phase}[{index}] = ({}, {})", step.x, step.y);
//!     }),
//! )?;
//! session.start()?;
//! session.wait();
//! # Ok::<(), clicker::Error>(())
//! ```

// Re-export the data model
pub use clicker_core::*;

// Re-export the recorder and player
pub use clicker_recorder as recorder;

pub use clicker_recorder::{
    Button, CancelToken, InputEvent, InputHub, Key, PlaybackEngine, PlaybackState,
    PointerDriver, RecordingDriver, RunController, RunReport, Session, SessionConfig, Started,
};

#[cfg(feature = "native")]
pub use clicker_recorder::{spawn_global_hook, EnigoDriver};

/// Prelude - import everything you need
pub mod prelude {
    pub use clicker_core::prelude::*;
    pub use clicker_recorder::prelude::*;
}
