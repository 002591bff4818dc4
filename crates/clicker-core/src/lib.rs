//! clicker-core - phased click sequences
//!
//! Data model shared by the recorder, the player and the terminal front-end.
//!
//! - **step**: `Step`, `Phase` and the three-phase `Sequences` value
//! - **store**: shared `SequenceStore` and the `ArmedPhase` selector
//! - **format**: the persisted `{"pre", "clicks", "post"}` snapshot format
//! - **storage**: a directory of sequence files
//! - **settings**: lenient user settings

pub mod error;
pub mod format;
pub mod settings;
pub mod step;
pub mod storage;
pub mod store;

pub use error::{Error, ErrorCode, Result};
pub use settings::Settings;
pub use step::{Phase, Sequences, Step};
pub use storage::SequenceStorage;
pub use store::{ArmedPhase, SequenceStore};

pub mod prelude {
    pub use crate::error::{Error, ErrorCode, Result};
    pub use crate::settings::Settings;
    pub use crate::step::{Phase, Sequences, Step};
    pub use crate::storage::SequenceStorage;
    pub use crate::store::{ArmedPhase, SequenceStore};
}
