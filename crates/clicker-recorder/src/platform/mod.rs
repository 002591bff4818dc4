//! Native input backends
//!
//! Enabled by the `native` feature: a process-wide rdev hook feeding an
//! [`InputHub`](crate::input::InputHub), and an enigo-backed pointer driver.

#[cfg(feature = "native")]
mod native;

#[cfg(feature = "native")]
pub use native::{spawn_global_hook, EnigoDriver};
