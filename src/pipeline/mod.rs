//! Mixing pipeline components.
//!
//! Both mixers share the same shape:
//!
//! ```text
//! producers → per-source input (JitterBuffer / latest frame)
//!           → worker tick (read all → mix → deliver) → per-source Sink
//! ```
//!
//! - **Jitter buffer**: reorders and smooths audio arriving with jitter
//! - **Registry**: ordered, lock-guarded set of sources with stable IDs
//! - **Engine**: the paced worker thread that drives each mixer

mod engine;
mod jitter_buffer;
mod registry;

pub(crate) use engine::{Hooks, MixEngine, Pacing, Shared, Worker};
pub use jitter_buffer::{JitterBuffer, JitterStats, ReadInfo, ReadStatus};
pub(crate) use registry::Registry;
