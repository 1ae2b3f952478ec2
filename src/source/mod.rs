//! Source identification and synthetic producers.

mod mock;
mod source_id;

pub use mock::{color_bars, MockSource};
pub use source_id::SourceId;
pub(crate) use source_id::SourceIdAllocator;
