//! # stream-mix
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Real-time conference mixing: every participant hears everyone but
//! themselves and sees everyone on one tiled picture.
//!
//! - [`AudioMixer`] jitter-buffers each source's PCM and, once per packet
//!   time, hands every source the sum of all *other* sources (mix-minus).
//! - [`VideoMixer`] scales the latest frame of each source into a grid or
//!   focus layout and hands the same composite to every source.
//!
//! Results go to a per-source [`Sink`]: a tokio channel, a closure, or your
//! own encoder.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stream_mix::{AudioChunk, AudioFormat, AudioMixer, ChannelSink};
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> Result<(), stream_mix::MixerError> {
//! let mixer = AudioMixer::builder()
//!     .format(AudioFormat::Wideband)
//!     .on_event(|e| tracing::warn!(?e, "mixer event"))
//!     .build()?;
//!
//! let (tx, mut rx) = mpsc::channel::<AudioChunk>(32);
//! let alice = mixer.add_source(ChannelSink::new(tx))?;
//!
//! // Feed 20ms of 16kHz mono PCM per packet as it arrives from the network.
//! alice.put(&[0u8; 640]);
//!
//! // Receive what alice should hear.
//! while let Some(chunk) = rx.recv().await {
//!     // encode and send back to alice
//! #   let _ = chunk;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Each mixer owns one worker thread paced by a [`Clock`]:
//!
//! - **Producers** push into per-source buffers and never take the mixer lock
//! - **Worker** wakes once per interval, mixes under the registry lock and
//!   delivers to every sink
//! - **Idle** mixers with no sources park on a condition variable and
//!   restart their timeline on the next registration

#![warn(missing_docs)]
// Media code requires intentional numeric casts between sample formats
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod audio;
mod chunk;
mod clock;
mod config;
mod error;
mod event;
pub mod format;
mod pipeline;
pub mod source;
mod sink;
mod stats;
mod video;

pub use audio::{mix_minus, AudioMixer, AudioMixerBuilder, AudioSource};
pub use chunk::{AudioChunk, AudioFrame};
pub use clock::{default_clock, Clock, ManualClock, MonotonicClock};
pub use config::{AudioFormat, AudioMixerConfig, VideoMixerConfig};
pub use error::{FrameError, MixerError, SinkError};
pub use event::{event_callback, EventCallback, MixerEvent};
pub use pipeline::{JitterBuffer, JitterStats, ReadInfo, ReadStatus};
pub use sink::{sink_fn, ChannelSink, FnSink, NullSink, Sink};
pub use source::{MockSource, SourceId};
pub use stats::MixerStats;
pub use video::{
    grid_rows, FrameFormatAdapter, FrameSize, Layout, PixelFormat, Rect, ScalingAdapter,
    VideoComposite, VideoFrame, VideoMixer, VideoMixerBuilder, VideoSource,
};
