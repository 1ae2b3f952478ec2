//! Time-ordered jitter buffer for variably sized PCM fragments.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::{default_clock, Clock};
use crate::{AudioFrame, MixerError};

/// Outcome of a [`JitterBuffer::read`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The output was filled from queued audio.
    Filled,
    /// The buffer is still below its wish size; the output is silence.
    Filling,
    /// The buffer ran dry while playing. Whatever was queued sits at the
    /// front of the output, the rest is silence, and the buffer is filling
    /// again.
    Underrun,
}

/// Metadata describing one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadInfo {
    /// What happened during the read.
    pub status: ReadStatus,
    /// Bytes copied from queued frames. The remainder of the output is zero.
    pub bytes: usize,
    /// Timestamp of the first byte read, if any frame was touched.
    pub timestamp: Option<Duration>,
    /// Sample rate of the first frame read, 0 if unknown.
    pub sample_rate: u32,
    /// Channel count of the first frame read, 0 if unknown.
    pub channels: u16,
}

impl ReadInfo {
    fn silent(status: ReadStatus) -> Self {
        Self {
            status,
            bytes: 0,
            timestamp: None,
            sample_rate: 0,
            channels: 0,
        }
    }
}

/// Overrun and underrun counters of one buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JitterStats {
    /// Number of times the oldest frame was evicted to respect the cap.
    pub overruns: u64,
    /// Number of times the buffer ran dry while playing.
    pub underruns: u64,
}

/// A queued frame with a read cursor.
#[derive(Debug)]
struct Pending {
    frame: AudioFrame,
    pos: usize,
}

impl Pending {
    fn remaining(&self) -> usize {
        self.frame.data.len() - self.pos
    }
}

#[derive(Debug)]
struct State {
    frames: VecDeque<Pending>,
    cur_size: usize,
    filling: bool,
    next_read: Option<Instant>,
    stats: JitterStats,
}

impl State {
    fn new() -> Self {
        Self {
            frames: VecDeque::new(),
            cur_size: 0,
            filling: true,
            next_read: None,
            stats: JitterStats::default(),
        }
    }
}

/// A thread-safe buffer that absorbs network jitter between an audio
/// producer and a fixed-cadence consumer.
///
/// Producers [`append`](Self::append) frames of any size from any thread. The
/// consumer [`read`](Self::read)s fixed-size blocks. Frames are kept sorted by
/// timestamp so reordered packets play in order.
///
/// The buffer starts in the *filling* state and returns silence until
/// `wish_size` bytes are queued. If it runs dry while playing it goes back
/// to filling. With a `max_size`, appending past the cap evicts the oldest
/// frame.
///
/// # Example
///
/// ```
/// use stream_mix::{JitterBuffer, ReadStatus};
///
/// let jb = JitterBuffer::new(4, Some(8)).unwrap();
///
/// let mut out = [0u8; 4];
/// assert_eq!(jb.read(&mut out).status, ReadStatus::Filling);
///
/// jb.write(&[1, 2, 3, 4]);
/// let info = jb.read(&mut out);
/// assert_eq!(info.status, ReadStatus::Filled);
/// assert_eq!(out, [1, 2, 3, 4]);
/// ```
pub struct JitterBuffer {
    wish_size: usize,
    max_size: Option<usize>,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl JitterBuffer {
    /// Creates an empty buffer in the filling state.
    ///
    /// `wish_size` is the fill level in bytes at which playback starts;
    /// `max_size` optionally caps the queued bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if `wish_size` is zero.
    pub fn new(wish_size: usize, max_size: Option<usize>) -> Result<Self, MixerError> {
        Self::with_clock(wish_size, max_size, default_clock())
    }

    /// Creates a buffer whose [`timed_read`](Self::timed_read) is paced by
    /// the given clock.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if `wish_size` is zero.
    pub fn with_clock(
        wish_size: usize,
        max_size: Option<usize>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MixerError> {
        if wish_size == 0 {
            return Err(MixerError::invalid("wish_size", "must be non-zero"));
        }
        if max_size == Some(0) {
            return Err(MixerError::invalid("max_size", "must be non-zero when set"));
        }
        Ok(Self {
            wish_size,
            max_size,
            clock,
            state: Mutex::new(State::new()),
        })
    }

    /// Queues a frame in timestamp order.
    ///
    /// Frames with equal timestamps keep their arrival order. If the cap is
    /// exceeded the oldest frame is evicted (once). Returns the number of
    /// unread bytes that were evicted.
    pub fn append(&self, frame: AudioFrame) -> usize {
        if frame.data.is_empty() {
            return 0;
        }

        let mut st = self.state.lock();
        let idx = st
            .frames
            .partition_point(|p| p.frame.timestamp <= frame.timestamp);
        st.cur_size += frame.data.len();
        st.frames.insert(idx, Pending { frame, pos: 0 });

        let Some(max) = self.max_size else {
            return 0;
        };
        if st.cur_size <= max {
            return 0;
        }

        let Some(oldest) = st.frames.pop_front() else {
            return 0;
        };
        let dropped = oldest.remaining();
        st.cur_size -= dropped;
        st.stats.overruns += 1;
        tracing::trace!(dropped, cur_size = st.cur_size, max, "jitter buffer overrun");
        dropped
    }

    /// Queues raw PCM bytes as an untimed frame.
    ///
    /// Untimed frames share timestamp zero, so they play in arrival order.
    pub fn write(&self, bytes: &[u8]) -> usize {
        self.append(AudioFrame::untimed(bytes.to_vec()))
    }

    /// Fills `out` from the front of the buffer.
    ///
    /// Never blocks and never fails: whatever cannot be served from queued
    /// audio is zero.
    pub fn read(&self, out: &mut [u8]) -> ReadInfo {
        let mut guard = self.state.lock();
        let st = &mut *guard;

        let mut status = ReadStatus::Filled;
        let needed = if st.filling { self.wish_size } else { out.len() };
        if st.cur_size < needed {
            out.fill(0);
            if st.filling {
                return ReadInfo::silent(ReadStatus::Filling);
            }
            st.filling = true;
            st.stats.underruns += 1;
            status = ReadStatus::Underrun;
        } else {
            st.filling = false;
        }

        let mut info = ReadInfo::silent(status);
        let mut written = 0;
        while written < out.len() {
            let Some(front) = st.frames.front_mut() else {
                break;
            };

            let n = front.remaining().min(out.len() - written);
            out[written..written + n].copy_from_slice(&front.frame.data[front.pos..front.pos + n]);

            if info.timestamp.is_none() {
                info.timestamp = Some(front.frame.timestamp);
                info.sample_rate = front.frame.sample_rate;
                info.channels = front.frame.channels;
            }

            let advance = front.frame.duration_of(n);
            front.pos += n;
            front.frame.timestamp += advance;
            let exhausted = front.remaining() == 0;

            st.cur_size -= n;
            written += n;
            if exhausted {
                st.frames.pop_front();
            }
        }

        out[written..].fill(0);
        info.bytes = written;
        info
    }

    /// Reads only when `ptime` has elapsed since the previous timed read.
    ///
    /// The first call seeds an internal virtual clock with the current time
    /// and reads immediately. Returns `Ok(None)` without touching `out` when
    /// the next read is not yet due.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if `ptime` is zero.
    pub fn timed_read(
        &self,
        ptime: Duration,
        out: &mut [u8],
    ) -> Result<Option<ReadInfo>, MixerError> {
        if ptime.is_zero() {
            return Err(MixerError::invalid("ptime", "must be non-zero"));
        }

        let now = self.clock.now();
        {
            let mut st = self.state.lock();
            let due = *st.next_read.get_or_insert(now);
            if now < due {
                return Ok(None);
            }
            st.next_read = Some(due + ptime);
        }

        Ok(Some(self.read(out)))
    }

    /// Drops all queued audio and returns to the filling state.
    ///
    /// The timed-read clock is reset as well. Counters are kept.
    pub fn flush(&self) {
        let mut st = self.state.lock();
        st.frames.clear();
        st.cur_size = 0;
        st.filling = true;
        st.next_read = None;
    }

    /// Re-sorts queued frames by timestamp, keeping arrival order for ties.
    pub fn sort(&self) {
        let mut st = self.state.lock();
        st.frames
            .make_contiguous()
            .sort_by_key(|p| p.frame.timestamp);
    }

    /// Unread bytes currently queued.
    pub fn cur_size(&self) -> usize {
        self.state.lock().cur_size
    }

    /// Fill level at which playback starts.
    pub fn wish_size(&self) -> usize {
        self.wish_size
    }

    /// Hard cap on queued bytes, if any.
    pub fn max_size(&self) -> Option<usize> {
        self.max_size
    }

    /// Returns `true` while the buffer is (re)filling.
    pub fn is_filling(&self) -> bool {
        self.state.lock().filling
    }

    /// Number of queued frames, including a partially read head.
    pub fn frame_count(&self) -> usize {
        self.state.lock().frames.len()
    }

    /// Returns the overrun and underrun counters.
    pub fn stats(&self) -> JitterStats {
        self.state.lock().stats
    }
}

impl fmt::Debug for JitterBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        f.debug_struct("JitterBuffer")
            .field("wish_size", &self.wish_size)
            .field("max_size", &self.max_size)
            .field("cur_size", &st.cur_size)
            .field("frames", &st.frames.len())
            .field("filling", &st.filling)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for JitterBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        write!(
            f,
            "wish_sz={} cur_sz={} filling={} [overrun={} underrun={}]",
            self.wish_size, st.cur_size, st.filling, st.stats.overruns, st.stats.underruns
        )
    }
}
