//! Video mixer and per-source handles.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::clock::{default_clock, Clock};
use crate::pipeline::{Hooks, MixEngine, Pacing, Registry, Shared, Worker};
use crate::sink::Sink;
use crate::source::SourceId;
use crate::{EventCallback, MixerError, MixerEvent, MixerStats, VideoMixerBuilder, VideoMixerConfig};

use super::adapter::{FrameFormatAdapter, ScalingAdapter};
use super::frame::{FrameSize, PixelFormat, Rect, VideoFrame};
use super::layout::{focus_main, focus_side, grid_cell, grid_rows, Layout};

/// The composite picture delivered to every video source's sink.
///
/// The picture is shared: every sink of one interval receives a clone of
/// the same `Arc`. Hold on to it as long as needed; the mixer copies on
/// write if a previous picture is still referenced.
#[derive(Debug, Clone)]
pub struct VideoComposite {
    /// The composed picture, always [`PixelFormat::Yuv420p`].
    pub frame: Arc<VideoFrame>,

    /// Virtual timestamp of this interval, counted from the moment the
    /// mixer left its idle state.
    pub timestamp: Duration,

    /// `timestamp` on a 90kHz RTP video clock, wrapping at `u32::MAX`.
    pub rtp_timestamp: u32,

    /// The source this delivery is addressed to.
    pub source_id: SourceId,
}

type FrameSlot = Arc<Mutex<Option<VideoFrame>>>;

struct VideoEntry {
    latest: FrameSlot,
    sink: Box<dyn Sink<VideoComposite>>,
    cell: usize,
    focus: bool,
}

pub(crate) struct VideoEngine {
    registry: Registry<VideoEntry>,
    size: FrameSize,
    rows: u32,
    composite: Arc<VideoFrame>,
    dirty: bool,
    adapter: Box<dyn FrameFormatAdapter>,
}

impl VideoEngine {
    fn lowest_free_cell(&self) -> usize {
        let cells = (self.rows as usize).pow(2);
        (0..cells)
            .find(|c| self.registry.iter().all(|(_, e)| e.cell != *c))
            .unwrap_or(cells)
    }

    fn focused(&self) -> Option<SourceId> {
        self.registry.iter().find(|(_, e)| e.focus).map(|(id, _)| id)
    }

    /// Destination rectangle of every source, in registry order.
    fn tiles(&self) -> Vec<(SourceId, Rect)> {
        let n = self.registry.len();
        if self.focused().is_some() {
            let mut slot = 0;
            return self
                .registry
                .iter()
                .map(|(id, e)| {
                    if e.focus {
                        (id, focus_main(self.size, n))
                    } else {
                        let rect = focus_side(self.size, n, slot);
                        slot += 1;
                        (id, rect)
                    }
                })
                .collect();
        }
        self.registry
            .iter()
            .map(|(id, e)| (id, grid_cell(self.size, self.rows, e.cell)))
            .collect()
    }

    fn layout(&self) -> Layout {
        let mut cells = vec![None; (self.rows as usize).pow(2)];
        for (id, e) in self.registry.iter() {
            if let Some(cell) = cells.get_mut(e.cell) {
                *cell = Some(id);
            }
        }
        Layout {
            rows: self.rows,
            cells,
            focus: self.focused(),
            tiles: self.tiles(),
        }
    }

    /// Grows the grid so it can hold `n` sources. Returns the new row count
    /// when it changed.
    fn grow_for(&mut self, n: usize) -> Option<u32> {
        let rows = grid_rows(n);
        if rows <= self.rows {
            return None;
        }
        self.rows = rows;
        self.dirty = true;
        Some(rows)
    }

    /// Recomputes the grid for the current source count and packs the cells
    /// in registration order.
    fn relayout(&mut self) -> Option<u32> {
        let rows = grid_rows(self.registry.len());
        for (cell, (_, e)) in self.registry.iter_mut().enumerate() {
            e.cell = cell;
        }
        self.dirty = true;
        let changed = rows != self.rows;
        self.rows = rows;
        changed.then_some(rows)
    }

    fn set_focus(&mut self, id: Option<SourceId>) -> Result<(), MixerError> {
        if let Some(id) = id {
            if self.registry.get(id).is_none() {
                return Err(MixerError::invalid("focus", format!("{id} is not registered")));
            }
        }
        for (eid, e) in self.registry.iter_mut() {
            e.focus = Some(eid) == id;
        }
        self.dirty = true;
        Ok(())
    }
}

impl MixEngine for VideoEngine {
    fn source_count(&self) -> usize {
        self.registry.len()
    }

    fn tick(&mut self, timestamp: Duration, hooks: &Hooks) {
        let tiles = self.tiles();

        {
            let picture = Arc::make_mut(&mut self.composite);
            if self.dirty {
                picture.fill(0, 0, 0);
                self.dirty = false;
            }

            for ((id, entry), (_, rect)) in self.registry.iter().zip(&tiles) {
                let slot = entry.latest.lock();
                let Some(frame) = slot.as_ref() else {
                    continue;
                };
                if let Err(e) = self.adapter.convert_into(frame, picture, *rect) {
                    tracing::warn!(source = %id, error = %e, "failed to draw tile");
                }
            }
        }

        let rtp_timestamp = (timestamp.as_millis() as u64).wrapping_mul(90) as u32;
        for (id, entry) in self.registry.iter() {
            let composite = VideoComposite {
                frame: Arc::clone(&self.composite),
                timestamp,
                rtp_timestamp,
                source_id: id,
            };
            if let Err(e) = entry.sink.write(&composite) {
                hooks.state.sink_errors.fetch_add(1, Ordering::SeqCst);
                tracing::warn!(source = %id, sink = entry.sink.name(), error = %e, "sink write failed");
                hooks.emit(MixerEvent::SinkError {
                    source_id: id,
                    sink_name: entry.sink.name().to_string(),
                    error: e.to_string(),
                });
            }
        }

        tracing::trace!(
            sources = self.registry.len(),
            ts_ms = timestamp.as_millis() as u64,
            "video mix"
        );
    }
}

/// A conference video mixer.
///
/// A dedicated worker thread composes the latest frame of every source
/// into one picture at a fixed frame rate and hands that picture to every
/// source's sink.
///
/// Sources are arranged on a square grid just large enough to hold them.
/// Each source keeps its cell while others come and go; the grid only grows
/// on its own, and [`relayout`](Self::relayout) compacts it. In focus mode
/// one source takes the left three quarters of the picture and the others
/// are stacked in the right quarter.
///
/// Dropping the mixer stops and joins the worker.
///
/// # Example
///
/// ```no_run
/// use stream_mix::{FrameSize, PixelFormat, VideoComposite, VideoFrame, VideoMixer, ChannelSink};
/// use tokio::sync::mpsc;
///
/// let mixer = VideoMixer::builder().size(1280, 720).fps(30).build()?;
///
/// let (tx, _rx) = mpsc::channel::<VideoComposite>(8);
/// let camera = mixer.add_source(ChannelSink::new(tx))?;
///
/// camera.put(VideoFrame::filled(PixelFormat::Yuv420p, FrameSize::new(320, 240), 0, 128, 255)?);
/// # Ok::<(), stream_mix::MixerError>(())
/// ```
pub struct VideoMixer {
    shared: Arc<Shared<VideoEngine>>,
    worker: Worker<VideoEngine>,
    config: VideoMixerConfig,
}

impl VideoMixer {
    /// Creates a mixer with the given config, the nearest-neighbour
    /// [`ScalingAdapter`], the system clock and no event callback.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] for an unusable config and
    /// [`MixerError::ThreadSpawn`] if the worker cannot be started.
    pub fn new(config: VideoMixerConfig) -> Result<Self, MixerError> {
        Self::start(config, Box::new(ScalingAdapter), default_clock(), None)
    }

    /// Returns a builder for configuring a mixer.
    pub fn builder() -> VideoMixerBuilder {
        VideoMixerBuilder::new()
    }

    pub(crate) fn start(
        config: VideoMixerConfig,
        adapter: Box<dyn FrameFormatAdapter>,
        clock: Arc<dyn Clock>,
        on_event: Option<EventCallback>,
    ) -> Result<Self, MixerError> {
        config.validate()?;

        let size = FrameSize::new(config.width, config.height);
        let composite = VideoFrame::filled(PixelFormat::Yuv420p, size, 0, 0, 0)?;
        let engine = VideoEngine {
            registry: Registry::default(),
            size,
            rows: 1,
            composite: Arc::new(composite),
            dirty: false,
            adapter,
        };
        let shared = Arc::new(Shared::new(engine, Hooks::new(on_event), clock));
        let worker = Worker::spawn(
            "video-mixer",
            Arc::clone(&shared),
            Pacing {
                interval: config.frame_interval(),
                poll: config.poll_interval,
            },
        )?;

        tracing::info!(size = %size, fps = config.fps, "video mixer created");

        Ok(Self {
            shared,
            worker,
            config,
        })
    }

    /// Registers a new source whose composite is delivered to `sink`.
    ///
    /// The source takes the lowest free grid cell, growing the grid if it
    /// is full. Its tile stays black until the first [`VideoSource::put`].
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::MixerStopped`] after [`stop`](Self::stop).
    pub fn add_source<S>(&self, sink: S) -> Result<VideoSource, MixerError>
    where
        S: Sink<VideoComposite> + 'static,
    {
        let latest: FrameSlot = Arc::default();

        let (id, grown, sources) = {
            let mut engine = self.shared.lock();
            if !self.shared.hooks.state.is_running() {
                return Err(MixerError::MixerStopped);
            }
            let next = engine.registry.len() + 1;
            let grown = engine.grow_for(next);
            let cell = engine.lowest_free_cell();
            engine.dirty = true;
            let id = engine.registry.insert(VideoEntry {
                latest: Arc::clone(&latest),
                sink: Box::new(sink),
                cell,
                focus: false,
            });
            let sources = engine.registry.len();
            self.shared.hooks.state.sources.store(sources, Ordering::SeqCst);
            self.shared.notify();
            (id, grown, sources)
        };

        tracing::info!(source = %id, "video source added");
        self.shared.hooks.emit(MixerEvent::SourceAdded { source_id: id });
        if let Some(rows) = grown {
            tracing::debug!(rows, sources, "video grid grown");
            self.shared
                .hooks
                .emit(MixerEvent::LayoutChanged { rows, sources });
        }

        Ok(VideoSource {
            id,
            latest,
            shared: Arc::clone(&self.shared),
        })
    }

    /// Number of registered sources.
    pub fn source_count(&self) -> usize {
        self.shared.lock().registry.len()
    }

    /// IDs of the registered sources in registration order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.shared.lock().registry.ids()
    }

    /// Returns the current grid, focus and tile placement.
    pub fn layout(&self) -> Layout {
        self.shared.lock().layout()
    }

    /// Compacts the grid: recomputes its size for the current source count
    /// and reassigns cells in registration order.
    pub fn relayout(&self) {
        let (changed, sources) = {
            let mut engine = self.shared.lock();
            (engine.relayout(), engine.registry.len())
        };
        if let Some(rows) = changed {
            tracing::debug!(rows, sources, "video grid relaid out");
            self.shared
                .hooks
                .emit(MixerEvent::LayoutChanged { rows, sources });
        }
    }

    /// Enters focus mode on `id`, or returns to the grid with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] if `id` is not registered.
    pub fn set_focus(&self, id: Option<SourceId>) -> Result<(), MixerError> {
        self.shared.lock().set_focus(id)
    }

    /// The most recent composite picture.
    pub fn composite(&self) -> Arc<VideoFrame> {
        Arc::clone(&self.shared.lock().composite)
    }

    /// The validated configuration.
    pub fn config(&self) -> &VideoMixerConfig {
        &self.config
    }

    /// Returns `true` until the mixer is stopped.
    pub fn is_running(&self) -> bool {
        self.shared.hooks.state.is_running()
    }

    /// Returns current mixer statistics.
    pub fn stats(&self) -> MixerStats {
        self.shared.hooks.state.snapshot()
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Further registrations fail with [`MixerError::MixerStopped`].
    /// Dropping the mixer has the same effect.
    pub fn stop(&mut self) {
        self.worker.shutdown();
    }
}

impl fmt::Debug for VideoMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoMixer")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// A producer's handle to one source of a [`VideoMixer`].
///
/// Push frames with [`put`](Self::put) from any thread; only the most recent
/// frame is kept. Dropping the handle (or calling [`remove`](Self::remove))
/// unlinks the source and blanks its tile.
pub struct VideoSource {
    id: SourceId,
    latest: FrameSlot,
    shared: Arc<Shared<VideoEngine>>,
}

impl VideoSource {
    /// The mixer-assigned ID of this source.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Replaces this source's latest frame.
    ///
    /// Takes only the per-source lock, never the mixer lock.
    pub fn put(&self, frame: VideoFrame) {
        *self.latest.lock() = Some(frame);
    }

    /// Enters focus mode on this source, or leaves it.
    ///
    /// Clearing focus on a source that does not hold it changes nothing.
    pub fn set_focus(&self, focus: bool) {
        let mut engine = self.shared.lock();
        let result = if focus {
            engine.set_focus(Some(self.id))
        } else if engine.focused() == Some(self.id) {
            engine.set_focus(None)
        } else {
            Ok(())
        };
        if let Err(e) = result {
            tracing::debug!(source = %self.id, error = %e, "focus change ignored");
        }
    }

    /// Unlinks the source from its mixer.
    ///
    /// Equivalent to dropping the handle.
    pub fn remove(self) {}
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        let removed = {
            let mut engine = self.shared.lock();
            let entry = engine.registry.remove(self.id);
            if entry.is_some() {
                engine.dirty = true;
            }
            self.shared
                .hooks
                .state
                .sources
                .store(engine.registry.len(), Ordering::SeqCst);
            entry
        };

        if removed.is_some() {
            tracing::info!(source = %self.id, "video source removed");
            self.shared.hooks.emit(MixerEvent::SourceRemoved { source_id: self.id });
        }
    }
}

impl fmt::Debug for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoSource").field("id", &self.id).finish()
    }
}
