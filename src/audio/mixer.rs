//! Audio mixer and per-source handles.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{default_clock, Clock};
use crate::format::{le_bytes_to_samples, samples_to_le_bytes};
use crate::pipeline::{Hooks, JitterBuffer, MixEngine, Pacing, ReadStatus, Registry, Shared, Worker};
use crate::sink::Sink;
use crate::source::SourceId;
use crate::{
    AudioChunk, AudioFrame, AudioMixerBuilder, AudioMixerConfig, EventCallback, MixerError,
    MixerEvent, MixerStats,
};

use super::mix::mix_minus;

struct AudioEntry {
    buffer: Arc<JitterBuffer>,
    sink: Box<dyn Sink<AudioChunk>>,
    scratch: Vec<u8>,
}

pub(crate) struct AudioEngine {
    registry: Registry<AudioEntry>,
    config: AudioMixerConfig,
}

impl MixEngine for AudioEngine {
    fn source_count(&self) -> usize {
        self.registry.len()
    }

    fn tick(&mut self, timestamp: Duration, hooks: &Hooks) {
        // Read every source before mixing anything.
        let mut frames = Vec::with_capacity(self.registry.len());
        for (id, entry) in self.registry.iter_mut() {
            let info = entry.buffer.read(&mut entry.scratch);
            if info.status == ReadStatus::Underrun {
                hooks.state.buffer_underruns.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(source = %id, got = info.bytes, "jitter buffer underrun");
                hooks.emit(MixerEvent::BufferUnderrun { source_id: id });
            }
            frames.push(le_bytes_to_samples(&entry.scratch));
        }

        let inputs: Vec<&[i16]> = frames.iter().map(Vec::as_slice).collect();
        let mixes = mix_minus(&inputs);

        for ((id, entry), mix) in self.registry.iter().zip(mixes) {
            let chunk = AudioChunk::new(
                mix,
                timestamp,
                self.config.sample_rate,
                self.config.channels,
                id,
            );
            if let Err(e) = entry.sink.write(&chunk) {
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
            "audio mix"
        );
    }
}

/// A conference audio mixer.
///
/// Every registered source gets its own [`JitterBuffer`]. A dedicated worker
/// thread reads one packet time from every buffer per interval and delivers
/// to each source's sink the saturating sum of all *other* sources
/// (mix-minus), so nobody hears their own voice.
///
/// Dropping the mixer stops and joins the worker.
///
/// # Example
///
/// ```no_run
/// use stream_mix::{AudioChunk, AudioFormat, AudioMixer, ChannelSink};
/// use tokio::sync::mpsc;
///
/// let mixer = AudioMixer::builder()
///     .format(AudioFormat::Narrowband)
///     .build()?;
///
/// let (tx, _rx) = mpsc::channel::<AudioChunk>(50);
/// let alice = mixer.add_source(ChannelSink::new(tx))?;
///
/// alice.put(&[0u8; 320]);
/// # Ok::<(), stream_mix::MixerError>(())
/// ```
pub struct AudioMixer {
    shared: Arc<Shared<AudioEngine>>,
    worker: Worker<AudioEngine>,
    config: AudioMixerConfig,
}

impl AudioMixer {
    /// Creates a mixer with the given config, the system clock and no
    /// event callback.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::InvalidArgument`] for an unusable config and
    /// [`MixerError::ThreadSpawn`] if the worker cannot be started.
    pub fn new(config: AudioMixerConfig) -> Result<Self, MixerError> {
        Self::start(config, default_clock(), None)
    }

    /// Returns a builder for configuring a mixer.
    pub fn builder() -> AudioMixerBuilder {
        AudioMixerBuilder::new()
    }

    pub(crate) fn start(
        config: AudioMixerConfig,
        clock: Arc<dyn Clock>,
        on_event: Option<EventCallback>,
    ) -> Result<Self, MixerError> {
        config.validate()?;

        let engine = AudioEngine {
            registry: Registry::default(),
            config: config.clone(),
        };
        let shared = Arc::new(Shared::new(engine, Hooks::new(on_event), clock));
        let worker = Worker::spawn(
            "audio-mixer",
            Arc::clone(&shared),
            Pacing {
                interval: config.ptime,
                poll: config.poll_interval,
            },
        )?;

        tracing::info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            ptime_ms = config.ptime.as_millis() as u64,
            frame_size = config.frame_size(),
            "audio mixer created"
        );

        Ok(Self {
            shared,
            worker,
            config,
        })
    }

    /// Registers a new source whose mix is delivered to `sink`.
    ///
    /// The source starts contributing as soon as its jitter buffer reaches
    /// its wish size; until then it mixes as silence.
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::MixerStopped`] after [`stop`](Self::stop).
    pub fn add_source<S>(&self, sink: S) -> Result<AudioSource, MixerError>
    where
        S: Sink<AudioChunk> + 'static,
    {
        let frame_bytes = self.config.frame_bytes();
        let buffer = Arc::new(JitterBuffer::with_clock(
            self.config.jitter_wish_frames * frame_bytes,
            self.config.jitter_max_frames.map(|n| n * frame_bytes),
            Arc::clone(&self.shared.clock),
        )?);

        let id = {
            let mut engine = self.shared.lock();
            if !self.shared.hooks.state.is_running() {
                return Err(MixerError::MixerStopped);
            }
            let id = engine.registry.insert(AudioEntry {
                buffer: Arc::clone(&buffer),
                sink: Box::new(sink),
                scratch: vec![0; frame_bytes],
            });
            self.shared
                .hooks
                .state
                .sources
                .store(engine.registry.len(), Ordering::SeqCst);
            self.shared.notify();
            id
        };

        tracing::info!(source = %id, "audio source added");
        self.shared.hooks.emit(MixerEvent::SourceAdded { source_id: id });

        Ok(AudioSource {
            id,
            buffer,
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

    /// The validated configuration.
    pub fn config(&self) -> &AudioMixerConfig {
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
    /// Existing source handles stay valid but are no longer mixed, and
    /// further registrations fail with [`MixerError::MixerStopped`].
    /// Dropping the mixer has the same effect.
    pub fn stop(&mut self) {
        self.worker.shutdown();
    }
}

impl fmt::Debug for AudioMixer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioMixer")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

/// A producer's handle to one source of an [`AudioMixer`].
///
/// Push audio with [`put`](Self::put) from any thread. Dropping the handle
/// (or calling [`remove`](Self::remove)) unlinks the source; once that
/// returns its sink receives nothing more.
pub struct AudioSource {
    id: SourceId,
    buffer: Arc<JitterBuffer>,
    shared: Arc<Shared<AudioEngine>>,
}

impl AudioSource {
    /// The mixer-assigned ID of this source.
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Queues raw little-endian 16-bit PCM in arrival order.
    ///
    /// Never blocks on the mixer. If the jitter buffer overflows, its oldest
    /// frame is dropped and a [`MixerEvent::BufferOverrun`] is emitted.
    pub fn put(&self, pcm: &[u8]) {
        self.put_frame(AudioFrame::untimed(pcm.to_vec()));
    }

    /// Queues interleaved samples in arrival order.
    pub fn put_samples(&self, samples: &[i16]) {
        self.put_frame(AudioFrame::untimed(samples_to_le_bytes(samples)));
    }

    /// Queues a timestamped frame; out-of-order frames are reordered.
    pub fn put_frame(&self, frame: AudioFrame) {
        let dropped = self.buffer.append(frame);
        if dropped > 0 {
            self.shared
                .hooks
                .state
                .buffer_overruns
                .fetch_add(1, Ordering::SeqCst);
            tracing::warn!(source = %self.id, dropped, "jitter buffer overrun");
            self.shared.hooks.emit(MixerEvent::BufferOverrun {
                source_id: self.id,
                dropped_bytes: dropped,
            });
        }
    }

    /// The jitter buffer backing this source.
    pub fn buffer(&self) -> &JitterBuffer {
        &self.buffer
    }

    /// Unlinks the source from its mixer.
    ///
    /// Equivalent to dropping the handle.
    pub fn remove(self) {}
}

impl Drop for AudioSource {
    fn drop(&mut self) {
        let removed = {
            let mut engine = self.shared.lock();
            let entry = engine.registry.remove(self.id);
            self.shared
                .hooks
                .state
                .sources
                .store(engine.registry.len(), Ordering::SeqCst);
            entry
        };

        if removed.is_some() {
            tracing::info!(source = %self.id, "audio source removed");
            self.shared.hooks.emit(MixerEvent::SourceRemoved { source_id: self.id });
        }
    }
}

impl fmt::Debug for AudioSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSource")
            .field("id", &self.id)
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event_callback, sink_fn, AudioFormat, ManualClock, NullSink, SinkError};
    use parking_lot::Mutex;
    use std::thread;

    type Received = Arc<Mutex<Vec<AudioChunk>>>;

    fn recording_sink(name: &str) -> (impl Sink<AudioChunk>, Received) {
        let received: Received = Arc::default();
        let store = received.clone();
        let sink = sink_fn(name.to_string(), move |chunk: &AudioChunk| {
            store.lock().push(chunk.clone());
            Ok(())
        });
        (sink, received)
    }

    fn narrowband(clock: &Arc<ManualClock>) -> AudioMixer {
        let config = AudioMixerConfig {
            jitter_wish_frames: 1,
            jitter_max_frames: Some(4),
            poll_interval: Duration::from_millis(1),
            ..AudioMixerConfig::from_format(AudioFormat::Narrowband)
        };
        AudioMixer::start(config, clock.clone(), None).unwrap()
    }

    fn wait_for(cond: impl Fn() -> bool) {
        for _ in 0..2000 {
            if cond() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("condition not reached");
    }

    fn at(received: &Received, ts: Duration) -> Option<AudioChunk> {
        received.lock().iter().find(|c| c.timestamp == ts).cloned()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AudioMixerConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            AudioMixer::new(config),
            Err(MixerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_lone_source_receives_silence() {
        let clock = Arc::new(ManualClock::new());
        let mixer = narrowband(&clock);
        let (sink, received) = recording_sink("a");
        let a = mixer.add_source(sink).unwrap();
        wait_for(|| at(&received, Duration::ZERO).is_some());

        a.put_samples(&[1000; 160]);
        clock.advance(Duration::from_millis(20));
        wait_for(|| at(&received, Duration::from_millis(20)).is_some());

        let chunk = at(&received, Duration::from_millis(20)).unwrap();
        assert_eq!(chunk.samples.len(), 160);
        assert!(chunk.is_silent());
        assert_eq!(chunk.source_id, a.id());
    }

    #[test]
    fn test_mix_minus_between_sources() {
        let clock = Arc::new(ManualClock::new());
        let mixer = narrowband(&clock);
        let (sink_a, rx_a) = recording_sink("a");
        let (sink_b, rx_b) = recording_sink("b");
        let (sink_c, rx_c) = recording_sink("c");
        let a = mixer.add_source(sink_a).unwrap();
        wait_for(|| at(&rx_a, Duration::ZERO).is_some());
        let b = mixer.add_source(sink_b).unwrap();
        let c = mixer.add_source(sink_c).unwrap();

        a.put_samples(&[100; 160]);
        b.put_samples(&[20; 160]);
        c.put_samples(&[3; 160]);
        clock.advance(Duration::from_millis(20));

        let ts = Duration::from_millis(20);
        wait_for(|| at(&rx_c, ts).is_some());
        assert!(at(&rx_a, ts).unwrap().samples.iter().all(|&s| s == 23));
        assert!(at(&rx_b, ts).unwrap().samples.iter().all(|&s| s == 103));
        assert!(at(&rx_c, ts).unwrap().samples.iter().all(|&s| s == 120));
    }

    #[test]
    fn test_overrun_emits_event() {
        let clock = Arc::new(ManualClock::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let store = events.clone();
        let config = AudioMixerConfig {
            jitter_wish_frames: 1,
            jitter_max_frames: Some(1),
            ..AudioMixerConfig::from_format(AudioFormat::Narrowband)
        };
        let mixer = AudioMixer::start(
            config,
            clock,
            Some(event_callback(move |e| store.lock().push(e))),
        )
        .unwrap();
        let (sink, received) = recording_sink("a");
        let a = mixer.add_source(sink).unwrap();
        // the clock is frozen after the first iteration
        wait_for(|| !received.lock().is_empty());

        a.put(&[0; 320]);
        a.put(&[0; 320]);

        assert_eq!(a.buffer().cur_size(), 320);
        assert_eq!(mixer.stats().buffer_overruns, 1);
        assert!(events
            .lock()
            .iter()
            .any(|e| matches!(e, MixerEvent::BufferOverrun { dropped_bytes: 320, .. })));
    }

    #[test]
    fn test_sink_error_counted() {
        let clock = Arc::new(ManualClock::new());
        let mixer = narrowband(&clock);
        let _a = mixer
            .add_source(sink_fn("broken", |_: &AudioChunk| {
                Err(SinkError::custom("encoder gone"))
            }))
            .unwrap();

        wait_for(|| mixer.stats().sink_errors >= 1);
    }

    #[test]
    fn test_remove_stops_delivery() {
        let clock = Arc::new(ManualClock::new());
        let mixer = narrowband(&clock);
        let (sink, received) = recording_sink("a");
        let a = mixer.add_source(sink).unwrap();
        let _b = mixer.add_source(NullSink).unwrap();
        assert_eq!(mixer.source_count(), 2);

        wait_for(|| !received.lock().is_empty());
        a.remove();
        let count = received.lock().len();

        clock.advance(Duration::from_millis(100));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(received.lock().len(), count);
        assert_eq!(mixer.source_count(), 1);
        assert_eq!(mixer.stats().sources, 1);
    }

    #[test]
    fn test_add_after_stop() {
        let clock = Arc::new(ManualClock::new());
        let mut mixer = narrowband(&clock);
        let a = mixer.add_source(NullSink).unwrap();
        mixer.stop();

        assert!(!mixer.is_running());
        assert!(matches!(
            mixer.add_source(NullSink),
            Err(MixerError::MixerStopped)
        ));

        a.put(&[0; 10]);
        drop(a);
        assert_eq!(mixer.source_count(), 0);
    }
}
