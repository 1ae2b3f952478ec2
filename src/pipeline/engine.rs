//! Paced worker thread shared by the audio and video mixers.
//!
//! Each mixer owns one OS thread that sleeps on a condvar while it has no
//! sources, and otherwise polls a [`Clock`] every few milliseconds. A mix
//! iteration runs whenever the clock has reached the next virtual
//! timestamp, which then advances by exactly one interval. Late iterations
//! are caught up one poll at a time, so the output cadence never drifts.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::clock::Clock;
use crate::event::emit;
use crate::stats::MixerState;
use crate::{EventCallback, MixerError, MixerEvent};

/// Per-mixer behavior driven by the worker.
pub(crate) trait MixEngine: Send + 'static {
    /// Number of registered sources. The worker idles at zero.
    fn source_count(&self) -> usize;

    /// Runs one mix iteration and delivers the results.
    fn tick(&mut self, timestamp: Duration, hooks: &Hooks);
}

/// Stats and event plumbing reachable without taking the mixer lock.
pub(crate) struct Hooks {
    pub state: MixerState,
    pub on_event: Option<EventCallback>,
}

impl Hooks {
    pub fn new(on_event: Option<EventCallback>) -> Self {
        Self {
            state: MixerState::new(),
            on_event,
        }
    }

    pub fn emit(&self, event: MixerEvent) {
        emit(self.on_event.as_ref(), event);
    }
}

/// State shared between a mixer, its source handles and its worker.
pub(crate) struct Shared<E> {
    engine: Mutex<E>,
    wake: Condvar,
    pub hooks: Hooks,
    pub clock: Arc<dyn Clock>,
}

impl<E: MixEngine> Shared<E> {
    pub fn new(engine: E, hooks: Hooks, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: Mutex::new(engine),
            wake: Condvar::new(),
            hooks,
            clock,
        }
    }

    /// Locks the registry. Blocks while an iteration is in progress.
    pub fn lock(&self) -> MutexGuard<'_, E> {
        self.engine.lock()
    }

    /// Wakes an idle worker. Call after registering a source.
    pub fn notify(&self) {
        self.wake.notify_one();
    }
}

/// Worker cadence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pacing {
    pub interval: Duration,
    pub poll: Duration,
}

/// Owns the worker thread; stops and joins it on drop.
pub(crate) struct Worker<E: MixEngine> {
    shared: Arc<Shared<E>>,
    handle: Option<JoinHandle<()>>,
    name: String,
}

impl<E: MixEngine> Worker<E> {
    /// Starts the worker thread.
    pub fn spawn(
        name: impl Into<String>,
        shared: Arc<Shared<E>>,
        pacing: Pacing,
    ) -> Result<Self, MixerError> {
        let name = name.into();
        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(&thread_shared, pacing))
            .map_err(|source| MixerError::ThreadSpawn {
                thread: name.clone(),
                source,
            })?;

        tracing::info!(
            thread = %name,
            interval_ms = pacing.interval.as_millis() as u64,
            "mixer worker started"
        );

        Ok(Self {
            shared,
            handle: Some(handle),
            name,
        })
    }

    /// Stops the worker and waits for it to exit.
    ///
    /// Idempotent. Returns once no further sink calls can happen.
    pub fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        self.shared
            .hooks
            .state
            .running
            .store(false, std::sync::atomic::Ordering::SeqCst);

        // Called from inside a sink on the worker itself: the lock is held
        // and joining would deadlock, so just let the loop fall out.
        if handle.thread().id() == thread::current().id() {
            return;
        }

        {
            let _guard = self.shared.lock();
            self.shared.wake.notify_all();
        }

        if handle.join().is_err() {
            tracing::warn!(thread = %self.name, "mixer worker panicked");
        } else {
            tracing::info!(thread = %self.name, "mixer worker stopped");
        }
    }
}

impl<E: MixEngine> Drop for Worker<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<E: MixEngine>(shared: &Shared<E>, pacing: Pacing) {
    let state = &shared.hooks.state;
    let mut engine = shared.lock();
    // (epoch, next due); None while idle
    let mut schedule: Option<(Instant, Instant)> = None;

    while state.is_running() {
        if engine.source_count() == 0 {
            if schedule.take().is_some() {
                tracing::debug!("mixer idle, waiting for sources");
            }
            shared.wake.wait(&mut engine);
        } else {
            MutexGuard::unlocked(&mut engine, || thread::sleep(pacing.poll));
        }

        if !state.is_running() || engine.source_count() == 0 {
            continue;
        }

        let now = shared.clock.now();
        let (epoch, due) = *schedule.get_or_insert((now, now));
        if now < due {
            continue;
        }

        engine.tick(due - epoch, &shared.hooks);
        schedule = Some((epoch, due + pacing.interval));

        let n = state
            .iterations
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        if n % 500 == 0 {
            tracing::debug!(iterations = n, sources = engine.source_count(), "mixer progress");
        }
    }
}
