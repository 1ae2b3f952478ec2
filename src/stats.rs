//! Mixer run state and statistics.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// Statistics about a running mixer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixerStats {
    /// Mix iterations completed since creation.
    pub iterations: u64,
    /// Sources currently registered.
    pub sources: usize,
    /// Jitter buffer overruns across all sources (audio only).
    pub buffer_overruns: u64,
    /// Jitter buffer underruns across all sources (audio only).
    pub buffer_underruns: u64,
    /// Payloads rejected by sinks.
    pub sink_errors: u64,
}

/// Internal state shared between a mixer handle, its sources and its worker.
#[derive(Debug)]
pub(crate) struct MixerState {
    pub running: AtomicBool,
    pub iterations: AtomicU64,
    pub sources: AtomicUsize,
    pub buffer_overruns: AtomicU64,
    pub buffer_underruns: AtomicU64,
    pub sink_errors: AtomicU64,
}

impl MixerState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            iterations: AtomicU64::new(0),
            sources: AtomicUsize::new(0),
            buffer_overruns: AtomicU64::new(0),
            buffer_underruns: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> MixerStats {
        MixerStats {
            iterations: self.iterations.load(Ordering::SeqCst),
            sources: self.sources.load(Ordering::SeqCst),
            buffer_overruns: self.buffer_overruns.load(Ordering::SeqCst),
            buffer_underruns: self.buffer_underruns.load(Ordering::SeqCst),
            sink_errors: self.sink_errors.load(Ordering::SeqCst),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_running() {
        let state = MixerState::new();
        assert!(state.is_running());
        assert_eq!(state.snapshot(), MixerStats::default());
    }

    #[test]
    fn test_snapshot_reads_counters() {
        let state = MixerState::new();
        state.iterations.fetch_add(3, Ordering::SeqCst);
        state.sources.store(2, Ordering::SeqCst);
        state.sink_errors.fetch_add(1, Ordering::SeqCst);

        let stats = state.snapshot();
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.sources, 2);
        assert_eq!(stats.sink_errors, 1);
        assert_eq!(stats.buffer_overruns, 0);
    }
}
