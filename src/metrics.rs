// Performance metrics module
//
// Lightweight counters for resolution passes and tool launches

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide counters.
///
/// Uses atomic operations so the background exit watchers and the resolve
/// queue can record without locks. Logged on shutdown of long-running commands.
#[derive(Debug)]
pub struct Metrics {
    /// Number of resolution passes run
    pub resolutions: AtomicU64,

    /// Resolution passes that found a Qt root
    pub roots_found: AtomicU64,

    /// Number of times CMakeCache.txt was (re)read
    pub cache_reloads: AtomicU64,

    /// Total time spent resolving, in microseconds
    pub total_resolution_time_us: AtomicU64,

    /// Tools successfully spawned
    pub launches_started: AtomicU64,

    /// Launch requests rejected (not found, wrong file type, spawn error)
    pub launches_failed: AtomicU64,

    /// Spawned tools whose exit has been observed
    pub tools_exited: AtomicU64,

    /// Triggers received by the resolve queue
    pub triggers_received: AtomicU64,

    /// Application start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            resolutions: AtomicU64::new(0),
            roots_found: AtomicU64::new(0),
            cache_reloads: AtomicU64::new(0),
            total_resolution_time_us: AtomicU64::new(0),
            launches_started: AtomicU64::new(0),
            launches_failed: AtomicU64::new(0),
            tools_exited: AtomicU64::new(0),
            triggers_received: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a finished resolution pass
    pub fn record_resolution(&self, found: bool, duration: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        if found {
            self.roots_found.fetch_add(1, Ordering::Relaxed);
        }
        self.total_resolution_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_cache_reload(&self) {
        self.cache_reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_launch_started(&self) {
        self.launches_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_launch_failed(&self) {
        self.launches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tool_exited(&self) {
        self.tools_exited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_trigger(&self) {
        self.triggers_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average resolution time in milliseconds
    pub fn avg_resolution_time_ms(&self) -> f64 {
        let total = self.total_resolution_time_us.load(Ordering::Relaxed);
        let count = self.resolutions.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Resolutions: {} ({} found, avg {:.2}ms), cache reloads: {}, triggers: {}",
            self.resolutions.load(Ordering::Relaxed),
            self.roots_found.load(Ordering::Relaxed),
            self.avg_resolution_time_ms(),
            self.cache_reloads.load(Ordering::Relaxed),
            self.triggers_received.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Launches: {} started, {} failed, {} exited",
            self.launches_started.load(Ordering::Relaxed),
            self.launches_failed.load(Ordering::Relaxed),
            self.tools_exited.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
