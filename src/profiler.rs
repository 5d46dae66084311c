use log::info;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Accumulated time and call count for one profiled section.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SectionStats {
    pub total: Duration,
    pub calls: u64,
}

impl SectionStats {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// Scoped profiler recording cumulative time per section.
#[derive(Default)]
pub struct Profiler {
    sections: HashMap<&'static str, SectionStats>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let entry = self.sections.entry(name).or_default();
        entry.total += elapsed;
        entry.calls += 1;
    }

    pub fn finish(&mut self, guard: &ProfilerGuard) {
        self.record(guard.name, guard.start.elapsed());
    }

    pub fn get(&self, name: &str) -> Option<SectionStats> {
        self.sections.get(name).copied()
    }

    /// Sections ordered by total time, slowest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, SectionStats)> {
        let mut v: Vec<_> = self.sections.iter().map(|(n, s)| (*n, *s)).collect();
        v.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        v
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }

    pub fn log_and_clear(&mut self) {
        for (name, stats) in self.report_sorted() {
            info!(
                "{:<24} {:>10.3?} total {:>6} calls {:>10.3?} mean",
                name,
                stats.total,
                stats.calls,
                stats.mean()
            );
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

/// Start a profiling section. Returns a guard that will update the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard {
        name,
        start: Instant::now(),
    }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().finish(self);
    }
}

/// Log and reset the global profiler. A no-op without the `profiling` feature.
pub fn report() {
    #[cfg(feature = "profiling")]
    crate::PROFILER.lock().log_and_clear();
}

/// Macro helper to profile a scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}
