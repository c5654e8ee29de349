//! Wall-clock instrumentation of a run.
//!
//! A `Performance` collector is created by the caller and handed to the
//! event loop, which reports backwater solves, bed updates and internal
//! steps into it.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

/// Timer and counters for one event computation.
#[derive(Clone, Debug, Default)]
pub struct Performance {
    start_instant: Option<Instant>,
    /// Total wall-clock time between `start` and `stop`
    pub elapsed: Duration,
    /// Time spent in the backwater solver
    pub hydraulics: Duration,
    /// Time spent updating bed elevations
    pub bed_update: Duration,
    /// Number of steady depth solves
    pub n_backwater_solves: usize,
    /// Number of internal time steps
    pub n_internal_steps: usize,
}

impl Performance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the run timer.
    pub fn start(&mut self) {
        self.start_instant = Some(Instant::now());
    }

    /// Stop the run timer; does nothing if it was not started.
    pub fn stop(&mut self) {
        if let Some(start) = self.start_instant.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// True between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.start_instant.is_some()
    }

    /// Record one backwater solve.
    pub fn record_hydraulics(&mut self, duration: Duration) {
        self.hydraulics += duration;
        self.n_backwater_solves += 1;
    }

    /// Record the bed update of one internal step.
    pub fn record_bed_update(&mut self, duration: Duration) {
        self.bed_update += duration;
        self.n_internal_steps += 1;
    }

    /// Human-readable report.
    pub fn summary(&self) -> String {
        let total = self.elapsed.as_secs_f64();
        let share = |d: Duration| {
            if total > 0.0 {
                100.0 * d.as_secs_f64() / total
            } else {
                0.0
            }
        };
        format!(
            "total time         : {}\n\
             hydraulics         : {} ({:.1}%)\n\
             bed update         : {} ({:.1}%)\n\
             backwater solves   : {}\n\
             internal time steps: {}\n",
            format_duration(total),
            format_duration(self.hydraulics.as_secs_f64()),
            share(self.hydraulics),
            format_duration(self.bed_update.as_secs_f64()),
            share(self.bed_update),
            self.n_backwater_solves,
            self.n_internal_steps,
        )
    }

    /// Write the summary to a text file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.summary())
    }
}

/// Format seconds as `1h02m03s`, `2m05s` or `1.234s`.
fn format_duration(seconds: f64) -> String {
    if seconds >= 3600.0 {
        let h = (seconds / 3600.0) as u64;
        let m = ((seconds % 3600.0) / 60.0) as u64;
        let s = (seconds % 60.0) as u64;
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if seconds >= 60.0 {
        let m = (seconds / 60.0) as u64;
        let s = (seconds % 60.0) as u64;
        format!("{}m{:02}s", m, s)
    } else {
        format!("{:.3}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut perf = Performance::new();
        perf.start();
        assert!(perf.is_running());
        perf.record_hydraulics(Duration::from_millis(5));
        perf.record_hydraulics(Duration::from_millis(5));
        perf.record_bed_update(Duration::from_millis(2));
        perf.stop();
        assert!(!perf.is_running());

        assert_eq!(perf.n_backwater_solves, 2);
        assert_eq!(perf.n_internal_steps, 1);
        assert_eq!(perf.hydraulics, Duration::from_millis(10));

        let summary = perf.summary();
        assert!(summary.contains("backwater solves   : 2"));
        assert!(summary.contains("internal time steps: 1"));
    }

    #[test]
    fn test_stop_without_start() {
        let mut perf = Performance::new();
        perf.stop();
        assert_eq!(perf.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(1.5), "1.500s");
        assert_eq!(format_duration(125.0), "2m05s");
        assert_eq!(format_duration(3723.0), "1h02m03s");
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perf.txt");
        Performance::new().save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("total time"));
    }
}
