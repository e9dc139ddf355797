use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::BridgeError;

/// What one pass counted, checked against what it should have
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tally {
    Matched,
    Mismatch { expected: usize, counted: f64 },
}

/// Anything the runner can time. `before` is not timed, `go` is one full
/// pass and failing aborts the run
pub trait Workload {
    fn name(&self) -> &str;
    fn before(&mut self);
    fn go(&mut self) -> Result<Tally, BridgeError>;
}

/// When to stop repeating: only once both minimums are reached
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerConfig {
    pub min_elapsed: Duration,
    pub min_repeats: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig { min_elapsed: Duration::from_secs(1), min_repeats: 10 }
    }
}

impl RunnerConfig {
    pub fn min_elapsed(mut self, min_elapsed: Duration) -> Self {
        self.min_elapsed = min_elapsed;
        self
    }
    pub fn min_repeats(mut self, min_repeats: u64) -> Self {
        self.min_repeats = min_repeats;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunStats {
    /// time spent in `go`, summed over every run
    pub elapsed: Duration,
    pub repeat: u64,
}

impl RunStats {
    /// Seconds per event with the reference trace of a million events,
    /// 0 when nothing ran
    pub fn metric(&self) -> f64 {
        if self.repeat == 0 {
            return 0.0;
        }
        self.elapsed.as_nanos() as f64 / (self.repeat as f64 * 1e9 * 1e6)
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub stats: RunStats,
    /// passes whose count was off, they still count as runs
    pub mismatches: u64,
    /// why the loop stopped early, if it did
    pub error: Option<BridgeError>,
}

impl Outcome {
    pub fn aborted(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug)]
pub struct ExperimentRunner<W: Write> {
    config: RunnerConfig,
    out: W,
}

impl<W: Write> ExperimentRunner<W> {
    pub fn new(out: W) -> Self {
        Self::with_config(RunnerConfig::default(), out)
    }

    pub fn with_config(config: RunnerConfig, out: W) -> Self {
        ExperimentRunner { config, out }
    }

    /// where results are written, for callers to add their own lines
    pub fn out(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn execute(&mut self, workload: &mut dyn Workload) -> io::Result<Outcome> {
        let mut stats = RunStats::default();
        let mut mismatches = 0;
        let mut error = None;
        while stats.elapsed < self.config.min_elapsed || stats.repeat < self.config.min_repeats {
            workload.before();
            let start = Instant::now();
            let result = workload.go();
            let end = Instant::now();
            match result {
                Ok(Tally::Matched) => (),
                // a wrong count means the script is broken, not the run, so keep timing
                Ok(Tally::Mismatch { expected, counted }) => {
                    writeln!(
                        self.out,
                        "houston, got a problem: expected {} more events, counted {}",
                        expected, counted
                    )?;
                    let name = workload.name();
                    warn!("{}: count went up by {} for {} events", name, counted, expected);
                    mismatches += 1;
                }
                Err(e) => {
                    error!("{} aborted after {} runs: {}", workload.name(), stats.repeat, e);
                    writeln!(self.out, "{}", e)?;
                    error = Some(e);
                    break;
                }
            }
            stats.elapsed += end - start;
            stats.repeat += 1;
            debug!("{} run {} took {:?}", workload.name(), stats.repeat, end - start);
        }
        writeln!(self.out, "repeat:{} elapsed:{:.9}", stats.repeat, stats.metric())?;
        info!("{}: {} runs in {:?}", workload.name(), stats.repeat, stats.elapsed);
        Ok(Outcome { stats, mismatches, error })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn metric_is_per_reference_event() {
        let stats = RunStats { elapsed: Duration::from_secs(10), repeat: 10 };
        assert!((stats.metric() - 1e-6).abs() < 1e-15);
        assert_eq!(RunStats::default().metric(), 0.0);
    }

    #[test]
    fn config_builder() {
        let config = RunnerConfig::default().min_repeats(3).min_elapsed(Duration::from_millis(5));
        assert_eq!(config, RunnerConfig { min_elapsed: Duration::from_millis(5), min_repeats: 3 });
        assert_eq!(RunnerConfig::default().min_repeats, 10);
    }
}
