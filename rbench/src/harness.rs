use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use crate::experiment::{Experiment, Strategy, TRACE_LENGTH};
use crate::runner::{ExperimentRunner, Outcome, RunnerConfig};
use crate::{BridgeError, ScriptBridge};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarnessConfig {
    pub runner: RunnerConfig,
    pub trace_length: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig { runner: RunnerConfig::default(), trace_length: TRACE_LENGTH }
    }
}

/// Why a script never got to run
#[derive(Debug)]
pub enum HarnessError {
    Read(io::Error),
    Eval(BridgeError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HarnessError::Read(e) => write!(f, "could not read script: {}", e),
            HarnessError::Eval(e) => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for HarnessError {}

impl From<io::Error> for HarnessError {
    fn from(e: io::Error) -> Self {
        HarnessError::Read(e)
    }
}
impl From<BridgeError> for HarnessError {
    fn from(e: BridgeError) -> Self {
        HarnessError::Eval(e)
    }
}

fn load(bridge: &dyn ScriptBridge, path: &Path) -> Result<(), HarnessError> {
    let source = std::fs::read_to_string(path)?;
    info!("evaluating {} ({} bytes)", path.display(), source.len());
    bridge.eval(&source)?;
    Ok(())
}

/// Loads the script named by the first argument into a new bridge and times
/// every strategy against it. Missing scripts and broken scripts are reported
/// on `out`, only failing to write there is an error
pub fn run<B, F, W>(
    args: &[String],
    make_bridge: F,
    config: &HarnessConfig,
    out: &mut W,
) -> io::Result<Vec<Outcome>>
where
    B: ScriptBridge,
    F: FnOnce() -> B,
    W: Write,
{
    writeln!(out, "[{}]", args.join(", "))?;
    let path = match args.first() {
        Some(path) => Path::new(path),
        None => return Ok(vec![]),
    };
    if !path.is_file() {
        writeln!(out, "script not found: {}", path.display())?;
        let cwd = std::env::current_dir()?;
        writeln!(out, "{}", cwd.display())?;
        return Ok(vec![]);
    }

    let bridge = make_bridge();
    let mut outcomes = vec![];
    match load(&bridge, path) {
        Err(e) => {
            error!("{} did not load: {}", path.display(), e);
            writeln!(out, "{}", e)?;
        }
        Ok(()) => {
            let mut experiments: Vec<Experiment> = Strategy::ALL
                .iter()
                .map(|&strategy| Experiment::with_length(strategy, &bridge, config.trace_length))
                .collect();
            let mut runner = ExperimentRunner::with_config(config.runner, &mut *out);
            for experiment in &mut experiments {
                writeln!(runner.out(), "running experiment: {}", experiment.strategy().name())?;
                info!("running experiment: {}", experiment.strategy().name());
                outcomes.push(runner.execute(experiment)?);
            }
        }
    }
    writeln!(out, "done")?;
    Ok(outcomes)
}
