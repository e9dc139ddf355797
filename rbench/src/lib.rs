//! Measures what calling into a script costs: once per event through
//! `handler.handleEvent`, or once per trace through `module.process`.

#[macro_use]
extern crate log;

mod bridge;
mod experiment;
mod harness;
mod runner;
mod trace;

pub use bridge::{BridgeError, ScriptBridge};
pub use experiment::{Experiment, Strategy, TRACE_LENGTH};
pub use harness::{run, HarnessConfig, HarnessError};
pub use runner::{ExperimentRunner, Outcome, RunStats, RunnerConfig, Tally, Workload};
pub use trace::{Event, SyntheticTrace, TraceError, EVENT_NAME};
