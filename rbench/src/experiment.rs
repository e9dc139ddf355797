use std::rc::Rc;

use rscript::Value;

use crate::runner::{Tally, Workload};
use crate::trace::SyntheticTrace;
use crate::{BridgeError, ScriptBridge};

/// events per experiment trace, and what the runner's metric is normalized to
pub const TRACE_LENGTH: usize = 1_000_000;

/// The two ways of handing a trace to the script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `handler.handleEvent(event)` once per event
    InvokeForEach,
    /// `module.process(trace)` once, the script walks the trace
    InvokeOnce,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::InvokeForEach, Strategy::InvokeOnce];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::InvokeForEach => "InvokeForEach",
            Strategy::InvokeOnce => "InvokeOnce",
        }
    }
}

/// One strategy bound to a script, with its own trace. The script must
/// define `result` with a numeric `count` that goes up once per event
pub struct Experiment<'b> {
    strategy: Strategy,
    trace: Rc<SyntheticTrace>,
    bridge: &'b dyn ScriptBridge,
}

impl<'b> Experiment<'b> {
    pub fn new(strategy: Strategy, bridge: &'b dyn ScriptBridge) -> Self {
        Self::with_length(strategy, bridge, TRACE_LENGTH)
    }

    pub fn with_length(strategy: Strategy, bridge: &'b dyn ScriptBridge, length: usize) -> Self {
        debug!("generating {} events for {}", length, strategy.name());
        Experiment {
            strategy,
            trace: Rc::new(SyntheticTrace::generate(length)),
            bridge,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn trace(&self) -> &SyntheticTrace {
        &self.trace
    }

    fn count(&self) -> Result<f64, BridgeError> {
        let result = self.bridge.binding("result")?;
        result
            .as_object()
            .and_then(|result| result.get("count"))
            .and_then(|count| count.as_number())
            .ok_or_else(|| BridgeError::MissingBinding("result.count".to_string()))
    }

    /// Every pass must count the whole trace, even if it started part way
    /// through or already exhausted
    fn tally(&self, before: f64, after: f64) -> Tally {
        let counted = after - before;
        if counted == self.trace.len() as f64 {
            Tally::Matched
        } else {
            Tally::Mismatch { expected: self.trace.len(), counted }
        }
    }

    fn invoke_for_each(&self) -> Result<Tally, BridgeError> {
        let handler = self.bridge.binding("handler")?;
        let before = self.count()?;
        while let Ok(event) = self.trace.next() {
            let event = Value::Host(Rc::new(event));
            self.bridge.invoke_method(&handler, "handleEvent", &[event])?;
        }
        let after = self.count()?;
        Ok(self.tally(before, after))
    }

    fn invoke_once(&self) -> Result<Tally, BridgeError> {
        let module = self.bridge.binding("module")?;
        let before = self.count()?;
        let trace = Value::Host(self.trace.clone());
        self.bridge.invoke_method(&module, "process", &[trace])?;
        let after = self.count()?;
        Ok(self.tally(before, after))
    }
}

impl<'b> Workload for Experiment<'b> {
    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn before(&mut self) {
        self.trace.reset();
    }

    fn go(&mut self) -> Result<Tally, BridgeError> {
        match self.strategy {
            Strategy::InvokeForEach => self.invoke_for_each(),
            Strategy::InvokeOnce => self.invoke_once(),
        }
    }
}
