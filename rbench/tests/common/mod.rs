// Shared by the integration tests, not every test uses all of it
#![allow(dead_code)]

use rbench::{BridgeError, ScriptBridge};
use rscript::{Object, Value};

use std::cell::Cell;

// Log needs to be initialized once in the async mess that is cargo test
use std::sync::Once;
static LOGGER_INIT: Once = Once::new();

pub fn ensure_log_init() {
    LOGGER_INIT.call_once(|| env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .init()
    );
}

/// A bridge with no script engine behind it. `handleEvent` and `process`
/// bump result.count by `step` per event
#[derive(Default)]
pub struct InMemory {
    pub evals: Cell<usize>,
    pub invocations: Cell<usize>,
    pub result: Object,
    pub step: f64,
    /// leave `result` undefined
    pub no_result: bool,
}

impl InMemory {
    pub fn new() -> Self {
        let bridge = InMemory { step: 1.0, ..Default::default() };
        bridge.result.set("count", Value::Number(0.0));
        bridge
    }

    pub fn count(&self) -> f64 {
        self.result.get("count").and_then(|c| c.as_number()).unwrap_or(std::f64::NAN)
    }

    fn bump(&self, events: usize) {
        self.result.set("count", Value::Number(self.count() + self.step * events as f64));
    }
}

impl ScriptBridge for InMemory {
    fn eval(&self, _source: &str) -> Result<(), BridgeError> {
        self.evals.set(self.evals.get() + 1);
        Ok(())
    }

    fn get(&self, name: &str) -> Option<Value> {
        match name {
            "result" if !self.no_result => Some(Value::Object(self.result.clone())),
            "handler" | "module" => Some(Value::Object(Object::new())),
            _ => None,
        }
    }

    fn invoke_method(
        &self,
        _target: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, BridgeError> {
        self.invocations.set(self.invocations.get() + 1);
        match (method, args.first()) {
            ("handleEvent", Some(_)) => self.bump(1),
            ("process", Some(Value::Host(trace))) => {
                let mut events = 0;
                while let Ok(Value::Bool(true)) = trace.call_method("hasNext", &[]) {
                    if trace.call_method("next", &[]).is_err() {
                        break;
                    }
                    events += 1;
                }
                self.bump(events);
            }
            _ => return Err(BridgeError::NoSuchMethod { method: method.to_string() }),
        }
        Ok(Value::Undefined)
    }
}
