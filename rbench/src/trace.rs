// A fixed sequence of fake context switches, replayed from the start before
// every run. Scripts see the trace and its events as host objects

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rscript::{HostError, HostObject, Value};

/// what every synthetic event reports as its name
pub const EVENT_NAME: &str = "sched_switch";

/// One context switch: the thread leaving the cpu and the one taking it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub previous_id: u64,
    pub next_id: u64,
}

impl HostObject for Event {
    fn type_name(&self) -> &str {
        "Event"
    }
    fn call_method(&self, method: &str, _args: &[Value]) -> Result<Value, HostError> {
        match method {
            "getName" => Ok(Value::str(EVENT_NAME)),
            "getPrevTid" => Ok(Value::Number(self.previous_id as f64)),
            "getNextTid" => Ok(Value::Number(self.next_id as f64)),
            _ => Err(HostError::NoSuchMethod),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceError {
    /// next() was called with no events left
    Exhausted { length: usize },
}
impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TraceError::Exhausted { length } => {
                write!(f, "trace exhausted, all {} events were read", length)
            }
        }
    }
}
impl std::error::Error for TraceError {}

pub struct SyntheticTrace {
    events: Vec<Event>,
    cursor: Cell<usize>,
}

impl SyntheticTrace {
    /// Event i is always `{i, i + 1}`
    pub fn generate(length: usize) -> Self {
        let events = (0..length as u64).map(|i| Event { previous_id: i, next_id: i + 1 }).collect();
        SyntheticTrace { events, cursor: Cell::new(0) }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// events not read yet
    pub fn remaining(&self) -> usize {
        self.events.len() - self.cursor.get()
    }

    pub fn reset(&self) {
        self.cursor.set(0);
    }

    pub fn has_next(&self) -> bool {
        self.cursor.get() < self.events.len()
    }

    pub fn next(&self) -> Result<Event, TraceError> {
        let at = self.cursor.get();
        match self.events.get(at) {
            Some(event) => {
                self.cursor.set(at + 1);
                Ok(*event)
            }
            None => Err(TraceError::Exhausted { length: self.events.len() }),
        }
    }
}

impl fmt::Debug for SyntheticTrace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SyntheticTrace")
            .field("len", &self.events.len())
            .field("cursor", &self.cursor.get())
            .finish()
    }
}

// getNext and rewind are the names older scripts use
impl HostObject for SyntheticTrace {
    fn type_name(&self) -> &str {
        "Trace"
    }
    fn call_method(&self, method: &str, _args: &[Value]) -> Result<Value, HostError> {
        match method {
            "hasNext" => Ok(Value::Bool(self.has_next())),
            "next" | "getNext" => match self.next() {
                Ok(event) => Ok(Value::Host(Rc::new(event))),
                Err(e) => Err(HostError::Failed(e.to_string())),
            },
            "reset" | "rewind" => {
                self.reset();
                Ok(Value::Undefined)
            }
            _ => Err(HostError::NoSuchMethod),
        }
    }
}
