extern crate rscript;
use rscript::{invoke, Engine, HostError, HostObject, RuntimeErrorKind, ScriptError, Value};

use std::cell::Cell;
use std::rc::Rc;

/// counts down from a start, the shape of the iterators hosts hand out
#[derive(Debug)]
struct Countdown {
    left: Cell<u32>,
}
impl HostObject for Countdown {
    fn type_name(&self) -> &str {
        "Countdown"
    }
    fn call_method(&self, method: &str, _args: &[Value]) -> Result<Value, HostError> {
        match method {
            "hasNext" => Ok(Value::Bool(self.left.get() > 0)),
            "next" => match self.left.get() {
                0 => Err(HostError::Failed("countdown is over".to_string())),
                left => {
                    self.left.set(left - 1);
                    Ok(Value::Number(left as f64))
                }
            },
            _ => Err(HostError::NoSuchMethod),
        }
    }
}

fn count(engine: &Engine) -> f64 {
    let result = engine.get("result").expect("script defines result");
    let result = result.as_object().expect("result is an object");
    result.get("count").and_then(|c| c.as_number()).expect("count is a number")
}

#[test]
fn eval_gives_the_last_expression() {
    let engine = Engine::new();
    let value = engine.eval("var a = 2; a * 21;").unwrap();
    assert_eq!(value.as_number(), Some(42.0));
    assert!(matches!(engine.eval("var b = 1;").unwrap(), Value::Undefined));
}

#[test]
fn globals_survive_between_evals() {
    let engine = Engine::new();
    engine.eval("var result = {count: 0.0};").unwrap();
    engine.eval("result.count += 5;").unwrap();
    assert_eq!(count(&engine), 5.0);
    engine.set("limit", Value::Number(3.0));
    assert_eq!(engine.eval("limit + 1").unwrap().as_number(), Some(4.0));
}

#[test]
fn host_reads_script_objects_live() {
    let engine = Engine::new();
    engine
        .eval(
            "var result = {count: 0.0};
             var handler = new Object();
             handler.handleEvent = function(event) { result.count += 1; };",
        )
        .unwrap();
    let handler = engine.get("handler").unwrap();
    for _ in 0..10 {
        engine.invoke_method(&handler, "handleEvent", &[Value::Null]).unwrap();
    }
    assert_eq!(count(&engine), 10.0);
}

#[test]
fn scripts_drive_host_objects() {
    let engine = Engine::new();
    engine
        .eval(
            "var result = {count: 0.0, sum: 0};
             var module = {};
             module.process = function(trace) {
                 while (trace.hasNext()) {
                     result.sum += trace.next();
                     result.count += 1;
                 }
             };",
        )
        .unwrap();
    let module = engine.get("module").unwrap();
    let countdown = Rc::new(Countdown { left: Cell::new(4) });
    engine.invoke_method(&module, "process", &[Value::Host(countdown.clone())]).unwrap();
    assert_eq!(count(&engine), 4.0);
    let sum = engine.get("result").unwrap().as_object().unwrap().get("sum").unwrap();
    assert_eq!(sum.as_number(), Some(10.0));
    assert_eq!(countdown.left.get(), 0);
}

#[test]
fn missing_methods_are_not_runtime_errors() {
    let engine = Engine::new();
    engine.eval("var module = {name: 'not a function'};").unwrap();
    let module = engine.get("module").unwrap();
    match engine.invoke_method(&module, "process", &[]) {
        Err(ScriptError::NoSuchMethod { method, .. }) => assert_eq!(method, "process"),
        other => panic!("expected NoSuchMethod, got {:?}", other),
    }
    // a property that isn't callable is missing too
    assert!(matches!(
        engine.invoke_method(&module, "name", &[]),
        Err(ScriptError::NoSuchMethod { .. })
    ));
    let countdown = Value::Host(Rc::new(Countdown { left: Cell::new(0) }));
    assert!(matches!(
        engine.invoke_method(&countdown, "rewind", &[]),
        Err(ScriptError::NoSuchMethod { .. })
    ));
}

#[test]
fn failures_inside_methods_are_runtime_errors() {
    let engine = Engine::new();
    engine
        .eval(
            "var handler = {};
             handler.handleEvent = function(event) { return event.nope(); };
             handler.drain = function(trace) { trace.next(); trace.next(); };",
        )
        .unwrap();
    let handler = engine.get("handler").unwrap();
    match engine.invoke_method(&handler, "handleEvent", &[Value::Number(1.0)]) {
        Err(ScriptError::Runtime(e)) => {
            assert_eq!(e.kind, RuntimeErrorKind::NotCallable("number.nope".to_string()))
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
    let countdown = Value::Host(Rc::new(Countdown { left: Cell::new(1) }));
    match engine.invoke_method(&handler, "drain", &[countdown]) {
        Err(ScriptError::Runtime(e)) => {
            assert_eq!(e.kind, RuntimeErrorKind::Host("countdown is over".to_string()));
            assert_eq!(e.backtrace.len(), 1);
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
    // a missing method deep in script code is a runtime error too
    engine.eval("handler.missing = function(trace) { trace.rewind(); };").unwrap();
    let countdown = Value::Host(Rc::new(Countdown { left: Cell::new(1) }));
    match engine.invoke_method(&handler, "missing", &[countdown]) {
        Err(ScriptError::Runtime(e)) => {
            assert!(matches!(e.kind, RuntimeErrorKind::NoSuchMethod { .. }))
        }
        other => panic!("expected a runtime error, got {:?}", other),
    }
}

#[test]
fn invoke_macro() {
    let engine = Engine::new();
    engine
        .eval(
            "var result = {count: 0};
             var handler = {handleEvent: function(by) { result.count += by; return result.count; }};
             function reset() { result.count = 0; }",
        )
        .unwrap();
    assert_eq!(invoke![engine.handler.handleEvent(2)].unwrap().as_number(), Some(2.0));
    assert_eq!(invoke![engine.handler.handleEvent(3.5)].unwrap().as_number(), Some(5.5));
    invoke![engine.reset()].unwrap();
    assert_eq!(count(&engine), 0.0);
    assert!(matches!(invoke![engine.nobody.handleEvent()], Err(ScriptError::Unbound(_))));
    assert!(matches!(invoke![engine.nothing()], Err(ScriptError::Unbound(_))));
}
