extern crate rbench;
use rbench::{BridgeError, Experiment, ScriptBridge, Strategy, Tally, Workload, TRACE_LENGTH};
use rscript::Engine;

mod common;
use common::{ensure_log_init, InMemory};

fn engine_with(script: &str) -> Engine {
    let engine = Engine::new();
    if let Err(e) = engine.eval(script) {
        println!("{}", e);
        panic!("test script failed to evaluate");
    }
    engine
}

fn load_events_js() -> Engine {
    let script = std::fs::read_to_string("scripts/events.js").expect("bundled script is missing");
    engine_with(&script)
}

fn count(engine: &Engine) -> f64 {
    let result = engine.get("result").expect("result is defined");
    result
        .as_object()
        .and_then(|r| r.get("count"))
        .and_then(|c| c.as_number())
        .expect("count is a number")
}

#[test]
fn invoke_for_each_counts_every_event() {
    ensure_log_init();
    let engine = load_events_js();
    let mut experiment = Experiment::new(Strategy::InvokeForEach, &engine);
    assert_eq!(experiment.trace().len(), TRACE_LENGTH);
    experiment.before();
    assert_eq!(experiment.go().unwrap(), Tally::Matched);
    assert_eq!(count(&engine), 1_000_000.0);
    assert!(!experiment.trace().has_next());
}

#[test]
fn invoke_once_counts_every_event() {
    ensure_log_init();
    let engine = load_events_js();
    let mut experiment = Experiment::new(Strategy::InvokeOnce, &engine);
    experiment.before();
    assert_eq!(experiment.go().unwrap(), Tally::Matched);
    assert_eq!(count(&engine), 1_000_000.0);
}

#[test]
fn before_rewinds_for_the_next_run() {
    ensure_log_init();
    let engine = load_events_js();
    for &strategy in Strategy::ALL.iter() {
        let mut experiment = Experiment::with_length(strategy, &engine, 100);
        experiment.before();
        experiment.go().unwrap();
        experiment.before();
        assert_eq!(experiment.trace().remaining(), 100);
        experiment.go().unwrap();
    }
    // two strategies, two runs each
    assert_eq!(count(&engine), 400.0);
}

#[test]
fn scripts_see_events() {
    ensure_log_init();
    let engine = engine_with(
        "var result = {count: 0, last: 0};
         var handler = {
             handleEvent: function(event) {
                 var next = event.getNextTid();
                 if (event.getName() == 'sched_switch' && next == event.getPrevTid() + 1) {
                     result.count += 1;
                 }
                 result.last = event.getNextTid();
             }
         };",
    );
    let mut experiment = Experiment::with_length(Strategy::InvokeForEach, &engine, 50);
    experiment.before();
    experiment.go().unwrap();
    assert_eq!(count(&engine), 50.0);
    let last = engine.get("result").unwrap().as_object().unwrap().get("last").unwrap();
    assert_eq!(last.as_number(), Some(50.0));
}

#[test]
fn wrong_count_is_only_a_warning() {
    ensure_log_init();
    let bridge = InMemory { step: 2.0, ..InMemory::new() };
    for &strategy in Strategy::ALL.iter() {
        let mut experiment = Experiment::with_length(strategy, &bridge, 10);
        experiment.before();
        assert_eq!(experiment.go(), Ok(Tally::Mismatch { expected: 10, counted: 20.0 }));
    }
    assert_eq!(bridge.count(), 40.0);
}

#[test]
fn pass_without_rewind_is_a_mismatch() {
    ensure_log_init();
    let engine = load_events_js();
    for &strategy in Strategy::ALL.iter() {
        let mut experiment = Experiment::with_length(strategy, &engine, 10);
        experiment.before();
        assert_eq!(experiment.go(), Ok(Tally::Matched));
        // the trace is used up, so nothing more gets counted
        assert_eq!(experiment.go(), Ok(Tally::Mismatch { expected: 10, counted: 0.0 }));
    }
    assert_eq!(count(&engine), 20.0);
}

#[test]
fn missing_pieces_abort_the_pass() {
    ensure_log_init();
    let no_handler = engine_with("var result = {count: 0};");
    let mut experiment = Experiment::with_length(Strategy::InvokeForEach, &no_handler, 10);
    experiment.before();
    assert_eq!(experiment.go(), Err(BridgeError::MissingBinding("handler".to_string())));

    let no_process = engine_with("var result = {count: 0}; var module = {};");
    let mut experiment = Experiment::with_length(Strategy::InvokeOnce, &no_process, 10);
    experiment.before();
    assert_eq!(experiment.go(), Err(BridgeError::NoSuchMethod { method: "process".to_string() }));

    let no_result = InMemory { no_result: true, ..InMemory::new() };
    let mut experiment = Experiment::with_length(Strategy::InvokeOnce, &no_result, 10);
    experiment.before();
    assert_eq!(experiment.go(), Err(BridgeError::MissingBinding("result".to_string())));
    assert_eq!(no_result.invocations.get(), 0);
}

#[test]
fn script_failures_abort_the_pass() {
    ensure_log_init();
    let engine = engine_with(
        "var result = {count: 0};
         var handler = {handleEvent: function(event) { result.count += event.missing.field; }};",
    );
    let bridge: &dyn ScriptBridge = &engine;
    let mut experiment = Experiment::with_length(Strategy::InvokeForEach, bridge, 10);
    experiment.before();
    match experiment.go() {
        Err(BridgeError::Script(e)) => println!("failed as expected: {}", e),
        other => panic!("expected a script error, got {:?}", other),
    }
    // stopped at the first event
    assert_eq!(experiment.trace().remaining(), 9);
}
