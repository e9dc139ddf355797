extern crate rscript;
use rscript::{Engine, ParseError, RuntimeErrorKind, ScriptError, MAX_CALL_DEPTH, MAX_NESTING};

use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;

// Log needs to be initialized once in the async mess that is cargo test
use std::sync::Once;
static LOGGER_INIT: Once = Once::new();

fn ensure_log_init() {
    LOGGER_INIT.call_once(|| env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .init()
    );
}

/// print output, kept by the test after the engine has it boxed
#[derive(Clone, Default)]
struct Captured(Rc<RefCell<Vec<u8>>>);
impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

fn run_file(path: &Path) -> (Result<rscript::Value, ScriptError>, String) {
    let script_string = std::fs::read_to_string(path).expect("could not load given file");
    let out = Captured::default();
    let engine = Engine::with_output(Box::new(out.clone()));
    let result = engine.eval(&script_string);
    (result, out.text())
}

// Every script in tests/scripts must run, and print exactly its .out file
fn run_in_dir(dir: &str) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension() == Some(std::ffi::OsStr::new("js")) {
            println!("TESTING: {}", path.to_string_lossy());
            let (result, printed) = run_file(&path);
            if let Err(e) = result {
                println!("{}", e);
                panic!("script failed");
            }
            let expected = std::fs::read_to_string(path.with_extension("out"))?;
            assert_eq!(printed, expected, "output of {}", path.to_string_lossy());
        }
    }
    Ok(())
}

#[test]
fn test_scripts() -> std::io::Result<()> {
    ensure_log_init();
    run_in_dir("tests/scripts")
}

fn runtime_error(file: &str) -> rscript::RuntimeError {
    match run_file(Path::new(file)).0 {
        Err(ScriptError::Runtime(e)) => e,
        other => panic!("{} should fail at runtime, got {:?}", file, other),
    }
}

#[test]
fn undefined_variable_has_backtrace() {
    ensure_log_init();
    let e = runtime_error("tests/scripts/fail/undefined_variable.js");
    assert_eq!(e.kind, RuntimeErrorKind::Undefined("missing".to_string()));
    assert_eq!(e.span.lo.0, 2);
    assert_eq!(e.backtrace.len(), 2);
    assert!(e.backtrace[0].starts_with("inner"));
    assert!(e.backtrace[1].starts_with("outer"));
    let shown = format!("{}", e);
    assert!(shown.starts_with("script error: missing is not defined at 2:"));
    assert!(shown.contains("BACKTRACE:"));
}

#[test]
fn reading_through_undefined() {
    ensure_log_init();
    let e = runtime_error("tests/scripts/fail/read_undefined.js");
    match e.kind {
        RuntimeErrorKind::NotAnObject(what) => assert!(what.contains("count")),
        other => panic!("wrong error {:?}", other),
    }
    // top level, no functions running
    assert!(e.backtrace.is_empty());
}

#[test]
fn runaway_recursion_is_an_error() {
    ensure_log_init();
    let e = runtime_error("tests/scripts/fail/recursion.js");
    assert_eq!(e.kind, RuntimeErrorKind::CallDepthExceeded(MAX_CALL_DEPTH));
    assert_eq!(e.backtrace.len(), MAX_CALL_DEPTH);
}

#[test]
fn calling_a_number() {
    ensure_log_init();
    let e = runtime_error("tests/scripts/fail/not_callable.js");
    assert_eq!(e.kind, RuntimeErrorKind::NotCallable("object.count".to_string()));
}

#[test]
fn deep_nesting_is_a_parse_error() {
    ensure_log_init();
    let (result, printed) = run_file(Path::new("tests/scripts/fail/deep_nesting.js"));
    match result {
        Err(ScriptError::Parse(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], ParseError::TooDeep(_)));
            let shown = format!("{}", errors[0]);
            assert!(shown.contains(&format!("more than {} levels", MAX_NESTING)));
        }
        other => panic!("expected a parse error, got {:?}", other),
    }
    // nothing ran
    assert_eq!(printed, "");
}

#[test]
fn syntax_errors_are_all_reported() {
    ensure_log_init();
    let engine = Engine::new();
    match engine.eval("var = 1;\nvar ok = 2;\n1 = ok;") {
        Err(ScriptError::Parse(errors)) => assert_eq!(errors.len(), 2),
        other => panic!("expected parse errors, got {:?}", other),
    }
    assert!(matches!(engine.eval("var s = \"open"), Err(ScriptError::Lex(_))));
}
