// Builtins every engine starts with. Everything else a script needs is
// written in script, or handed in by the host as a global or a host object

use crate::value::{Native, NativeFn, Object, Value};
use crate::{Engine, RuntimeError};

const BUILTINS: &[(&str, NativeFn)] = &[("print", print), ("Object", object)];

pub fn define_all(engine: &Engine) {
    for &(name, func) in BUILTINS {
        engine.set(name, Value::Native(Native { name, func }));
    }
}

/// Arguments joined by spaces, one line to the engine's output
pub fn print(engine: &Engine, _this: &Value, args: &[Value]) -> Result<Value, RuntimeError> {
    let parts: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    engine.write_line(&parts.join(" "))?;
    Ok(Value::Undefined)
}

/// `Object()` and `new Object()` both give a fresh empty object
pub fn object(_engine: &Engine, _this: &Value, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Object(Object::new()))
}
