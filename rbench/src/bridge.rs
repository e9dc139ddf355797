use std::fmt;

use rscript::{Engine, ScriptError, Value};

/// Everything the benchmark needs from a script engine: run a script once,
/// then look up what it defined and call methods on it
pub trait ScriptBridge {
    fn eval(&self, source: &str) -> Result<(), BridgeError>;
    fn get(&self, name: &str) -> Option<Value>;
    fn invoke_method(
        &self,
        target: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, BridgeError>;

    /// [ScriptBridge::get], with a missing global as an error
    fn binding(&self, name: &str) -> Result<Value, BridgeError> {
        self.get(name).ok_or_else(|| BridgeError::MissingBinding(name.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// the target exists but can't answer this method
    NoSuchMethod { method: String },
    /// the script never defined this global (or field)
    MissingBinding(String),
    Script(ScriptError),
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BridgeError::NoSuchMethod { method } => write!(f, "no such method: {}", method),
            BridgeError::MissingBinding(name) => write!(f, "script does not define {}", name),
            BridgeError::Script(e) => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for BridgeError {}

impl From<ScriptError> for BridgeError {
    fn from(e: ScriptError) -> Self {
        match e {
            ScriptError::NoSuchMethod { method, .. } => BridgeError::NoSuchMethod { method },
            ScriptError::Unbound(name) => BridgeError::MissingBinding(name),
            other => BridgeError::Script(other),
        }
    }
}

impl<T: ScriptBridge + ?Sized> ScriptBridge for &T {
    fn eval(&self, source: &str) -> Result<(), BridgeError> {
        (**self).eval(source)
    }
    fn get(&self, name: &str) -> Option<Value> {
        (**self).get(name)
    }
    fn invoke_method(
        &self,
        target: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, BridgeError> {
        (**self).invoke_method(target, method, args)
    }
}

impl ScriptBridge for Engine {
    fn eval(&self, source: &str) -> Result<(), BridgeError> {
        Engine::eval(self, source)?;
        Ok(())
    }
    fn get(&self, name: &str) -> Option<Value> {
        Engine::get(self, name)
    }
    fn invoke_method(
        &self,
        target: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, BridgeError> {
        Ok(Engine::invoke_method(self, target, method, args)?)
    }
}
