use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::FunctionDecl;
use crate::engine::{Engine, Scope};
use crate::RuntimeError;

/// Everything a script can hold in a variable. Cloning is cheap, objects and
/// functions are shared references
#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Object(Object),
    Function(Rc<Function>),
    Native(Native),
    Host(Rc<dyn HostObject>),
}

/// A script object: an insertion ordered property table behind a shared cell.
/// Script code writes properties, the host may read them at any time
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<IndexMap<Rc<str>, Value>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }
    pub fn set(&self, key: impl Into<Rc<str>>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// objects can be cyclic, so only the keys are printed
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.0.borrow().keys()).finish()
    }
}

/// A closure: the function expression it was created from, and the scope
/// it was created in
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<Scope>,
}
impl Function {
    pub fn name(&self) -> &str {
        match &self.decl.name {
            Some(name) => &name.name,
            None => "anonymous",
        }
    }
}
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "function {}({} params)", self.name(), self.decl.parameters.len())
    }
}

pub type NativeFn = fn(&Engine, &Value, &[Value]) -> Result<Value, RuntimeError>;

/// A builtin implemented in rust. Receives `this` and the arguments
#[derive(Clone, Copy)]
pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
}
impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "native {}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host object doesn't answer to this method
    NoSuchMethod,
    /// The method exists but failed
    Failed(String),
}

/// A rust value handed to scripts. Scripts can only call methods on it
/// (`trace.hasNext()`), properties read as undefined
pub trait HostObject: fmt::Debug {
    fn type_name(&self) -> &str;
    fn call_method(&self, method: &str, args: &[Value]) -> Result<Value, HostError>;
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(s.into())
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Host(host) => host.type_name(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Native(_))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// numeric conversion for arithmetic, NaN when there is none
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Null => 0.0,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(std::f64::NAN)
                }
            }
            _ => std::f64::NAN,
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            (Value::Host(a), Value::Host(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `==`, strict equality plus the null/undefined and number/string cases
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Null) | (Value::Null, Value::Undefined) => true,
            (Value::Number(_), Value::Str(_)) | (Value::Str(_), Value::Number(_)) => {
                self.to_number() == other.to_number()
            }
            _ => self.strict_equals(other),
        }
    }
}

/// integers print without a fraction, like scripts expect
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n == 0.0 {
        // -0 too
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(_) => write!(f, "[object Object]"),
            Value::Function(func) => write!(f, "function {}", func.name()),
            Value::Native(native) => write!(f, "function {}", native.name),
            Value::Host(host) => write!(f, "[object {}]", host.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Object(object) => write!(f, "{:?}", object),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Native(native) => write!(f, "{:?}", native),
            Value::Host(host) => write!(f, "{:?}", host),
            other => write!(f, "{}", other),
        }
    }
}

/// This trait serves only to make the invoke! macro work easily, building
/// a [Value] by hand is just as effective
pub trait IntoValue {
    fn into_value(self) -> Value;
}
impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}
impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Number(self)
    }
}
impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Number(self as f64)
    }
}
impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}
impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::str(self)
    }
}
impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self.into())
    }
}
impl IntoValue for Object {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}
impl<T: HostObject + 'static> IntoValue for Rc<T> {
    fn into_value(self) -> Value {
        Value::Host(self)
    }
}
