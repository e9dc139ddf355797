use std::fmt;

use crate::{LexError, ParseError, Span};

/// What went wrong while a script was running
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    /// Reading a variable that was never declared or assigned
    Undefined(String),
    /// Calling something that isn't a function
    NotCallable(String),
    /// Reading a property of undefined or null, or setting one on anything
    /// but an object
    NotAnObject(String),
    /// A method call on an object or host object that doesn't have it
    NoSuchMethod { target: String, method: String },
    /// A host object method or builtin failed
    Host(String),
    /// Too much recursion
    CallDepthExceeded(usize),
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use RuntimeErrorKind::*;
        match self {
            Undefined(name) => write!(f, "{} is not defined", name),
            NotCallable(what) => write!(f, "{} is not a function", what),
            NotAnObject(what) => write!(f, "cannot read properties of {}", what),
            NoSuchMethod { target, method } => write!(f, "{} has no method {}", target, method),
            Host(msg) => write!(f, "{}", msg),
            CallDepthExceeded(max) => {
                write!(f, "call stack overflow (too much recursion?), max depth {}", max)
            }
        }
    }
}

/// A runtime error and where it happened. The backtrace holds the names of
/// the script functions that were running, innermost first
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub span: Span,
    pub backtrace: Vec<String>,
}

impl RuntimeError {
    /// An error raised outside of any script frame (builtins use this, the
    /// engine fills in the location)
    pub fn host(msg: impl Into<String>) -> Self {
        RuntimeError {
            kind: RuntimeErrorKind::Host(msg.into()),
            span: Span::new(),
            backtrace: vec![],
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "script error: {} at {}", self.kind, self.span)?;
        if !self.backtrace.is_empty() {
            write!(f, "\nBACKTRACE:")?;
            for frame in &self.backtrace {
                write!(f, "\n{}", frame)?;
            }
        }
        Ok(())
    }
}
impl std::error::Error for RuntimeError {}

/// Everything the host can get back from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    Lex(LexError),
    /// Every statement that failed to parse
    Parse(Vec<ParseError>),
    /// The host asked for a global that doesn't exist
    Unbound(String),
    /// The host called a method that the target doesn't have. Only raised
    /// for the call the host made, a missing method deeper inside script
    /// code is a [RuntimeError]
    NoSuchMethod { target: String, method: String },
    Runtime(RuntimeError),
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScriptError::Lex(e) => write!(f, "{}", e),
            ScriptError::Parse(errors) => {
                let lines: Vec<String> = errors.iter().map(|e| format!("{}", e)).collect();
                write!(f, "{}", lines.join("\n"))
            }
            ScriptError::Unbound(name) => write!(f, "no global named {}", name),
            ScriptError::NoSuchMethod { target, method } => {
                write!(f, "no such method: {}.{}", target, method)
            }
            ScriptError::Runtime(e) => write!(f, "{}", e),
        }
    }
}
impl std::error::Error for ScriptError {}

impl From<LexError> for ScriptError {
    fn from(e: LexError) -> Self {
        ScriptError::Lex(e)
    }
}
impl From<Vec<ParseError>> for ScriptError {
    fn from(errors: Vec<ParseError>) -> Self {
        ScriptError::Parse(errors)
    }
}
impl From<RuntimeError> for ScriptError {
    fn from(e: RuntimeError) -> Self {
        ScriptError::Runtime(e)
    }
}
