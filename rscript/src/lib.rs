//! rscript is a small embeddable interpreter for a subset of javascript:
//! functions and closures, object literals, `this`, `new`, `var`, `if`,
//! `while` and the usual operators. There is no prototype chain, no
//! exceptions and no standard library beyond `print` and `Object`.
//!
//! The host owns an [Engine], evaluates source with [Engine::eval], reads
//! globals with [Engine::get] and calls back into script code with
//! [Engine::invoke_method] or the [invoke!] macro. Rust values are handed to
//! scripts as [HostObject]s.

#[macro_use]
extern crate log;

pub mod ast;
mod engine;
mod error;
mod lexer;
mod parser;
mod script_std;
mod span;
mod token;
mod value;

pub use engine::{Engine, MAX_CALL_DEPTH};
pub use error::{RuntimeError, RuntimeErrorKind, ScriptError};
pub use lexer::{lex, LexError};
pub use parser::{parse, ParseError, MAX_NESTING};
pub use span::Span;
pub use token::{Token, TokenType};
pub use value::{
    number_to_string, Function, HostError, HostObject, IntoValue, Native, NativeFn, Object, Value,
};

/// let engine = Engine::new();
/// invoke![engine.handler.handleEvent(event)]
/// invoke![engine.main()]
#[macro_export]
macro_rules! invoke {
    ( $engine:ident.$target:ident.$method:ident($( $arg:expr ),*) ) => {
        match $engine.get(stringify!($target)) {
            Some(target) => $engine.invoke_method(
                &target,
                stringify!($method),
                &[$( $crate::IntoValue::into_value($arg) ),*],
            ),
            None => Err($crate::ScriptError::Unbound(stringify!($target).to_string())),
        }
    };
    ( $engine:ident.$function:ident($( $arg:expr ),*) ) => {
        $engine.call(stringify!($function), &[$( $crate::IntoValue::into_value($arg) ),*])
    };
}
