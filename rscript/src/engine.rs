use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::*;
use crate::error::RuntimeErrorKind;
use crate::value::{Function, HostError, Object, Value};
use crate::{lexer, parser, script_std, RuntimeError, ScriptError, Span};

/// Keeps incorrect recursion from overflowing the rust stack, every script
/// call is several nested rust calls. Same limit as clox
pub const MAX_CALL_DEPTH: usize = 64;

/// Variables of one function call (or the globals). Blocks don't get their
/// own scope, `var` belongs to the function
///
/// A closure keeps its defining scope alive, and a scope can hold the
/// closure, those cycles are never collected
pub struct Scope {
    vars: RefCell<IndexMap<Rc<str>, Value>>,
    parent: Option<Rc<Scope>>,
    this: Value,
}

impl Scope {
    fn global() -> Rc<Scope> {
        Rc::new(Scope { vars: RefCell::new(IndexMap::new()), parent: None, this: Value::Undefined })
    }

    fn child(parent: &Rc<Scope>, this: Value) -> Rc<Scope> {
        Rc::new(Scope {
            vars: RefCell::new(IndexMap::new()),
            parent: Some(Rc::clone(parent)),
            this,
        })
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.vars.borrow().get(name) {
                return Some(value.clone());
            }
            match &scope.parent {
                Some(parent) => scope = parent.as_ref(),
                None => return None,
            }
        }
    }

    /// Returns whether the name was found. Unfound names are for the caller
    /// to create as globals
    fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = self;
        loop {
            if let Some(slot) = scope.vars.borrow_mut().get_mut(name) {
                *slot = value;
                return true;
            }
            match &scope.parent {
                Some(parent) => scope = parent.as_ref(),
                None => return false,
            }
        }
    }

    fn declare(&self, name: Rc<str>, value: Value) {
        self.vars.borrow_mut().insert(name, value);
    }

    fn has_own(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }
}

enum Flow {
    Normal,
    Return(Value),
}

/// A script engine instance: the global scope plus the functions currently
/// running. Every method takes `&self`, state lives in cells, so the host
/// can hold script values and call back in while they are alive
pub struct Engine {
    globals: Rc<Scope>,
    /// innermost last
    frames: RefCell<Vec<Rc<Function>>>,
    out: RefCell<Box<dyn Write>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_output(Box::new(std::io::stdout()))
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Engine")
            .field("globals", &self.globals.vars.borrow().keys().collect::<Vec<_>>())
            .field("depth", &self.frames.borrow().len())
            .finish()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `print` (and so `console.log` in most scripts) writes here
    pub fn with_output(out: Box<dyn Write>) -> Self {
        let engine = Engine {
            globals: Scope::global(),
            frames: RefCell::new(vec![]),
            out: RefCell::new(out),
        };
        script_std::define_all(&engine);
        engine
    }

    /// Runs a whole script in the global scope. The result is the value of
    /// the last expression statement, undefined if there is none
    pub fn eval(&self, src: &str) -> Result<Value, ScriptError> {
        let tokens = lexer::lex(src)?;
        debug!("lexed {} tokens", tokens.len());
        let ast = parser::parse(tokens)?;
        debug!("parsed {} top level statements", ast.len());
        let mut completion = Value::Undefined;
        for statement in &ast {
            match statement {
                Statement::Expression(expr) => completion = self.eval_expr(expr, &self.globals)?,
                other => {
                    if let Flow::Return(_) = self.exec(other, &self.globals)? {
                        // top level return just stops the script
                        break;
                    }
                }
            }
        }
        Ok(completion)
    }

    /// Looks up a global binding
    pub fn get(&self, name: &str) -> Option<Value> {
        self.globals.vars.borrow().get(name).cloned()
    }

    /// Creates or overwrites a global binding
    pub fn set(&self, name: &str, value: Value) {
        self.globals.declare(name.into(), value);
    }

    /// Calls a global function by name, `this` is undefined
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        let func = self.get(name).ok_or_else(|| ScriptError::Unbound(name.to_string()))?;
        Ok(self.call_value(&func, &Value::Undefined, args, Span::new())?)
    }

    /// Calls `target.method(args)` with `this` bound to target. A target
    /// without that method is [ScriptError::NoSuchMethod], anything failing
    /// once the method runs is [ScriptError::Runtime]
    pub fn invoke_method(
        &self,
        target: &Value,
        method: &str,
        args: &[Value],
    ) -> Result<Value, ScriptError> {
        let no_such_method = || ScriptError::NoSuchMethod {
            target: target.type_name().to_string(),
            method: method.to_string(),
        };
        match target {
            Value::Object(object) => match object.get(method) {
                Some(func) if func.is_callable() => {
                    Ok(self.call_value(&func, target, args, Span::new())?)
                }
                _ => Err(no_such_method()),
            },
            Value::Host(host) => match host.call_method(method, args) {
                Ok(value) => Ok(value),
                Err(HostError::NoSuchMethod) => Err(no_such_method()),
                Err(HostError::Failed(msg)) => {
                    Err(self.error(RuntimeErrorKind::Host(msg), Span::new()).into())
                }
            },
            _ => Err(no_such_method()),
        }
    }

    /// used by the print builtin
    pub(crate) fn write_line(&self, line: &str) -> Result<(), RuntimeError> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{}", line).map_err(|e| RuntimeError::host(format!("could not print: {}", e)))
    }

    fn error(&self, kind: RuntimeErrorKind, span: Span) -> RuntimeError {
        let backtrace = self
            .frames
            .borrow()
            .iter()
            .rev()
            .map(|func| format!("{} ({})", func.name(), func.decl.span))
            .collect();
        RuntimeError { kind, span, backtrace }
    }

    fn exec_block(
        &self,
        statements: &[Statement],
        scope: &Rc<Scope>,
    ) -> Result<Flow, RuntimeError> {
        for statement in statements {
            if let Flow::Return(value) = self.exec(statement, scope)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&self, statement: &Statement, scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        match statement {
            Statement::Declaration(decl) => {
                match &decl.init {
                    Some(init) => {
                        let value = self.eval_expr(init, scope)?;
                        scope.declare(decl.name.name.clone(), value);
                    }
                    // `var x;` doesn't clobber an existing x
                    None if scope.has_own(&decl.name.name) => (),
                    None => scope.declare(decl.name.name.clone(), Value::Undefined),
                }
            }
            Statement::Function(decl) => {
                let func = Function { decl: Rc::clone(decl), closure: Rc::clone(scope) };
                if let Some(name) = &decl.name {
                    scope.declare(name.name.clone(), Value::Function(Rc::new(func)));
                }
            }
            Statement::Expression(expr) => {
                self.eval_expr(expr, scope)?;
            }
            Statement::If(branch) => {
                if self.eval_expr(&branch.condition, scope)?.is_truthy() {
                    return self.exec(&branch.statements, scope);
                } else if let Some(else_statements) = &branch.else_statements {
                    return self.exec(else_statements, scope);
                }
            }
            Statement::WhileLoop(looped) => {
                while self.eval_expr(&looped.condition, scope)?.is_truthy() {
                    if let Flow::Return(value) = self.exec(&looped.statements, scope)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Statement::Return(value, _) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope)?,
                    None => Value::Undefined,
                };
                return Ok(Flow::Return(value));
            }
            Statement::Block(statements) => return self.exec_block(statements, scope),
            Statement::Empty => (),
        }
        Ok(Flow::Normal)
    }

    fn eval_expr(&self, expr: &Expression, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        match expr {
            Expression::Literal(lit) => Ok(match &lit.data {
                LiteralData::String(s) => Value::Str(Rc::clone(s)),
                LiteralData::Number(n) => Value::Number(*n),
                LiteralData::Bool(b) => Value::Bool(*b),
                LiteralData::Null => Value::Null,
                LiteralData::Undefined => Value::Undefined,
            }),
            Expression::Identifier(id) => scope.lookup(&id.name).ok_or_else(|| {
                self.error(RuntimeErrorKind::Undefined(id.name.to_string()), id.span)
            }),
            Expression::This(_) => Ok(scope.this.clone()),
            Expression::Object(lit) => {
                let object = Object::new();
                for (key, value) in &lit.properties {
                    let value = self.eval_expr(value, scope)?;
                    object.set(Rc::clone(&key.name), value);
                }
                Ok(Value::Object(object))
            }
            Expression::Function(decl) => Ok(Value::Function(Rc::new(Function {
                decl: Rc::clone(decl),
                closure: Rc::clone(scope),
            }))),
            Expression::Member(member) => {
                let object = self.eval_expr(&member.object, scope)?;
                self.get_property(&object, &member.property, member.property.span)
            }
            Expression::Call(call) => match &call.callee {
                Expression::Member(member) => {
                    let object = self.eval_expr(&member.object, scope)?;
                    let args = self.eval_args(&call.arguments, scope)?;
                    self.call_method(&object, &member.property, &args, call.span)
                }
                callee => {
                    let func = self.eval_expr(callee, scope)?;
                    let args = self.eval_args(&call.arguments, scope)?;
                    self.call_value(&func, &Value::Undefined, &args, call.span)
                }
            },
            Expression::New(call) => {
                let constructor = self.eval_expr(&call.callee, scope)?;
                let args = self.eval_args(&call.arguments, scope)?;
                let this = Value::Object(Object::new());
                match self.call_value(&constructor, &this, &args, call.span)? {
                    object @ Value::Object(_) => Ok(object),
                    _ => Ok(this),
                }
            }
            Expression::Unary(unary) => {
                let operand = self.eval_expr(&unary.operand, scope)?;
                Ok(match unary.op {
                    UnaryOp::Not => Value::Bool(!operand.is_truthy()),
                    UnaryOp::Negate => Value::Number(-operand.to_number()),
                })
            }
            Expression::Binary(binary) => {
                let left = self.eval_expr(&binary.left, scope)?;
                // logical operators short circuit and give back an operand
                match binary.op {
                    BinaryOp::Or if left.is_truthy() => return Ok(left),
                    BinaryOp::And if !left.is_truthy() => return Ok(left),
                    BinaryOp::Or | BinaryOp::And => return self.eval_expr(&binary.right, scope),
                    _ => (),
                }
                let right = self.eval_expr(&binary.right, scope)?;
                Ok(binary_op(binary.op, &left, &right))
            }
            Expression::Assignment(assign) => self.eval_assignment(assign, scope),
        }
    }

    fn eval_args(
        &self,
        arguments: &[Expression],
        scope: &Rc<Scope>,
    ) -> Result<Vec<Value>, RuntimeError> {
        let mut args = Vec::with_capacity(arguments.len());
        for arg in arguments {
            args.push(self.eval_expr(arg, scope)?);
        }
        Ok(args)
    }

    fn eval_assignment(
        &self,
        assign: &Assignment,
        scope: &Rc<Scope>,
    ) -> Result<Value, RuntimeError> {
        match &assign.lvalue {
            Expression::Identifier(id) => {
                let value = match assign.op {
                    None => self.eval_expr(&assign.rvalue, scope)?,
                    Some(op) => {
                        let current = self.eval_expr(&assign.lvalue, scope)?;
                        let right = self.eval_expr(&assign.rvalue, scope)?;
                        binary_op(op, &current, &right)
                    }
                };
                // assigning an undeclared name makes a global
                if !scope.assign(&id.name, value.clone()) {
                    self.globals.declare(Rc::clone(&id.name), value.clone());
                }
                Ok(value)
            }
            Expression::Member(member) => {
                let target = self.eval_expr(&member.object, scope)?;
                let object = match &target {
                    Value::Object(object) => object.clone(),
                    other => {
                        let what =
                            format!("{} (setting '{}')", other.type_name(), member.property.name);
                        let kind = RuntimeErrorKind::NotAnObject(what);
                        return Err(self.error(kind, member.property.span));
                    }
                };
                let value = match assign.op {
                    None => self.eval_expr(&assign.rvalue, scope)?,
                    Some(op) => {
                        let current = object.get(&member.property.name).unwrap_or(Value::Undefined);
                        let right = self.eval_expr(&assign.rvalue, scope)?;
                        binary_op(op, &current, &right)
                    }
                };
                object.set(Rc::clone(&member.property.name), value.clone());
                Ok(value)
            }
            other => Err(self.error(
                RuntimeErrorKind::Host("invalid assignment target".to_string()),
                other.full_span(),
            )),
        }
    }

    fn get_property(
        &self,
        object: &Value,
        property: &NameSpan,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match object {
            Value::Object(object) => Ok(object.get(&property.name).unwrap_or(Value::Undefined)),
            Value::Undefined | Value::Null => Err(self.error(
                RuntimeErrorKind::NotAnObject(format!("{} (reading '{}')", object, property.name)),
                span,
            )),
            _ => Ok(Value::Undefined),
        }
    }

    fn call_method(
        &self,
        object: &Value,
        method: &NameSpan,
        args: &[Value],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if let Value::Host(host) = object {
            return host.call_method(&method.name, args).map_err(|e| match e {
                HostError::NoSuchMethod => self.error(
                    RuntimeErrorKind::NoSuchMethod {
                        target: host.type_name().to_string(),
                        method: method.name.to_string(),
                    },
                    span,
                ),
                HostError::Failed(msg) => self.error(RuntimeErrorKind::Host(msg), span),
            });
        }
        let func = self.get_property(object, method, span)?;
        if !func.is_callable() {
            return Err(self.error(
                RuntimeErrorKind::NotCallable(format!("{}.{}", object.type_name(), method.name)),
                span,
            ));
        }
        self.call_value(&func, object, args, span)
    }

    fn call_value(
        &self,
        callee: &Value,
        this: &Value,
        args: &[Value],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(func) => self.call_function(func, this, args, span),
            Value::Native(native) => (native.func)(self, this, args).map_err(|mut e| {
                // builtins don't know where they were called from
                if e.span == Span::new() {
                    e.span = span;
                }
                if e.backtrace.is_empty() {
                    e.backtrace = self.error(e.kind.clone(), span).backtrace;
                }
                e
            }),
            other => Err(self.error(RuntimeErrorKind::NotCallable(format!("{}", other)), span)),
        }
    }

    fn call_function(
        &self,
        func: &Rc<Function>,
        this: &Value,
        args: &[Value],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        if self.frames.borrow().len() >= MAX_CALL_DEPTH {
            return Err(self.error(RuntimeErrorKind::CallDepthExceeded(MAX_CALL_DEPTH), span));
        }
        let scope = Scope::child(&func.closure, this.clone());
        for (i, param) in func.decl.parameters.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or(Value::Undefined);
            scope.declare(Rc::clone(&param.name), arg);
        }
        self.frames.borrow_mut().push(Rc::clone(func));
        let result = self.exec_block(&func.decl.body, &scope);
        self.frames.borrow_mut().pop();
        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Undefined),
        }
    }
}

fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Value {
    use BinaryOp::*;
    match op {
        Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
            (Value::Str(_), _) | (_, Value::Str(_)) => {
                Value::Str(format!("{}{}", left, right).into())
            }
            _ => Value::Number(left.to_number() + right.to_number()),
        },
        Minus => Value::Number(left.to_number() - right.to_number()),
        Times => Value::Number(left.to_number() * right.to_number()),
        Divide => Value::Number(left.to_number() / right.to_number()),
        Mod => Value::Number(left.to_number() % right.to_number()),
        Equal => Value::Bool(left.loose_equals(right)),
        NotEqual => Value::Bool(!left.loose_equals(right)),
        StrictEqual => Value::Bool(left.strict_equals(right)),
        StrictNotEqual => Value::Bool(!left.strict_equals(right)),
        Less | LessEqual | Greater | GreaterEqual => {
            let ordering = match (left, right) {
                (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            // NaN compares false every way
            Value::Bool(match ordering {
                Some(ordering) => match op {
                    Less => ordering.is_lt(),
                    LessEqual => ordering.is_le(),
                    Greater => ordering.is_gt(),
                    _ => ordering.is_ge(),
                },
                None => false,
            })
        }
        // short circuited before we get here
        Or | And => Value::Bool(left.is_truthy() || right.is_truthy()),
    }
}
