//! the Abstract Syntax Tree ([AST]) is the result of parsing, and is what
//! the engine walks to run a script.
//!
//! the actual AST is the [AST] type, which is just a list of top level
//! statements. Just remember that these types refer to the **script**
//! language, not rust Ifs or Fns or Literals or anything.

use std::rc::Rc;

use crate::Span;

/// An Abstract Syntax Tree
pub type AST = Vec<Statement>;

#[derive(PartialEq, Clone, Debug)]
pub struct NameSpan {
    pub name: Rc<str>,
    pub span: Span,
}

#[derive(PartialEq, Clone, Debug)]
pub enum Statement {
    /// `var name = init`. var is scoped to the enclosing function
    Declaration(Declaration),
    /// `function name(params) { .. }` is sugar for a declaration
    Function(Rc<FunctionDecl>),
    Expression(Expression),
    If(If),
    WhileLoop(WhileLoop),
    Return(Option<Expression>, Span),
    Block(Vec<Statement>),
    Empty,
}

#[derive(PartialEq, Clone, Debug)]
pub struct Declaration {
    pub name: NameSpan,
    pub init: Option<Expression>,
}

/// Shared between every closure created from the same function expression
#[derive(PartialEq, Debug)]
pub struct FunctionDecl {
    pub name: Option<NameSpan>,
    pub parameters: Vec<NameSpan>,
    pub body: Vec<Statement>,
    pub span: Span,
}

#[derive(PartialEq, Clone, Debug)]
pub struct If {
    pub condition: Expression,
    pub statements: Box<Statement>,
    pub else_statements: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(PartialEq, Clone, Debug)]
pub struct WhileLoop {
    pub condition: Expression,
    pub statements: Box<Statement>,
    pub span: Span,
}

#[derive(PartialEq, Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(NameSpan),
    This(Span),
    Object(ObjectLit),
    Function(Rc<FunctionDecl>),
    Member(Box<Member>),
    // A call on a member (`a.b()`) binds `this` to `a`
    Call(Box<Call>),
    New(Box<Call>),
    Unary(Box<Unary>),
    Binary(Box<BinaryExpr>),
    Assignment(Box<Assignment>),
}

#[derive(PartialEq, Clone, Debug)]
pub struct Literal {
    pub data: LiteralData,
    pub span: Span,
}
#[derive(PartialEq, Clone, Debug)]
pub enum LiteralData {
    String(Rc<str>),
    Number(f64),
    Bool(bool),
    Null,
    Undefined,
}

#[derive(PartialEq, Clone, Debug)]
pub struct ObjectLit {
    pub properties: Vec<(NameSpan, Expression)>,
    pub span: Span,
}

#[derive(PartialEq, Clone, Debug)]
pub struct Member {
    pub object: Expression,
    pub property: NameSpan,
}

#[derive(PartialEq, Clone, Debug)]
pub struct Call {
    pub callee: Expression,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum UnaryOp {
    Not,
    Negate,
}
#[derive(PartialEq, Clone, Debug)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: Expression,
    pub span: Span,
}

#[derive(PartialEq, Clone, Debug)]
pub struct BinaryExpr {
    pub left: Expression,
    pub op: BinaryOp,
    pub right: Expression,
    pub span: Span,
}
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Or,
    And,
    Plus,
    Minus,
    Times,
    Divide,
    Mod,
}

/// Only identifiers and members are valid targets, the parser checks
#[derive(PartialEq, Clone, Debug)]
pub struct Assignment {
    pub lvalue: Expression,
    /// Some for compound assignment (`+=` is Some(Plus))
    pub op: Option<BinaryOp>,
    pub rvalue: Expression,
    pub span: Span,
}

impl Expression {
    pub fn full_span(&self) -> Span {
        match self {
            Self::Literal(lit) => lit.span,
            Self::Identifier(id) => id.span,
            Self::This(span) => *span,
            Self::Object(obj) => obj.span,
            Self::Function(decl) => decl.span,
            Self::Member(member) => member.object.full_span().to(member.property.span),
            Self::Call(call) | Self::New(call) => call.span,
            Self::Unary(unary) => unary.span.to(unary.operand.full_span()),
            Self::Binary(binary) => binary.left.full_span().to(binary.right.full_span()),
            Self::Assignment(assign) => assign.span,
        }
    }
}
