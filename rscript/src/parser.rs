// This is the parser. yay.
//
// Recursive descent over a reversed token list, so the next token is always
// `rtokens.last()` and consuming it is `rtokens.pop()`

use std::rc::Rc;

use crate::{ast::*, Span, Token, TokenType};

/// how deep expressions and statements may nest before parsing gives up,
/// running them recurses about as deep
pub const MAX_NESTING: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    // Expected, got
    Expected(Vec<TokenType>, Token),
    EOF(String),
    InvalidAssignTarget(Span),
    TooDeep(Span),
}
impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use ParseError::*;
        match self {
            Expected(expected, got) => {
                let expected_strings: Vec<String> =
                    expected.iter().map(|e| format!("{}", e)).collect();
                let expected_str = expected_strings.join(", ");
                write!(f, "[ERROR] expected {}, got {} at {}", expected_str, got.kind, got.span)
            }
            EOF(parsing) => write!(f, "[ERROR] unexpected EOF parsing {}", parsing),
            InvalidAssignTarget(span) => write!(f, "[ERROR] invalid assignment target at {}", span),
            TooDeep(span) => {
                write!(f, "[ERROR] nested more than {} levels deep at {}", MAX_NESTING, span)
            }
        }
    }
}
// All relevant details in Display and Debug
impl std::error::Error for ParseError {}
impl ParseError {
    fn v(self) -> Vec<Self> {
        vec![self]
    }
}

type Result<T> = std::result::Result<T, Vec<ParseError>>;

fn vec_to_res<T>(vec: Vec<Result<T>>) -> Result<Vec<T>> {
    let mut oks = vec![];
    let mut errs = vec![];
    for entry in vec {
        match entry {
            Ok(o) => oks.push(o),
            Err(mut e) => errs.append(&mut e),
        }
    }
    if !errs.is_empty() {
        Err(errs)
    } else {
        Ok(oks)
    }
}

fn pop_no_eof(from: &mut Tokens, parsing_what: &str) -> Result<Token> {
    match from.pop() {
        Some(token) => Ok(token),
        None => Err(ParseError::EOF(parsing_what.to_string()).v()),
    }
}

/// Only pops if the next token is expected, then returns that token (otherwise Err)
fn expect_token(rtokens: &mut Tokens, what: TokenType, during: &str) -> Result<Token> {
    match rtokens.last() {
        Some(token) if token.kind == what => Ok(pop_no_eof(rtokens, during)?),
        Some(token) => Err(ParseError::Expected(vec![what], token.clone()).v()),
        None => Err(ParseError::EOF(during.to_string()).v()),
    }
}

/// Pops the next token only if it is `what`
fn eat(rtokens: &mut Tokens, what: TokenType) -> Option<Token> {
    match rtokens.last() {
        Some(token) if token.kind == what => rtokens.pop(),
        _ => None,
    }
}

fn next_is(rtokens: &Tokens, what: TokenType) -> bool {
    rtokens.last().map_or(false, |t| t.kind == what)
}

/// One level deeper. Callers give the level back with `rtokens.depth -= n`
/// when they succeed, a failed statement resets the count
fn nest(rtokens: &mut Tokens) -> Result<()> {
    rtokens.depth += 1;
    if rtokens.depth > MAX_NESTING {
        let span = rtokens.last().map(|t| t.span).unwrap_or_default();
        return Err(ParseError::TooDeep(span).v());
    }
    Ok(())
}

fn parse_name(rtokens: &mut Tokens, during: &str) -> Result<NameSpan> {
    let token = pop_no_eof(rtokens, during)?;
    match token.kind {
        TokenType::Identifier(name) => Ok(NameSpan { name: name.into(), span: token.span }),
        _ => Err(ParseError::Expected(vec![TokenType::Identifier(String::new())], token).v()),
    }
}

/// after a dot or as an object literal key keywords are fine too (`obj.new`)
fn parse_property_name(rtokens: &mut Tokens, during: &str) -> Result<NameSpan> {
    let token = pop_no_eof(rtokens, during)?;
    let name: Rc<str> = match &token.kind {
        TokenType::Identifier(name) | TokenType::StringLit(name) => name.as_str().into(),
        TokenType::NumberLit(n) => crate::value::number_to_string(*n).into(),
        kind if TokenType::keyword(&kind.to_string()).as_ref() == Some(kind) => {
            kind.to_string().into()
        }
        _ => {
            return Err(ParseError::Expected(
                vec![TokenType::Identifier(String::new()), TokenType::StringLit(String::new())],
                token.clone(),
            )
            .v())
        }
    };
    Ok(NameSpan { name, span: token.span })
}

fn token_to_binary_op(kind: &TokenType) -> Option<(u8, BinaryOp)> {
    use TokenType::*;
    Some(match kind {
        Or => (1, BinaryOp::Or),
        And => (2, BinaryOp::And),
        Equal => (3, BinaryOp::Equal),
        NotEqual => (3, BinaryOp::NotEqual),
        StrictEqual => (3, BinaryOp::StrictEqual),
        StrictNotEqual => (3, BinaryOp::StrictNotEqual),
        Less => (4, BinaryOp::Less),
        LessEqual => (4, BinaryOp::LessEqual),
        Greater => (4, BinaryOp::Greater),
        GreaterEqual => (4, BinaryOp::GreaterEqual),
        Plus => (5, BinaryOp::Plus),
        Minus => (5, BinaryOp::Minus),
        Times => (6, BinaryOp::Times),
        Divide => (6, BinaryOp::Divide),
        Mod => (6, BinaryOp::Mod),
        _ => return None,
    })
}

fn parse_arguments(rtokens: &mut Tokens) -> Result<(Vec<Expression>, Span)> {
    expect_token(rtokens, TokenType::LParen, "arguments")?;
    let mut arguments = vec![];
    loop {
        if let Some(close) = eat(rtokens, TokenType::RParen) {
            return Ok((arguments, close.span));
        }
        if !arguments.is_empty() {
            expect_token(rtokens, TokenType::Comma, "arguments")?;
        }
        arguments.push(parse_expression(rtokens)?);
    }
}

fn parse_parameters(rtokens: &mut Tokens) -> Result<Vec<NameSpan>> {
    expect_token(rtokens, TokenType::LParen, "function parameters")?;
    let mut parameters = vec![];
    loop {
        if eat(rtokens, TokenType::RParen).is_some() {
            return Ok(parameters);
        }
        if !parameters.is_empty() {
            expect_token(rtokens, TokenType::Comma, "function parameters")?;
        }
        parameters.push(parse_name(rtokens, "function parameters")?);
    }
}

/// `{ statements }`, returns the span of the closing brace too
fn parse_block(rtokens: &mut Tokens, during: &str) -> Result<(Vec<Statement>, Span)> {
    expect_token(rtokens, TokenType::LBrace, during)?;
    let mut statements = vec![];
    loop {
        if let Some(close) = eat(rtokens, TokenType::RBrace) {
            return Ok((statements, close.span));
        }
        if rtokens.last().is_none() {
            return Err(ParseError::EOF(during.to_string()).v());
        }
        statements.push(parse_statement(rtokens)?);
    }
}

fn parse_function(rtokens: &mut Tokens) -> Result<Rc<FunctionDecl>> {
    let start = expect_token(rtokens, TokenType::Function, "function")?.span;
    let name = match rtokens.last() {
        Some(Token { kind: TokenType::Identifier(_), .. }) => {
            Some(parse_name(rtokens, "function")?)
        }
        _ => None,
    };
    let parameters = parse_parameters(rtokens)?;
    let (body, end) = parse_block(rtokens, "function body")?;
    Ok(Rc::new(FunctionDecl { name, parameters, body, span: start.to(end) }))
}

fn parse_object(rtokens: &mut Tokens) -> Result<ObjectLit> {
    let start = expect_token(rtokens, TokenType::LBrace, "object literal")?.span;
    let mut properties = vec![];
    loop {
        if let Some(close) = eat(rtokens, TokenType::RBrace) {
            return Ok(ObjectLit { properties, span: start.to(close.span) });
        }
        if !properties.is_empty() {
            expect_token(rtokens, TokenType::Comma, "object literal")?;
            // trailing commas are fine
            if let Some(close) = eat(rtokens, TokenType::RBrace) {
                return Ok(ObjectLit { properties, span: start.to(close.span) });
            }
        }
        let key = parse_property_name(rtokens, "object literal")?;
        expect_token(rtokens, TokenType::Colon, "object literal")?;
        let value = parse_expression(rtokens)?;
        properties.push((key, value));
    }
}

/// `new Callee(args)`, the arguments are optional
fn parse_new(rtokens: &mut Tokens) -> Result<Expression> {
    let start = expect_token(rtokens, TokenType::New, "new")?.span;
    nest(rtokens)?;
    let mut callee = parse_primary(rtokens)?;
    rtokens.depth -= 1;
    while eat(rtokens, TokenType::Dot).is_some() {
        let property = parse_property_name(rtokens, "member access")?;
        callee = Expression::Member(Box::new(Member { object: callee, property }));
    }
    let (arguments, end) = if next_is(rtokens, TokenType::LParen) {
        parse_arguments(rtokens)?
    } else {
        (vec![], callee.full_span())
    };
    Ok(Expression::New(Box::new(Call { callee, arguments, span: start.to(end) })))
}

fn literal(data: LiteralData, span: Span) -> Expression {
    Expression::Literal(Literal { data, span })
}

fn parse_primary(rtokens: &mut Tokens) -> Result<Expression> {
    use TokenType::*;
    let token = match rtokens.last() {
        Some(token) => token,
        None => return Err(ParseError::EOF("expression".to_string()).v()),
    };
    let span = token.span;
    let expr = match &token.kind {
        LBrace => return Ok(Expression::Object(parse_object(rtokens)?)),
        Function => return Ok(Expression::Function(parse_function(rtokens)?)),
        New => return parse_new(rtokens),
        Identifier(_) => return Ok(Expression::Identifier(parse_name(rtokens, "identifier")?)),
        LParen => {
            rtokens.pop();
            let inner = parse_expression(rtokens)?;
            expect_token(rtokens, RParen, "parenthesized expression")?;
            return Ok(inner);
        }
        NumberLit(n) => literal(LiteralData::Number(*n), span),
        StringLit(s) => literal(LiteralData::String(s.as_str().into()), span),
        True => literal(LiteralData::Bool(true), span),
        False => literal(LiteralData::Bool(false), span),
        Null => literal(LiteralData::Null, span),
        Undefined => literal(LiteralData::Undefined, span),
        This => Expression::This(span),
        _ => {
            return Err(ParseError::Expected(
                vec![
                    Identifier(String::new()),
                    NumberLit(0.0),
                    StringLit(String::new()),
                    LParen,
                    LBrace,
                    Function,
                ],
                token.clone(),
            )
            .v())
        }
    };
    // the single token arms above only peeked
    rtokens.pop();
    Ok(expr)
}

fn parse_postfix(rtokens: &mut Tokens) -> Result<Expression> {
    let mut expr = parse_primary(rtokens)?;
    // every link of a chain wraps the one before
    let mut links = 0;
    loop {
        if eat(rtokens, TokenType::Dot).is_some() {
            nest(rtokens)?;
            links += 1;
            let property = parse_property_name(rtokens, "member access")?;
            expr = Expression::Member(Box::new(Member { object: expr, property }));
        } else if next_is(rtokens, TokenType::LParen) {
            nest(rtokens)?;
            links += 1;
            let (arguments, end) = parse_arguments(rtokens)?;
            let span = expr.full_span().to(end);
            expr = Expression::Call(Box::new(Call { callee: expr, arguments, span }));
        } else {
            rtokens.depth -= links;
            return Ok(expr);
        }
    }
}

fn parse_unary(rtokens: &mut Tokens) -> Result<Expression> {
    let op = match rtokens.last().map(|t| &t.kind) {
        Some(TokenType::Not) => UnaryOp::Not,
        Some(TokenType::Minus) => UnaryOp::Negate,
        _ => return parse_postfix(rtokens),
    };
    let span = pop_no_eof(rtokens, "unary expression")?.span;
    nest(rtokens)?;
    let operand = parse_unary(rtokens)?;
    rtokens.depth -= 1;
    Ok(Expression::Unary(Box::new(Unary { op, operand, span })))
}

/// precedence climbing, every level binds tighter than `min_precedence - 1`
fn parse_binary(rtokens: &mut Tokens, min_precedence: u8) -> Result<Expression> {
    let mut left = parse_unary(rtokens)?;
    let mut links = 0;
    loop {
        let (precedence, op) = match rtokens.last().and_then(|t| token_to_binary_op(&t.kind)) {
            Some((precedence, op)) if precedence >= min_precedence => (precedence, op),
            _ => {
                rtokens.depth -= links;
                return Ok(left);
            }
        };
        let span = pop_no_eof(rtokens, "binary expression")?.span;
        nest(rtokens)?;
        links += 1;
        let right = parse_binary(rtokens, precedence + 1)?;
        left = Expression::Binary(Box::new(BinaryExpr { left, op, right, span }));
    }
}

fn parse_expression(rtokens: &mut Tokens) -> Result<Expression> {
    nest(rtokens)?;
    let expr = parse_assignment(rtokens)?;
    rtokens.depth -= 1;
    Ok(expr)
}

fn parse_assignment(rtokens: &mut Tokens) -> Result<Expression> {
    let lvalue = parse_binary(rtokens, 1)?;
    let op = match rtokens.last().map(|t| &t.kind) {
        Some(TokenType::Assignment) => None,
        Some(TokenType::OpAssign(op)) => token_to_binary_op(op).map(|(_, op)| op),
        _ => return Ok(lvalue),
    };
    let token = pop_no_eof(rtokens, "assignment")?;
    match lvalue {
        Expression::Identifier(_) | Expression::Member(_) => (),
        _ => return Err(ParseError::InvalidAssignTarget(lvalue.full_span().to(token.span)).v()),
    }
    // assignment is right associative: a = b = c
    let rvalue = parse_expression(rtokens)?;
    let span = lvalue.full_span().to(rvalue.full_span());
    Ok(Expression::Assignment(Box::new(Assignment { lvalue, op, rvalue, span })))
}

/// semicolons are optional, but eaten if they're there
fn end_statement(rtokens: &mut Tokens) {
    eat(rtokens, TokenType::Semicolon);
}

fn parse_declaration(rtokens: &mut Tokens) -> Result<Declaration> {
    expect_token(rtokens, TokenType::Var, "declaration")?;
    let name = parse_name(rtokens, "declaration")?;
    let init = match eat(rtokens, TokenType::Assignment) {
        Some(_) => Some(parse_expression(rtokens)?),
        None => None,
    };
    end_statement(rtokens);
    Ok(Declaration { name, init })
}

fn parse_if(rtokens: &mut Tokens) -> Result<If> {
    let span = expect_token(rtokens, TokenType::If, "if statement")?.span;
    expect_token(rtokens, TokenType::LParen, "if statement")?;
    let condition = parse_expression(rtokens)?;
    expect_token(rtokens, TokenType::RParen, "if statement")?;
    let statements = Box::new(parse_statement(rtokens)?);
    let else_statements = match eat(rtokens, TokenType::Else) {
        Some(_) => Some(Box::new(parse_statement(rtokens)?)),
        None => None,
    };
    Ok(If { condition, statements, else_statements, span })
}

fn parse_loop(rtokens: &mut Tokens) -> Result<WhileLoop> {
    let span = expect_token(rtokens, TokenType::While, "while statement")?.span;
    expect_token(rtokens, TokenType::LParen, "while statement")?;
    let condition = parse_expression(rtokens)?;
    expect_token(rtokens, TokenType::RParen, "while statement")?;
    let statements = Box::new(parse_statement(rtokens)?);
    Ok(WhileLoop { condition, statements, span })
}

fn parse_return(rtokens: &mut Tokens) -> Result<Statement> {
    let span = expect_token(rtokens, TokenType::Return, "return statement")?.span;
    let value = match rtokens.last().map(|t| &t.kind) {
        None | Some(TokenType::Semicolon) | Some(TokenType::RBrace) => None,
        Some(_) => Some(parse_expression(rtokens)?),
    };
    end_statement(rtokens);
    Ok(Statement::Return(value, span))
}

fn parse_statement(rtokens: &mut Tokens) -> Result<Statement> {
    nest(rtokens)?;
    let statement = parse_statement_kind(rtokens)?;
    rtokens.depth -= 1;
    Ok(statement)
}

fn parse_statement_kind(rtokens: &mut Tokens) -> Result<Statement> {
    use TokenType::*;
    let kind = match rtokens.last() {
        Some(token) => &token.kind,
        None => return Err(ParseError::EOF("statement".to_string()).v()),
    };
    Ok(match kind {
        Var => Statement::Declaration(parse_declaration(rtokens)?),
        If => Statement::If(parse_if(rtokens)?),
        While => Statement::WhileLoop(parse_loop(rtokens)?),
        Return => parse_return(rtokens)?,
        LBrace => Statement::Block(parse_block(rtokens, "block")?.0),
        Semicolon => {
            rtokens.pop();
            Statement::Empty
        }
        // only a named function in statement position is a declaration,
        // LR(2) tells them apart from function expressions
        Function if matches!(rtokens.n(2).map(|t| &t.kind), Some(Identifier(_))) => {
            let decl = parse_function(rtokens)?;
            end_statement(rtokens);
            Statement::Function(decl)
        }
        _ => {
            let expr = parse_expression(rtokens)?;
            end_statement(rtokens);
            Statement::Expression(expr)
        }
    })
}

/// on error we want to skip to the next statement because we know this isn't valid
fn skip_statement(rtokens: &mut Tokens) {
    while let Some(token) = rtokens.pop() {
        match token.kind {
            TokenType::Semicolon | TokenType::RBrace => break,
            _ => (),
        }
    }
}

/// Parses a whole script. Every top level statement that fails is reported,
/// not just the first one
pub fn parse(mut tokens: Vec<Token>) -> Result<AST> {
    tokens.reverse();
    let mut rtokens = NoPop::new(&tokens);
    let mut ast_res = vec![];
    while rtokens.last().is_some() {
        rtokens.depth = 0;
        let statement = parse_statement(&mut rtokens);
        if statement.is_err() {
            skip_statement(&mut rtokens);
        }
        ast_res.push(statement);
    }
    vec_to_res(ast_res)
}

#[derive(Clone, Copy)]
struct NoPop<'a, T: Clone> {
    vec: &'a [T],
    sp: usize,
    /// how deep the parse currently is
    depth: usize,
}
impl<'a, T: Clone> NoPop<'a, T> {
    fn new(vec: &'a [T]) -> Self {
        Self { vec, sp: vec.len(), depth: 0 }
    }
    fn pop(&mut self) -> Option<T> {
        if self.sp > 0 {
            self.sp -= 1;
            Some(self.vec[self.sp].clone())
        } else {
            None
        }
    }
    fn last(&self) -> Option<&'a T> {
        self.n(1)
    }
    fn n(&self, n: usize) -> Option<&'a T> {
        if self.sp >= n {
            self.vec.get(self.sp - n)
        } else {
            None
        }
    }
}
type Tokens<'a> = NoPop<'a, Token>;
