//! A list of Tokens is the result of lexing, just chunked script data
//! with no regard for syntax. You're probably looking for [Token], not
//! TokenType, since you want that sweet location (span) data

use crate::span::Span;

/// The kind of token (If, NumberLit, Comma, etc), and any additional data
/// associated (for example NumberLit: the value, as an f64)
#[derive(PartialEq, Clone, Debug)]
pub enum TokenType {
    Identifier(String),
    StringLit(String),
    NumberLit(f64),
    Var,
    Function,
    Return,
    If,
    Else,
    While,
    New,
    This,
    True,
    False,
    Null,
    Undefined,
    Comma,
    Dot,
    Colon,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Not,
    Or,
    And,
    Assignment,
    Plus,
    Minus,
    Times,
    Divide,
    Mod,
    OpAssign(Box<TokenType>),
}
impl TokenType {
    /// keywords are lexed like identifiers and then looked up here
    pub fn keyword(text: &str) -> Option<TokenType> {
        use TokenType::*;
        Some(match text {
            "var" => Var,
            "function" => Function,
            "return" => Return,
            "if" => If,
            "else" => Else,
            "while" => While,
            "new" => New,
            "this" => This,
            "true" => True,
            "false" => False,
            "null" => Null,
            "undefined" => Undefined,
            _ => return None,
        })
    }
}
impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use TokenType::*;
        let s = match self {
            Identifier(_) => "identifier",
            StringLit(_) => "string literal",
            NumberLit(_) => "number literal",
            Var => "var",
            Function => "function",
            Return => "return",
            If => "if",
            Else => "else",
            While => "while",
            New => "new",
            This => "this",
            True => "true",
            False => "false",
            Null => "null",
            Undefined => "undefined",
            Comma => ",",
            Dot => ".",
            Colon => ":",
            Semicolon => ";",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            Equal => "==",
            NotEqual => "!=",
            StrictEqual => "===",
            StrictNotEqual => "!==",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Not => "!",
            Or => "||",
            And => "&&",
            Assignment => "=",
            Plus => "+",
            Minus => "-",
            Times => "*",
            Divide => "/",
            Mod => "%",
            OpAssign(of) => match **of {
                Plus => "+=",
                Minus => "-=",
                Times => "*=",
                Divide => "/=",
                _ => "assignment",
            },
        };
        write!(f, "{}", s)
    }
}

/// All tokens have a location ([Token::span]) and a type ([Token::kind]),
/// but only some kinds of tokens have additional data (literal, name, etc)
/// so THAT is encoded in the TokenType enum
#[derive(PartialEq, Clone, Debug)]
pub struct Token {
    pub kind: TokenType,
    pub span: Span,
}
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} at {}", self.kind, self.span)
    }
}
